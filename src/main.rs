use agency_console::commands::{self, Command, Session};
use agency_console::config;
use agency_console::random;
use agency_console::viewer::LogViewer;
use agency_console::{EventLogStore, IdleSimulator, StatusSimulator};
use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use simple_logger::SimpleLogger;
use std::io::BufRead;
use tokio::sync::mpsc;
use tokio::time::{sleep, Duration};

/// Reads stdin on a plain thread. A blocking read inside the runtime would
/// hold up shutdown until the next newline.
fn spawn_input_reader() -> mpsc::UnboundedReceiver<std::io::Result<String>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let failed = line.is_err();
            if tx.send(line).is_err() || failed {
                break;
            }
        }
    });
    rx
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let cli = config::Cli::parse();
    
    SimpleLogger::new()
        .with_level(cli.log_level)
        .env()
        .init()
        .context("Failed to initialize logger")?;
    
    info!("Starting agency-console");
    
    // Load configuration
    let config = config::load_config(&cli)?;
    info!("Configuration loaded successfully");
    
    let store = EventLogStore::new(config.retention);
    let viewer = LogViewer::new(config.view_limit, config.json);
    
    // Viewer prints every new entry as it arrives
    let (subscription, rx) = viewer.attach(&store);
    let viewer_handle = {
        let viewer = viewer.clone();
        tokio::spawn(async move { viewer.run(rx, tokio::io::stdout()).await })
    };
    
    // Separate streams so idle picks do not shift status picks
    let idle = IdleSimulator::new(
        store.clone(),
        config.idle.settings(),
        random::from_seed(config.seed),
    )?;
    let status = StatusSimulator::new(
        store.clone(),
        config.status.items.clone(),
        config.status.intervals(),
        random::from_seed(config.seed.map(|s| s.wrapping_add(1))),
    )?;
    
    let mut session = Session::new(store.clone(), viewer, idle, status, config.mode);
    session.start().context("Failed to start simulators")?;
    info!("Simulators running in {} mode; type 'help' for commands", session.mode());
    
    let deadline = async {
        match cli.duration {
            Some(secs) => sleep(Duration::from_secs(secs)).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);
    
    let mut input = spawn_input_reader();
    
    loop {
        tokio::select! {
            line = input.recv() => {
                let line = match line {
                    Some(Ok(line)) => line,
                    None => {
                        info!("Input closed");
                        break;
                    }
                    Some(Err(e)) => {
                        error!("Failed to read input: {}", e);
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                
                let command = match commands::parse_command(&line) {
                    Ok(command) => command,
                    Err(e) => {
                        warn!("{}", e);
                        continue;
                    }
                };
                if command == Command::Quit {
                    break;
                }
                
                match session.execute(command) {
                    Ok(output) => {
                        for line in output {
                            println!("{}", line);
                        }
                    }
                    Err(e) => warn!("Command failed: {}", e),
                }
            }
            _ = &mut deadline => {
                info!("Duration elapsed");
                break;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }
    
    session.shutdown();
    
    // Closing the subscription ends the viewer once it has drained
    subscription.unsubscribe();
    drop(session);
    drop(store);
    match viewer_handle.await {
        Ok(Err(e)) => error!("Viewer failed: {}", e),
        Err(e) => error!("Viewer task terminated unexpectedly: {}", e),
        Ok(Ok(())) => {}
    }
    
    Ok(())
}
