use crate::error::{ConsoleError, Result};
use crate::idle_simulator::{self, IdleSettings, Suppression};
use crate::log_store::DEFAULT_RETENTION;
use crate::status_simulator;
use crate::types::{default_status_items, Mode, ModeIntervals, StatusItem};
use crate::viewer::DEFAULT_VIEW_LIMIT;
use anyhow::Context;
use clap::Parser;
use log::LevelFilter;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "agency-console", version, about)]
pub struct Cli {
    /// Path to configuration file (built-in defaults when omitted)
    #[arg(long)]
    pub config: Option<PathBuf>,
    
    /// Override starting mode (calm or chaos)
    #[arg(long)]
    pub mode: Option<Mode>,
    
    /// Override how many entries the log keeps
    #[arg(long)]
    pub retention: Option<usize>,
    
    /// Override how many entries the viewer shows
    #[arg(long)]
    pub view_limit: Option<usize>,
    
    /// Seed the random sources for a reproducible run
    #[arg(long)]
    pub seed: Option<u64>,
    
    /// Exit after this many seconds
    #[arg(long)]
    pub duration: Option<u64>,
    
    /// Print entries as JSON lines
    #[arg(long)]
    pub json: bool,
    
    #[arg(long, default_value = "info")]
    pub log_level: LevelFilter,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdleConfig {
    pub calm_interval_ms: u64,
    pub chaos_interval_ms: u64,
    pub idle_window_ms: u64,
    pub suppression: Suppression,
    pub messages: Vec<String>,
}

impl Default for IdleConfig {
    fn default() -> Self {
        Self {
            calm_interval_ms: idle_simulator::DEFAULT_CALM_INTERVAL_MS,
            chaos_interval_ms: idle_simulator::DEFAULT_CHAOS_INTERVAL_MS,
            idle_window_ms: idle_simulator::DEFAULT_IDLE_WINDOW_MS,
            suppression: Suppression::default(),
            messages: idle_simulator::DEFAULT_IDLE_MESSAGES
                .iter()
                .map(|m| m.to_string())
                .collect(),
        }
    }
}

impl IdleConfig {
    pub fn settings(&self) -> IdleSettings {
        IdleSettings {
            intervals: ModeIntervals::from_millis(self.calm_interval_ms, self.chaos_interval_ms),
            idle_window: Duration::from_millis(self.idle_window_ms),
            suppression: self.suppression,
            messages: self.messages.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    pub calm_interval_ms: u64,
    pub chaos_interval_ms: u64,
    pub items: Vec<StatusItem>,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            calm_interval_ms: status_simulator::DEFAULT_CALM_INTERVAL_MS,
            chaos_interval_ms: status_simulator::DEFAULT_CHAOS_INTERVAL_MS,
            items: default_status_items(),
        }
    }
}

impl StatusConfig {
    pub fn intervals(&self) -> ModeIntervals {
        ModeIntervals::from_millis(self.calm_interval_ms, self.chaos_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub retention: usize,
    pub view_limit: usize,
    pub mode: Mode,
    pub seed: Option<u64>,
    pub json: bool,
    pub idle: IdleConfig,
    pub status: StatusConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            retention: DEFAULT_RETENTION,
            view_limit: DEFAULT_VIEW_LIMIT,
            mode: Mode::default(),
            seed: None,
            json: false,
            idle: IdleConfig::default(),
            status: StatusConfig::default(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        if self.retention == 0 {
            return Err(ConsoleError::Config("retention must be at least 1".to_string()));
        }
        if self.view_limit == 0 {
            return Err(ConsoleError::Config("view_limit must be at least 1".to_string()));
        }
        
        let intervals = [
            ("idle.calm_interval_ms", self.idle.calm_interval_ms),
            ("idle.chaos_interval_ms", self.idle.chaos_interval_ms),
            ("status.calm_interval_ms", self.status.calm_interval_ms),
            ("status.chaos_interval_ms", self.status.chaos_interval_ms),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(ConsoleError::Config(format!("{} must be non-zero", name)));
            }
        }
        
        if self.idle.messages.iter().all(|m| m.trim().is_empty()) {
            return Err(ConsoleError::Config("idle.messages must not be empty".to_string()));
        }
        if self.status.items.is_empty() {
            return Err(ConsoleError::Config("status.items must not be empty".to_string()));
        }
        
        Ok(())
    }
}

/// Parses a config file body. Validation runs after CLI overrides, in
/// [`load_config`].
pub fn parse_config(text: &str) -> Result<Config> {
    Ok(toml::from_str::<Config>(text)?)
}

pub fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match cli.config {
        Some(ref path) => {
            let config_content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            parse_config(&config_content).context("Failed to parse config file")?
        }
        None => Config::default(),
    };
    
    // Apply CLI overrides
    if let Some(mode) = cli.mode {
        config.mode = mode;
    }
    
    if let Some(retention) = cli.retention {
        config.retention = retention;
    }
    
    if let Some(view_limit) = cli.view_limit {
        config.view_limit = view_limit;
    }
    
    if cli.seed.is_some() {
        config.seed = cli.seed;
    }
    
    if cli.json {
        config.json = true;
    }
    
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Status;

    #[test]
    fn empty_file_uses_defaults() {
        let config = parse_config("").unwrap();
        config.validate().unwrap();
        assert_eq!(config.retention, 200);
        assert_eq!(config.view_limit, 6);
        assert_eq!(config.mode, Mode::Calm);
        assert_eq!(config.idle.messages.len(), 6);
        assert_eq!(config.status.items.len(), 4);
        assert_eq!(config.idle.settings().intervals.for_mode(Mode::Chaos), Duration::from_millis(2000));
        assert_eq!(config.status.intervals().for_mode(Mode::Calm), Duration::from_millis(3000));
    }

    #[test]
    fn parses_full_file() {
        let text = r#"
retention = 50
mode = "chaos"

[idle]
chaos_interval_ms = 500
suppression = "sticky"
messages = ["Quiet"]

[status]
items = [{ id = "db", label = "Database", status = "busy" }]
"#;
        let config = parse_config(text).unwrap();
        assert_eq!(config.retention, 50);
        assert_eq!(config.mode, Mode::Chaos);
        assert_eq!(config.idle.suppression, Suppression::Sticky);
        assert_eq!(config.idle.chaos_interval_ms, 500);
        assert_eq!(config.idle.calm_interval_ms, 4000);
        assert_eq!(config.status.items[0].status, Status::Busy);
    }

    #[test]
    fn rejects_zero_bounds() {
        for text in ["retention = 0", "[status]\nchaos_interval_ms = 0", "[idle]\nmessages = []"] {
            let config = parse_config(text).unwrap();
            assert!(matches!(config.validate(), Err(ConsoleError::Config(_))));
        }
        assert!(matches!(parse_config("retention = \"lots\""), Err(ConsoleError::Toml(_))));
    }

    #[test]
    fn load_config_reads_file_then_applies_overrides() {
        let path = std::env::temp_dir().join(format!("agency-console-{}.toml", std::process::id()));
        fs::write(&path, "retention = 0\nview_limit = 4\n").unwrap();

        let bad = Cli::parse_from(["agency-console", "--config", path.to_str().unwrap()]);
        assert!(load_config(&bad).is_err());

        let fixed = Cli::parse_from([
            "agency-console",
            "--config",
            path.to_str().unwrap(),
            "--retention",
            "25",
        ]);
        let config = load_config(&fixed).unwrap();
        fs::remove_file(&path).unwrap();

        assert_eq!(config.retention, 25);
        assert_eq!(config.view_limit, 4);
    }

    #[test]
    fn cli_overrides_defaults() {
        let cli = Cli::parse_from([
            "agency-console",
            "--mode",
            "chaos",
            "--retention",
            "20",
            "--seed",
            "7",
        ]);
        let config = load_config(&cli).unwrap();
        assert_eq!(config.mode, Mode::Chaos);
        assert_eq!(config.retention, 20);
        assert_eq!(config.seed, Some(7));
        assert_eq!(cli.log_level, LevelFilter::Info);
    }
}
