use crate::error::{ConsoleError, Result};
use crate::idle_simulator::IdleSimulator;
use crate::log_store::EventLogStore;
use crate::status_simulator::StatusSimulator;
use crate::types::{Kind, Mode};
use crate::viewer::LogViewer;
use crate::widgets::WidgetEvent;
use log::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Widget(WidgetEvent),
    Log { kind: Kind, message: String },
    ToggleMode,
    SetMode(Mode),
    Peek,
    Dump,
    Status,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  add <label>              add a chip to the workflow
  remove <label>           remove a chip from the workflow
  clear                    clear the workflow
  slide <id> <0-100>       move a mixer slider
  flip <id> [after|before] flip a card
  open | close             open or close the demo modal
  step <n> <text>          advance the demo
  log <kind> <message>     append a raw entry (info, success, action)
  mode | calm | chaos      toggle or set the mode
  peek                     show the visible console window
  dump                     print the retained log as JSON
  status                   show the status indicators
  quit";

fn missing(what: &str) -> ConsoleError {
    ConsoleError::InvalidArgument(format!("missing {}", what))
}

fn split_first(rest: &str) -> (&str, &str) {
    match rest.split_once(char::is_whitespace) {
        Some((first, tail)) => (first, tail.trim()),
        None => (rest, ""),
    }
}

pub fn parse_command(line: &str) -> Result<Command> {
    let (name, rest) = split_first(line.trim());
    
    let command = match name.to_lowercase().as_str() {
        "add" if !rest.is_empty() => Command::Widget(WidgetEvent::ChipAdded {
            label: rest.to_string(),
        }),
        "add" => return Err(missing("chip label")),
        
        "remove" if !rest.is_empty() => Command::Widget(WidgetEvent::ChipRemoved {
            label: rest.to_string(),
        }),
        "remove" => return Err(missing("chip label")),
        
        "clear" => Command::Widget(WidgetEvent::WorkflowCleared),
        
        "slide" => {
            let (id, value) = split_first(rest);
            if id.is_empty() || value.is_empty() {
                return Err(missing("slider id and value"));
            }
            let value: u8 = value.parse().map_err(|_| {
                ConsoleError::InvalidArgument(format!("invalid slider value: {}", value))
            })?;
            Command::Widget(WidgetEvent::SliderAdjusted {
                id: id.to_string(),
                value,
            })
        }
        
        "flip" => {
            let (id, side) = split_first(rest);
            if id.is_empty() {
                return Err(missing("card id"));
            }
            let after = match side {
                "" | "after" => true,
                "before" => false,
                other => {
                    return Err(ConsoleError::InvalidArgument(format!(
                        "card side must be after or before, got {}",
                        other
                    )))
                }
            };
            Command::Widget(WidgetEvent::CardFlipped {
                id: id.to_string(),
                after,
            })
        }
        
        "open" => Command::Widget(WidgetEvent::ModalOpened),
        "close" => Command::Widget(WidgetEvent::ModalClosed),
        
        "step" => {
            let (step, text) = split_first(rest);
            let step: u32 = step
                .parse()
                .map_err(|_| ConsoleError::InvalidArgument(format!("invalid step: {}", step)))?;
            if text.is_empty() {
                return Err(missing("step text"));
            }
            Command::Widget(WidgetEvent::DemoStep {
                step,
                text: text.to_string(),
            })
        }
        
        "log" => {
            let (kind, message) = split_first(rest);
            Command::Log {
                kind: kind.parse()?,
                message: message.to_string(),
            }
        }
        
        "mode" => Command::ToggleMode,
        "calm" => Command::SetMode(Mode::Calm),
        "chaos" => Command::SetMode(Mode::Chaos),
        "peek" => Command::Peek,
        "dump" => Command::Dump,
        "status" => Command::Status,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        
        _ => {
            return Err(ConsoleError::InvalidArgument(format!(
                "unknown command: {}",
                name
            )))
        }
    };
    
    Ok(command)
}

/// Owns the store and both simulators for one interactive run.
pub struct Session {
    store: EventLogStore,
    viewer: LogViewer,
    idle: IdleSimulator,
    status: StatusSimulator,
    mode: Mode,
}

impl Session {
    pub fn new(
        store: EventLogStore,
        viewer: LogViewer,
        idle: IdleSimulator,
        status: StatusSimulator,
        mode: Mode,
    ) -> Self {
        Self {
            store,
            viewer,
            idle,
            status,
            mode,
        }
    }

    pub fn start(&mut self) -> Result<()> {
        self.idle.start(self.mode)?;
        self.status.start(self.mode)?;
        Ok(())
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn store(&self) -> &EventLogStore {
        &self.store
    }

    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        if mode == self.mode {
            return Ok(());
        }
        self.idle.set_mode(mode)?;
        if let Err(e) = self.status.set_mode(mode) {
            // Keep both simulators on the same mode
            if let Err(rollback) = self.idle.set_mode(self.mode) {
                warn!("Failed to restore idle simulator mode: {}", rollback);
            }
            return Err(e);
        }
        
        info!("Switching mode: {} -> {}", self.mode, mode);
        self.mode = mode;
        Ok(())
    }

    /// Cancels both simulator timers.
    pub fn shutdown(&mut self) {
        self.idle.stop();
        self.status.stop();
        info!(
            "Session stopped: {} entries retained, {} status transitions, {} idle fillers",
            self.store.len(),
            self.status.transitions(),
            self.idle.emitted()
        );
    }

    /// Executes one command and returns lines to print.
    pub fn execute(&mut self, command: Command) -> Result<Vec<String>> {
        match command {
            Command::Widget(event) => {
                event.record(&self.store)?;
                Ok(Vec::new())
            }
            Command::Log { kind, message } => {
                self.store.append(message, kind)?;
                Ok(Vec::new())
            }
            Command::ToggleMode => {
                self.set_mode(self.mode.toggled())?;
                Ok(vec![format!("mode: {}", self.mode)])
            }
            Command::SetMode(mode) => {
                self.set_mode(mode)?;
                Ok(vec![format!("mode: {}", self.mode)])
            }
            Command::Peek => self.viewer.render(&self.store),
            Command::Dump => Ok(vec![serde_json::to_string_pretty(&self.store.snapshot(None))?]),
            Command::Status => Ok(self
                .status
                .items()
                .iter()
                .map(|item| format!("{:<14} {}", item.label, item.status))
                .collect()),
            Command::Help => Ok(HELP.lines().map(|l| l.to_string()).collect()),
            Command::Quit => Ok(Vec::new()),
        }
    }
}
