//! Events raised by the interactive widgets around the console.

use crate::error::{ConsoleError, Result};
use crate::log_store::EventLogStore;
use crate::types::{Kind, LogEntry};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetEvent {
    /// Mixer slider moved, value in percent
    SliderAdjusted { id: String, value: u8 },
    ChipAdded { label: String },
    ChipRemoved { label: String },
    WorkflowCleared,
    CardFlipped { id: String, after: bool },
    ModalOpened,
    ModalClosed,
    DemoStep { step: u32, text: String },
}

impl WidgetEvent {
    pub fn message(&self) -> String {
        match self {
            WidgetEvent::SliderAdjusted { id, value } => format!("Adjusting {} → {}%", id, value),
            WidgetEvent::ChipAdded { label } => format!("Added {} to workflow", label),
            WidgetEvent::ChipRemoved { label } => format!("Removed {} from workflow", label),
            WidgetEvent::WorkflowCleared => "Workflow cleared".to_string(),
            WidgetEvent::CardFlipped { id, after } => {
                format!("Flipped {} → {}", id, if *after { "after" } else { "before" })
            }
            WidgetEvent::ModalOpened => "Modal opened → ready for demo".to_string(),
            WidgetEvent::ModalClosed => "Modal closed".to_string(),
            WidgetEvent::DemoStep { step, text } => format!("Demo step {}: {}", step, text),
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            WidgetEvent::SliderAdjusted { value, .. } if *value > 100 => Err(
                ConsoleError::InvalidArgument(format!("slider value {} is above 100", value)),
            ),
            WidgetEvent::SliderAdjusted { id, .. }
            | WidgetEvent::CardFlipped { id, .. } if id.trim().is_empty() => Err(
                ConsoleError::InvalidArgument("widget id must not be empty".to_string()),
            ),
            WidgetEvent::ChipAdded { label } | WidgetEvent::ChipRemoved { label }
                if label.trim().is_empty() =>
            {
                Err(ConsoleError::InvalidArgument("chip label must not be empty".to_string()))
            }
            _ => Ok(()),
        }
    }

    /// Appends this event to the log as an `action` entry.
    pub fn record(&self, store: &EventLogStore) -> Result<LogEntry> {
        self.validate()?;
        store.append(self.message(), Kind::Action)
    }
}
