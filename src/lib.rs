//! Event log core for the agency landing page console: a bounded,
//! observable log plus the idle-filler and status-indicator simulators
//! that keep it moving.

pub mod commands;
pub mod config;
pub mod error;
pub mod idle_simulator;
pub mod log_store;
pub mod random;
pub mod status_simulator;
pub mod ticker;
pub mod types;
pub mod viewer;
pub mod widgets;

pub use error::{ConsoleError, Result};
pub use idle_simulator::{IdleSettings, IdleSimulator, Suppression};
pub use log_store::{EventLogStore, Subscription};
pub use random::RandomSource;
pub use status_simulator::{StatusSimulator, Transition};
pub use types::{Kind, LogEntry, Mode, ModeIntervals, Status, StatusItem};
