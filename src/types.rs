use crate::error::ConsoleError;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Display classification of a log entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Info,
    Success,
    #[default]
    Action,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Info => "info",
            Kind::Success => "success",
            Kind::Action => "action",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "info" => Ok(Kind::Info),
            "success" => Ok(Kind::Success),
            "action" => Ok(Kind::Action),
            other => Err(ConsoleError::InvalidArgument(format!(
                "unknown log kind: {}",
                other
            ))),
        }
    }
}

/// A single immutable entry in the event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Strictly increasing, assigned by the store
    pub id: u64,
    pub message: String,
    /// 24-hour local wall-clock time, `HH:MM:SS`
    pub timestamp: String,
    pub kind: Kind,
}

impl LogEntry {
    pub fn new(id: u64, message: String, kind: Kind) -> Self {
        Self {
            id,
            message,
            timestamp: Local::now().format("%H:%M:%S").to_string(),
            kind,
        }
    }
}

/// Cosmetic theme mode. Only affects simulator tick speed here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Calm,
    Chaos,
}

impl Mode {
    pub fn toggled(self) -> Self {
        match self {
            Mode::Calm => Mode::Chaos,
            Mode::Chaos => Mode::Calm,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Calm => f.write_str("calm"),
            Mode::Chaos => f.write_str("chaos"),
        }
    }
}

impl FromStr for Mode {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "calm" => Ok(Mode::Calm),
            "chaos" => Ok(Mode::Chaos),
            other => Err(ConsoleError::InvalidArgument(format!(
                "unknown mode: {}",
                other
            ))),
        }
    }
}

/// The pair of tick periods a simulator switches between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeIntervals {
    pub calm: Duration,
    pub chaos: Duration,
}

impl ModeIntervals {
    pub fn new(calm: Duration, chaos: Duration) -> Self {
        Self { calm, chaos }
    }
    
    pub fn from_millis(calm_ms: u64, chaos_ms: u64) -> Self {
        Self::new(Duration::from_millis(calm_ms), Duration::from_millis(chaos_ms))
    }

    pub fn for_mode(&self, mode: Mode) -> Duration {
        match mode {
            Mode::Calm => self.calm,
            Mode::Chaos => self.chaos,
        }
    }

    /// Both periods must be non-zero for a timer to run on them.
    pub fn validate(&self) -> Result<(), ConsoleError> {
        if self.calm.is_zero() || self.chaos.is_zero() {
            return Err(ConsoleError::InvalidArgument(format!(
                "mode intervals must be non-zero (calm {:?}, chaos {:?})",
                self.calm, self.chaos
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Active,
    Idle,
    Busy,
}

impl Status {
    /// Next state in the cycle `active -> idle -> busy -> active`.
    pub fn next(self) -> Self {
        match self {
            Status::Active => Status::Idle,
            Status::Idle => Status::Busy,
            Status::Busy => Status::Active,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Active => f.write_str("active"),
            Status::Idle => f.write_str("idle"),
            Status::Busy => f.write_str("busy"),
        }
    }
}

impl FromStr for Status {
    type Err = ConsoleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(Status::Active),
            "idle" => Ok(Status::Idle),
            "busy" => Ok(Status::Busy),
            other => Err(ConsoleError::InvalidArgument(format!(
                "unknown status: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusItem {
    pub id: String,
    pub label: String,
    pub status: Status,
}

impl StatusItem {
    pub fn new(id: &str, label: &str, status: Status) -> Self {
        Self {
            id: id.to_string(),
            label: label.to_string(),
            status,
        }
    }
}

/// The four indicators shown on the status panel at startup.
pub fn default_status_items() -> Vec<StatusItem> {
    vec![
        StatusItem::new("agents", "Agents Online", Status::Active),
        StatusItem::new("pipelines", "Pipelines", Status::Active),
        StatusItem::new("queue", "Queue", Status::Idle),
        StatusItem::new("monitoring", "Monitoring", Status::Busy),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_cycles_through_all_states() {
        assert_eq!(Status::Active.next(), Status::Idle);
        assert_eq!(Status::Idle.next(), Status::Busy);
        assert_eq!(Status::Busy.next(), Status::Active);
    }

    #[test]
    fn mode_picks_matching_interval() {
        let intervals = ModeIntervals::from_millis(3000, 1500);
        assert_eq!(intervals.for_mode(Mode::Calm), Duration::from_millis(3000));
        assert_eq!(intervals.for_mode(Mode::Chaos), Duration::from_millis(1500));
        assert_eq!(Mode::Calm.toggled(), Mode::Chaos);
        assert_eq!(Mode::Chaos.toggled(), Mode::Calm);
        assert!(intervals.validate().is_ok());
        assert!(matches!(
            ModeIntervals::from_millis(4000, 0).validate(),
            Err(ConsoleError::InvalidArgument(_))
        ));
    }

    #[test]
    fn parses_names_case_insensitively() {
        assert_eq!("Chaos".parse::<Mode>().unwrap(), Mode::Chaos);
        assert_eq!("SUCCESS".parse::<Kind>().unwrap(), Kind::Success);
        assert_eq!(" busy ".parse::<Status>().unwrap(), Status::Busy);
        assert!(matches!(
            "loud".parse::<Kind>(),
            Err(ConsoleError::InvalidArgument(_))
        ));
    }

    #[test]
    fn timestamp_is_24_hour_clock() {
        let entry = LogEntry::new(1, "Pipeline healthy".to_string(), Kind::Info);
        assert_eq!(entry.timestamp.len(), 8);
        let parts: Vec<u32> = entry
            .timestamp
            .split(':')
            .map(|p| p.parse().unwrap())
            .collect();
        assert_eq!(parts.len(), 3);
        assert!(parts[0] < 24 && parts[1] < 60 && parts[2] < 61);
    }

    #[test]
    fn entry_serializes_kind_in_lowercase() {
        let entry = LogEntry::new(7, "Workflow cleared".to_string(), Kind::Action);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"], "action");
        assert_eq!(json["id"], 7);
    }
}
