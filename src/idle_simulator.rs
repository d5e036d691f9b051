//! Filler messages for an otherwise silent console.

use crate::error::{ConsoleError, Result};
use crate::log_store::{lock, EventLogStore};
use crate::random::RandomSource;
use crate::ticker::RepeatingTask;
use crate::types::{Kind, LogEntry, Mode, ModeIntervals};
use log::{debug, info, trace, warn};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_IDLE_MESSAGES: [&str; 6] = [
    "Listening for events...",
    "All systems nominal",
    "Agents standing by",
    "Pipeline healthy",
    "Monitoring active",
    "Ready for input",
];

pub const DEFAULT_CALM_INTERVAL_MS: u64 = 4000;
pub const DEFAULT_CHAOS_INTERVAL_MS: u64 = 2000;
pub const DEFAULT_IDLE_WINDOW_MS: u64 = 4000;

/// When real activity silences the filler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Suppression {
    /// Quiet while the last real append is younger than the idle window.
    #[default]
    Windowed,
    /// Quiet for good once anything real is appended after start.
    Sticky,
}

#[derive(Debug, Clone)]
pub struct IdleSettings {
    pub intervals: ModeIntervals,
    pub idle_window: Duration,
    pub suppression: Suppression,
    pub messages: Vec<String>,
}

impl Default for IdleSettings {
    fn default() -> Self {
        Self {
            intervals: ModeIntervals::from_millis(DEFAULT_CALM_INTERVAL_MS, DEFAULT_CHAOS_INTERVAL_MS),
            idle_window: Duration::from_millis(DEFAULT_IDLE_WINDOW_MS),
            suppression: Suppression::default(),
            messages: DEFAULT_IDLE_MESSAGES.iter().map(|m| m.to_string()).collect(),
        }
    }
}

struct IdleInner {
    store: EventLogStore,
    messages: Vec<String>,
    idle_window: Duration,
    suppression: Suppression,
    rng: Mutex<Box<dyn RandomSource>>,
    // Real activity count when the simulator last started
    baseline: AtomicU64,
    emitted: AtomicU64,
    suppressed: AtomicU64,
}

impl IdleInner {
    fn is_suppressed(&self) -> bool {
        match self.suppression {
            Suppression::Windowed => match self.store.last_activity() {
                Some(at) => Instant::now().saturating_duration_since(at) < self.idle_window,
                None => false,
            },
            Suppression::Sticky => {
                self.store.activity_count() > self.baseline.load(Ordering::SeqCst)
            }
        }
    }

    fn tick(&self) -> Option<LogEntry> {
        if self.is_suppressed() {
            self.suppressed.fetch_add(1, Ordering::Relaxed);
            debug!("Idle tick suppressed by recent activity");
            return None;
        }
        
        let index = lock(&self.rng).pick(self.messages.len());
        let message = self.messages[index].clone();
        
        match self.store.append_filler(message, Kind::Info) {
            Ok(entry) => {
                self.emitted.fetch_add(1, Ordering::Relaxed);
                trace!("Idle filler #{}: {}", entry.id, entry.message);
                Some(entry)
            }
            Err(e) => {
                warn!("Idle filler rejected: {}", e);
                None
            }
        }
    }
}

/// Periodically appends an `info` filler picked from a fixed pool while
/// nothing real is happening.
pub struct IdleSimulator {
    inner: Arc<IdleInner>,
    intervals: ModeIntervals,
    mode: Mode,
    task: RepeatingTask,
}

impl IdleSimulator {
    pub fn new(
        store: EventLogStore,
        settings: IdleSettings,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self> {
        let messages: Vec<String> = settings
            .messages
            .into_iter()
            .filter(|m| !m.trim().is_empty())
            .collect();
        if messages.is_empty() {
            return Err(ConsoleError::InvalidArgument(
                "idle message pool is empty".to_string(),
            ));
        }
        settings.intervals.validate()?;
        
        Ok(Self {
            inner: Arc::new(IdleInner {
                store,
                messages,
                idle_window: settings.idle_window,
                suppression: settings.suppression,
                rng: Mutex::new(rng),
                baseline: AtomicU64::new(0),
                emitted: AtomicU64::new(0),
                suppressed: AtomicU64::new(0),
            }),
            intervals: settings.intervals,
            mode: Mode::default(),
            task: RepeatingTask::new("idle-simulator"),
        })
    }

    /// Starts (or restarts) ticking at the interval for `mode`.
    pub fn start(&mut self, mode: Mode) -> Result<()> {
        self.inner
            .baseline
            .store(self.inner.store.activity_count(), Ordering::SeqCst);
        
        let inner = Arc::clone(&self.inner);
        self.task.start(self.intervals.for_mode(mode), move || {
            inner.tick();
        })?;
        self.mode = mode;
        
        info!(
            "Idle simulator started in {} mode ({:?})",
            mode,
            self.intervals.for_mode(mode)
        );
        Ok(())
    }

    /// Switches the tick interval. The pending tick is dropped and a fresh
    /// interval starts now. Same mode or a stopped simulator: only recorded.
    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        if mode == self.mode {
            return Ok(());
        }
        
        // Mode only changes once the new timer is in place
        if self.task.is_running() {
            self.task.reset(self.intervals.for_mode(mode))?;
            info!("Idle simulator switched to {} mode", mode);
        }
        self.mode = mode;
        Ok(())
    }

    pub fn stop(&mut self) {
        self.task.stop();
    }

    /// Runs one tick immediately, outside the timer.
    pub fn tick(&self) -> Option<LogEntry> {
        self.inner.tick()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }

    pub fn period(&self) -> Option<Duration> {
        self.task.period()
    }

    pub fn emitted(&self) -> u64 {
        self.inner.emitted.load(Ordering::Relaxed)
    }

    pub fn suppressed(&self) -> u64 {
        self.inner.suppressed.load(Ordering::Relaxed)
    }
}
