//! Randomized live-status indicators.

use crate::error::{ConsoleError, Result};
use crate::log_store::{lock, EventLogStore};
use crate::random::RandomSource;
use crate::ticker::RepeatingTask;
use crate::types::{LogEntry, Mode, ModeIntervals, Status, StatusItem};
use log::{info, trace, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DEFAULT_CALM_INTERVAL_MS: u64 = 3000;
pub const DEFAULT_CHAOS_INTERVAL_MS: u64 = 1500;

/// One advance of one indicator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub index: usize,
    pub label: String,
    pub from: Status,
    pub to: Status,
    pub entry: LogEntry,
}

struct StatusInner {
    store: EventLogStore,
    items: Mutex<Vec<StatusItem>>,
    rng: Mutex<Box<dyn RandomSource>>,
    transitions: AtomicU64,
}

impl StatusInner {
    fn tick(&self) -> Result<Transition> {
        let (index, label, from, to) = {
            let mut items = lock(&self.items);
            let index = lock(&self.rng).pick(items.len());
            let item = &mut items[index];
            let from = item.status;
            item.status = from.next();
            (index, item.label.clone(), from, item.status)
        };
        
        self.transitions.fetch_add(1, Ordering::Relaxed);
        let entry = self.store.record(format!("{} → {}", label, to))?;
        trace!("Status {} advanced {} -> {}", label, from, to);
        
        Ok(Transition {
            index,
            label,
            from,
            to,
            entry,
        })
    }
}

/// Advances exactly one randomly chosen indicator per tick and logs it.
pub struct StatusSimulator {
    inner: Arc<StatusInner>,
    intervals: ModeIntervals,
    mode: Mode,
    task: RepeatingTask,
}

impl StatusSimulator {
    pub fn new(
        store: EventLogStore,
        items: Vec<StatusItem>,
        intervals: ModeIntervals,
        rng: Box<dyn RandomSource>,
    ) -> Result<Self> {
        if items.is_empty() {
            return Err(ConsoleError::InvalidArgument(
                "status simulator needs at least one item".to_string(),
            ));
        }
        intervals.validate()?;
        
        Ok(Self {
            inner: Arc::new(StatusInner {
                store,
                items: Mutex::new(items),
                rng: Mutex::new(rng),
                transitions: AtomicU64::new(0),
            }),
            intervals,
            mode: Mode::default(),
            task: RepeatingTask::new("status-simulator"),
        })
    }

    pub fn start(&mut self, mode: Mode) -> Result<()> {
        
        let inner = Arc::clone(&self.inner);
        self.task.start(self.intervals.for_mode(mode), move || {
            if let Err(e) = inner.tick() {
                warn!("Status tick failed: {}", e);
            }
        })?;
        self.mode = mode;
        
        info!(
            "Status simulator started in {} mode ({:?})",
            mode,
            self.intervals.for_mode(mode)
        );
        Ok(())
    }

    /// Same contract as the idle simulator: pending tick cancelled, fresh
    /// interval from now.
    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        if mode == self.mode {
            return Ok(());
        }
        
        // Mode only changes once the new timer is in place
        if self.task.is_running() {
            self.task.reset(self.intervals.for_mode(mode))?;
            info!("Status simulator switched to {} mode", mode);
        }
        self.mode = mode;
        Ok(())
    }

    pub fn stop(&mut self) {
        self.task.stop();
    }

    /// Runs one tick immediately, outside the timer.
    pub fn tick(&self) -> Result<Transition> {
        self.inner.tick()
    }

    pub fn items(&self) -> Vec<StatusItem> {
        lock(&self.inner.items).clone()
    }

    pub fn transitions(&self) -> u64 {
        self.inner.transitions.load(Ordering::Relaxed)
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
}
