//! Append-only, bounded event log shared by every widget and simulator.
//!
//! Appends are totally ordered by call order. Observers are called after the
//! data lock is released, in subscription order, and always see entries in
//! the same order they were appended.

use crate::error::{ConsoleError, Result};
use crate::types::{Kind, LogEntry};
use log::{trace, warn};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::time::Instant;

pub const DEFAULT_RETENTION: usize = 200;

pub type Observer = Arc<dyn Fn(&LogEntry) + Send + Sync>;

/// Whether an append reflects real activity or idle filler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Origin {
    Real,
    Filler,
}

struct LogState {
    entries: VecDeque<LogEntry>,
    retention: usize,
    next_id: u64,
    last_activity: Option<Instant>,
    activity_count: u64,
    // Entries appended but not yet delivered to observers
    pending: VecDeque<LogEntry>,
    dispatching: bool,
}

struct Shared {
    state: Mutex<LogState>,
    observers: Mutex<Vec<(u64, Observer)>>,
    next_observer_id: AtomicU64,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Clone)]
pub struct EventLogStore {
    shared: Arc<Shared>,
}

impl Default for EventLogStore {
    fn default() -> Self {
        Self::new(DEFAULT_RETENTION)
    }
}

impl EventLogStore {
    /// Creates a store keeping at most `retention` entries (minimum 1).
    pub fn new(retention: usize) -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(LogState {
                    entries: VecDeque::with_capacity(retention.clamp(1, 1024)),
                    retention: retention.max(1),
                    next_id: 1,
                    last_activity: None,
                    activity_count: 0,
                    pending: VecDeque::new(),
                    dispatching: false,
                }),
                observers: Mutex::new(Vec::new()),
                next_observer_id: AtomicU64::new(1),
            }),
        }
    }

    /// Records a real event. Fails only on an empty message.
    pub fn append(&self, message: impl Into<String>, kind: Kind) -> Result<LogEntry> {
        self.insert(message.into(), kind, Origin::Real)
    }

    /// Records a real event with the default `action` kind.
    pub fn record(&self, message: impl Into<String>) -> Result<LogEntry> {
        self.append(message, Kind::default())
    }

    pub(crate) fn append_filler(&self, message: impl Into<String>, kind: Kind) -> Result<LogEntry> {
        self.insert(message.into(), kind, Origin::Filler)
    }

    fn insert(&self, message: String, kind: Kind, origin: Origin) -> Result<LogEntry> {
        if message.trim().is_empty() {
            return Err(ConsoleError::InvalidArgument(
                "log message must not be empty".to_string(),
            ));
        }
        
        let (entry, should_dispatch) = {
            let mut state = lock(&self.shared.state);
            
            let entry = LogEntry::new(state.next_id, message, kind);
            state.next_id += 1;
            
            if state.entries.len() >= state.retention {
                state.entries.pop_front();
            }
            state.entries.push_back(entry.clone());
            
            if origin == Origin::Real {
                state.last_activity = Some(Instant::now());
                state.activity_count += 1;
            }
            
            state.pending.push_back(entry.clone());
            let should_dispatch = !state.dispatching;
            state.dispatching = true;
            (entry, should_dispatch)
        };
        
        trace!("Appended entry #{} ({}): {}", entry.id, entry.kind, entry.message);
        
        // A nested or concurrent append only queues; the active dispatcher
        // delivers it after the entries before it.
        if should_dispatch {
            self.dispatch();
        }
        
        Ok(entry)
    }

    fn dispatch(&self) {
        let mut guard = DispatchGuard {
            shared: &self.shared,
            armed: true,
        };
        
        loop {
            let next = {
                let mut state = lock(&self.shared.state);
                match state.pending.pop_front() {
                    Some(entry) => entry,
                    None => {
                        state.dispatching = false;
                        guard.armed = false;
                        return;
                    }
                }
            };
            
            let observers: Vec<Observer> = lock(&self.shared.observers)
                .iter()
                .map(|(_, observer)| Arc::clone(observer))
                .collect();
            
            for observer in observers {
                observer(&next);
            }
        }
    }

    /// Returns the most recent `limit` entries (all when `None`), oldest first.
    pub fn snapshot(&self, limit: Option<usize>) -> Vec<LogEntry> {
        let state = lock(&self.shared.state);
        let skip = match limit {
            Some(limit) => state.entries.len().saturating_sub(limit),
            None => 0,
        };
        state.entries.iter().skip(skip).cloned().collect()
    }

    /// Registers an observer called after every append until the returned
    /// handle is unsubscribed or dropped.
    ///
    /// Delivery happens on the thread that is already dispatching. When
    /// appends race across threads, an `append` may return before its entry
    /// reaches observers; the other thread delivers it, still in append order.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&LogEntry) + Send + Sync + 'static,
    {
        let id = self.shared.next_observer_id.fetch_add(1, Ordering::Relaxed);
        lock(&self.shared.observers).push((id, Arc::new(observer)));
        
        Subscription {
            shared: Arc::downgrade(&self.shared),
            id,
            active: true,
        }
    }

    pub fn observer_count(&self) -> usize {
        lock(&self.shared.observers).len()
    }

    pub fn len(&self) -> usize {
        lock(&self.shared.state).entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn retention(&self) -> usize {
        lock(&self.shared.state).retention
    }

    /// Time of the latest real (non-filler) append.
    pub fn last_activity(&self) -> Option<Instant> {
        lock(&self.shared.state).last_activity
    }

    /// Number of real appends since the store was created.
    pub fn activity_count(&self) -> u64 {
        lock(&self.shared.state).activity_count
    }
}

/// Releases the dispatcher role if an observer panics mid-delivery.
/// Entries still queued at that point stay in the log but are not delivered.
struct DispatchGuard<'a> {
    shared: &'a Shared,
    armed: bool,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = lock(&self.shared.state);
        let dropped = state.pending.len();
        state.pending.clear();
        state.dispatching = false;
        warn!("Observer panicked; {} queued notifications discarded", dropped);
    }
}

/// Handle returned by [`EventLogStore::subscribe`].
#[must_use = "dropping a Subscription unsubscribes its observer"]
pub struct Subscription {
    shared: Weak<Shared>,
    id: u64,
    active: bool,
}

impl Subscription {
    pub fn unsubscribe(mut self) {
        self.detach();
    }

    pub fn is_active(&self) -> bool {
        self.active && self.shared.strong_count() > 0
    }

    fn detach(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        
        if let Some(shared) = self.shared.upgrade() {
            lock(&shared.observers).retain(|(id, _)| *id != self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.detach();
    }
}
