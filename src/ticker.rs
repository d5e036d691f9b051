use crate::error::{ConsoleError, Result};
use log::debug;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

pub type TickFn = Arc<dyn Fn() + Send + Sync>;

/// A periodic callback owning at most one live timer.
///
/// Every (re)start bumps a generation counter; a tick from an older
/// generation is dropped even if its task has not observed the abort yet.
pub struct RepeatingTask {
    name: String,
    generation: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
    callback: Option<TickFn>,
    period: Option<Duration>,
}

impl RepeatingTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            generation: Arc::new(AtomicU64::new(0)),
            handle: None,
            callback: None,
            period: None,
        }
    }

    /// Starts ticking every `period`, first tick one full period from now.
    /// Any running timer is cancelled first.
    pub fn start<F>(&mut self, period: Duration, tick: F) -> Result<()>
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.spawn(period, Arc::new(tick))
    }

    /// Cancels the pending tick and restarts the interval at `period` from now.
    pub fn reset(&mut self, period: Duration) -> Result<()> {
        let callback = self.callback.clone().ok_or_else(|| {
            ConsoleError::InvalidArgument(format!("task {} was never started", self.name))
        })?;
        self.spawn(period, callback)
    }

    /// Cancels the timer. Stopping an already stopped task is a no-op.
    pub fn stop(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.abort();
            debug!("Stopped task {}", self.name);
        }
        self.period = None;
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map_or(false, |h| !h.is_finished())
    }

    pub fn period(&self) -> Option<Duration> {
        self.period
    }

    /// Replaces the running timer. On error the previous timer keeps running.
    fn spawn(&mut self, period: Duration, callback: TickFn) -> Result<()> {
        if period.is_zero() {
            return Err(ConsoleError::InvalidArgument(format!(
                "task {} needs a non-zero period",
                self.name
            )));
        }
        let runtime = Handle::try_current().map_err(|e| {
            ConsoleError::Runtime(format!("cannot start task {}: {}", self.name, e))
        })?;
        
        self.stop();
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let current = Arc::clone(&self.generation);
        
        self.callback = Some(Arc::clone(&callback));
        self.handle = Some(runtime.spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            
            loop {
                ticker.tick().await;
                if current.load(Ordering::SeqCst) != generation {
                    break;
                }
                callback();
            }
        }));
        self.period = Some(period);
        
        debug!("Started task {} with period {:?}", self.name, period);
        Ok(())
    }
}

impl Drop for RepeatingTask {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    fn counter_task(count: &Arc<AtomicUsize>, period_ms: u64) -> RepeatingTask {
        let mut task = RepeatingTask::new("counter");
        let count = Arc::clone(count);
        task.start(Duration::from_millis(period_ms), move || {
            count.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        task
    }

    #[tokio::test(start_paused = true)]
    async fn first_tick_waits_one_period() {
        let count = Arc::new(AtomicUsize::new(0));
        let _task = counter_task(&count, 1000);

        sleep(Duration::from_millis(900)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(2200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_is_idempotent_and_silences_ticks() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut task = counter_task(&count, 500);

        sleep(Duration::from_millis(1100)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);

        task.stop();
        task.stop();
        assert!(!task.is_running());
        assert_eq!(task.period(), None);

        sleep(Duration::from_millis(5000)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_restarts_interval_from_now() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut task = counter_task(&count, 1000);

        sleep(Duration::from_millis(800)).await;
        task.reset(Duration::from_millis(1000)).unwrap();

        // The old tick at 1000ms is gone; the next lands at 1800ms.
        sleep(Duration::from_millis(900)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
        sleep(Duration::from_millis(200)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejects_zero_period_and_unstarted_reset() {
        let mut task = RepeatingTask::new("bad");
        assert!(task.reset(Duration::from_millis(10)).is_err());
        assert!(task.start(Duration::ZERO, || {}).is_err());
        assert!(!task.is_running());
        // A rejected start leaves nothing to reset
        assert!(task.reset(Duration::from_millis(10)).is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn failed_reset_keeps_previous_timer() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut task = counter_task(&count, 1000);

        sleep(Duration::from_millis(500)).await;
        assert!(task.reset(Duration::ZERO).is_err());
        assert_eq!(task.period(), Some(Duration::from_millis(1000)));

        sleep(Duration::from_millis(600)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn start_outside_runtime_fails() {
        let mut task = RepeatingTask::new("orphan");
        let result = task.start(Duration::from_millis(10), || {});
        assert!(matches!(result, Err(ConsoleError::Runtime(_))));
    }
}
