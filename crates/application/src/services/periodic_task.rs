//! Cancellable periodic background task
//!
//! A `PeriodicTask` owns a spawned tokio task that invokes a callback on a
//! fixed period. Dropping or stopping the handle aborts the task, so a
//! component that holds an `Option<PeriodicTask>` gets idempotent
//! start/stop for free.

use std::{fmt, future::Future, time::Duration};

use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::debug;

/// Shortest period accepted; `tokio::time::interval` rejects zero
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Handle to a running periodic task
pub struct PeriodicTask {
    name: &'static str,
    period: Duration,
    handle: JoinHandle<()>,
}

impl PeriodicTask {
    /// Spawn a task whose first run happens one full `period` from now
    pub fn spawn<F, Fut>(name: &'static str, period: Duration, tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::start(name, period, false, tick)
    }

    /// Spawn a task that runs immediately and then every `period`
    pub fn spawn_immediate<F, Fut>(name: &'static str, period: Duration, tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        Self::start(name, period, true, tick)
    }

    fn start<F, Fut>(name: &'static str, period: Duration, immediate: bool, mut tick: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let period = period.max(MIN_PERIOD);
        debug!(task = name, period_ms = period.as_millis(), "Starting periodic task");

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            if !immediate {
                // The first tick completes immediately
                ticker.tick().await;
            }
            loop {
                ticker.tick().await;
                tick().await;
            }
        });

        Self {
            name,
            period,
            handle,
        }
    }

    /// Cancel the task
    pub fn stop(self) {
        debug!(task = self.name, "Stopping periodic task");
        drop(self);
    }

    /// Whether the underlying task is still alive
    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }

    pub const fn period(&self) -> Duration {
        self.period
    }
}

impl Drop for PeriodicTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl fmt::Debug for PeriodicTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PeriodicTask")
            .field("name", &self.name)
            .field("period", &self.period)
            .field("running", &self.is_running())
            .finish()
    }
}
