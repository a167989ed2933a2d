//! Repeating background tasks.
//!
//! # Responsibilities
//! - Run a callback on a fixed period until cancelled
//! - Hand back a handle that cancels the schedule
//!
//! # Design Decisions
//! - The first run happens one period after registration
//! - A slow run delays the next one instead of bursting to catch up
//! - Dropping a `TaskHandle` does not cancel; only `cancel` does

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::task::AbortHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Future produced by one run of a scheduled task.
pub type TaskFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Callback invoked on every period.
pub type TaskFn = Box<dyn FnMut() -> TaskFuture + Send + 'static>;

/// Cancellation handle for a registered task.
#[derive(Debug)]
pub struct TaskHandle {
    abort: AbortHandle,
}

impl TaskHandle {
    pub fn new(abort: AbortHandle) -> Self {
        Self { abort }
    }

    /// Stop the schedule. Idempotent.
    pub fn cancel(&self) {
        self.abort.abort();
    }

    /// True once the task has stopped running.
    pub fn is_finished(&self) -> bool {
        self.abort.is_finished()
    }
}

/// Anything that can run a callback periodically.
pub trait Scheduler: Send + Sync {
    fn register(&self, period: Duration, task: TaskFn) -> TaskHandle;
}

/// Scheduler backed by the ambient tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn register(&self, period: Duration, mut task: TaskFn) -> TaskHandle {
        let join = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                task().await;
            }
        });
        TaskHandle::new(join.abort_handle())
    }
}
