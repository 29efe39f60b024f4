//! Delayed execution.

use std::time::Duration;
use tokio::runtime::Handle;

/// A deferred unit of work.
pub type Job = Box<dyn FnOnce() + Send>;

/// Runs jobs after a delay, off the caller's stack.
///
/// A zero delay still defers the job.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, delay: Duration, job: Job);
}

/// [`Scheduler`] backed by tokio timers.
#[derive(Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Use the runtime of the calling context.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, job: Job) {
        self.handle.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            job();
        });
    }
}
