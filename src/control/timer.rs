//! Cancellable deferred tasks
//!
//! [`Timer`] is the clock seam of the control loop: the evaluator never
//! sleeps itself, it hands a future to the timer and keeps the returned
//! [`TimerHandle`]. [`TokioTimer`] runs each task on the tokio runtime, so
//! tests can drive it deterministically with a paused clock.

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::debug;

/// Scheduling failures.
#[derive(Debug, thiserror::Error)]
pub enum TimerError {
    #[error("no tokio runtime available")]
    NoRuntime,
    #[error("timer has been shut down")]
    ShutDown,
}

/// Handle to one scheduled task. Cancelling is idempotent; a task that has
/// already started running is not interrupted.
#[derive(Debug, Clone)]
pub struct TimerHandle {
    token: CancellationToken,
}

impl TimerHandle {
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Runs a task once after a delay.
#[async_trait]
pub trait Timer: Send + Sync {
    /// Schedule `task` to run after `delay`.
    fn after(&self, delay: Duration, task: BoxFuture<'static, ()>)
        -> Result<TimerHandle, TimerError>;

    /// Cancel every pending task and wait for tasks already running.
    /// Later calls to [`Timer::after`] fail with [`TimerError::ShutDown`].
    async fn shutdown(&self);
}

/// [`Timer`] backed by `tokio::time::sleep`.
#[derive(Debug, Default)]
pub struct TokioTimer {
    root: CancellationToken,
    tracker: TaskTracker,
}

impl TokioTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of scheduled or running tasks.
    pub fn in_flight(&self) -> usize {
        self.tracker.len()
    }
}

#[async_trait]
impl Timer for TokioTimer {
    fn after(
        &self,
        delay: Duration,
        task: BoxFuture<'static, ()>,
    ) -> Result<TimerHandle, TimerError> {
        if self.root.is_cancelled() {
            return Err(TimerError::ShutDown);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| TimerError::NoRuntime)?;

        let token = self.root.child_token();
        let cancelled = token.clone();
        self.tracker.spawn_on(
            async move {
                tokio::select! {
                    biased;
                    () = cancelled.cancelled() => {
                        debug!(delay_ms = delay.as_millis(), "Timer cancelled before firing");
                    }
                    () = tokio::time::sleep(delay) => task.await,
                }
            },
            &runtime,
        );

        Ok(TimerHandle { token })
    }

    async fn shutdown(&self) {
        self.root.cancel();
        self.tracker.close();
        self.tracker.wait().await;
        debug!("Timer drained");
    }
}
