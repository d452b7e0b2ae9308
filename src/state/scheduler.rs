//! Cancelable delayed tasks used by the autosave debounce.

use std::time::Duration;

use futures::future::BoxFuture;
use tokio::{runtime::Handle, sync::oneshot, time::sleep};

/// Runs a task once after a delay unless the returned handle is dropped first.
pub trait Scheduler: Send + Sync {
    /// Run `task` after `delay`; dropping the handle cancels it.
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) -> ScheduledTask;
}

/// Handle to a scheduled task. Dropping it cancels the task if it has not fired yet;
/// a task that already started runs to completion.
#[must_use = "dropping a ScheduledTask cancels it"]
pub struct ScheduledTask {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl ScheduledTask {
    /// Wrap the cancellation hook of a scheduler implementation.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Cancel explicitly; equivalent to dropping the handle.
    pub fn cancel(self) {}
}

impl Drop for ScheduledTask {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl std::fmt::Debug for ScheduledTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScheduledTask")
            .field("armed", &self.cancel.is_some())
            .finish()
    }
}

/// Scheduler backed by tokio timers on a given runtime.
///
/// Tests drive it deterministically by pausing the tokio clock.
#[derive(Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Scheduler spawning onto `handle`.
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Scheduler bound to the runtime the caller is running on.
    pub fn current() -> Result<Self, tokio::runtime::TryCurrentError> {
        Handle::try_current().map(Self::new)
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, delay: Duration, task: BoxFuture<'static, ()>) -> ScheduledTask {
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
        self.handle.spawn(async move {
            tokio::select! {
                _ = sleep(delay) => task.await,
                // Resolves on explicit send and when the sender is dropped.
                _ = cancel_rx => {}
            }
        });
        ScheduledTask::new(move || drop(cancel_tx))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    fn counting_task(counter: &Arc<AtomicUsize>) -> BoxFuture<'static, ()> {
        let counter = Arc::clone(counter);
        Box::pin(async move {
            counter.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn task_fires_after_delay() {
        let scheduler = TokioScheduler::current().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));

        let _handle = scheduler.schedule(Duration::from_millis(250), counting_task(&fired));
        sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        sleep(Duration::from_millis(100)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_cancels() {
        let scheduler = TokioScheduler::current().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));

        let handle = scheduler.schedule(Duration::from_millis(250), counting_task(&fired));
        handle.cancel();
        sleep(Duration::from_millis(500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_after_fire_is_harmless() {
        let scheduler = TokioScheduler::current().unwrap();
        let fired = Arc::new(AtomicUsize::new(0));

        let handle = scheduler.schedule(Duration::from_millis(10), counting_task(&fired));
        sleep(Duration::from_millis(50)).await;
        drop(handle);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
