use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::runtime::Handle;

/// A unit of deferred work.
pub type Task = BoxFuture<'static, ()>;

/// Runs tasks after a delay.
///
/// Tasks are fire-and-forget. Each task starts no earlier than its delay;
/// there is no ordering between independently scheduled tasks.
pub trait Scheduler: Send + Sync {
    fn schedule_after(&self, delay: Duration, task: Task);

    /// Runs `task` as soon as possible.
    fn spawn(&self, task: Task) {
        self.schedule_after(Duration::ZERO, task);
    }
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
    fn schedule_after(&self, delay: Duration, task: Task) {
        (**self).schedule_after(delay, task);
    }
}

/// [`Scheduler`] backed by a tokio runtime.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Uses the runtime of the calling task.
    ///
    /// # Panics
    ///
    /// Panics when called outside of a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_after(&self, delay: Duration, task: Task) {
        self.handle.spawn(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            task.await;
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_schedule_after_waits_for_delay() {
        let scheduler = TokioScheduler::current();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = fired.clone();
        scheduler.schedule_after(
            Duration::from_secs(5),
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_spawn_runs_immediately() {
        let scheduler: Arc<dyn Scheduler> = Arc::new(TokioScheduler::current());
        let (tx, rx) = futures::channel::oneshot::channel();
        scheduler.spawn(Box::pin(async move {
            let _ = tx.send(7);
        }));
        assert_eq!(rx.await.unwrap(), 7);
    }
}
