//! Detached persistence tasks.
//!
//! Write-backs run on a shared `TaskTracker`: the response path never awaits
//! them, dropping the request future does not cancel them, and callers that
//! need quiescence (tests, shutdown) can wait for all of them.

use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::task::JoinHandle;
use tokio_util::task::TaskTracker;

/// Tracker for every outstanding write-back and revalidation task.
#[derive(Debug, Clone, Default)]
pub struct WriteBacks {
    tracker: TaskTracker,
    /// Callers currently inside `settle`. The tracker is reopened only when
    /// the last of them leaves.
    settlers: Arc<Mutex<usize>>,
}

impl WriteBacks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a detached task and return its completion signal.
    pub fn spawn<F>(&self, task: F) -> WriteBack
    where
        F: Future<Output = ()> + Send + 'static,
    {
        WriteBack { handle: self.tracker.spawn(task) }
    }

    /// Number of tasks still running.
    pub fn pending(&self) -> usize {
        self.tracker.len()
    }

    /// Wait until every task spawned so far has finished.
    ///
    /// Tasks spawned while waiting are waited for too. Concurrent callers
    /// may overlap freely.
    pub async fn settle(&self) {
        {
            let mut settlers = self.settlers.lock().unwrap_or_else(PoisonError::into_inner);
            *settlers += 1;
            self.tracker.close();
        }

        self.tracker.wait().await;

        let mut settlers = self.settlers.lock().unwrap_or_else(PoisonError::into_inner);
        *settlers -= 1;
        if *settlers == 0 {
            self.tracker.reopen();
        }
    }
}

/// Completion signal for one detached task.
#[derive(Debug)]
pub struct WriteBack {
    handle: JoinHandle<()>,
}

impl WriteBack {
    /// Wait for the task to finish. Panics inside the task are logged, not propagated.
    pub async fn done(self) {
        if let Err(e) = self.handle.await {
            tracing::warn!("write-back task ended abnormally: {e}");
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn test_done_waits_for_task() {
        let writes = WriteBacks::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        let handle = writes.spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            c.fetch_add(1, Ordering::SeqCst);
        });

        handle.done().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_settle_waits_for_all() {
        let writes = WriteBacks::new();
        let counter = Arc::new(AtomicUsize::new(0));
        for n in 0..5u64 {
            let c = counter.clone();
            let _ = writes.spawn(async move {
                tokio::time::sleep(Duration::from_millis(5 * n)).await;
                c.fetch_add(1, Ordering::SeqCst);
            });
        }

        writes.settle().await;
        assert_eq!(counter.load(Ordering::SeqCst), 5);
        assert_eq!(writes.pending(), 0);

        // still usable after settling
        writes.spawn(async {}).done().await;
    }

    #[tokio::test]
    async fn test_task_survives_dropped_handle() {
        let writes = WriteBacks::new();
        let counter = Arc::new(AtomicUsize::new(0));
        let c = counter.clone();
        drop(writes.spawn(async move {
            c.fetch_add(1, Ordering::SeqCst);
        }));

        writes.settle().await;
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_overlapping_settles_all_return() {
        let writes = WriteBacks::new();
        let (release, blocked) = tokio::sync::oneshot::channel::<()>();
        let _ = writes.spawn(async move {
            let _ = blocked.await;
        });

        let first = tokio::spawn({
            let writes = writes.clone();
            async move { writes.settle().await }
        });
        let second = tokio::spawn({
            let writes = writes.clone();
            async move { writes.settle().await }
        });
        tokio::task::yield_now().await;
        release.send(()).unwrap();

        tokio::time::timeout(Duration::from_secs(5), async {
            first.await.unwrap();
            second.await.unwrap();
        })
        .await
        .expect("both settle calls return");

        // reopened once the last caller left
        writes.spawn(async {}).done().await;
        tokio::time::timeout(Duration::from_secs(5), writes.settle())
            .await
            .expect("settle after overlap returns");
    }
}
