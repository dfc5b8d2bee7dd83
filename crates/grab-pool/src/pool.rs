use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures_util::FutureExt;
use tokio::sync::{Mutex, Notify, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::task::Task;

/// Counts finished tasks and wakes the submitter as they report in.
#[derive(Debug, Default)]
struct Completion {
    done: AtomicUsize,
    notify: Notify,
}

impl Completion {
    fn mark_done(&self) {
        self.done.fetch_add(1, Ordering::AcqRel);
        self.notify.notify_one();
    }

    async fn wait_for(&self, total: usize) {
        while self.done.load(Ordering::Acquire) < total {
            self.notify.notified().await;
        }
    }

    fn count(&self) -> usize {
        self.done.load(Ordering::Acquire)
    }
}

/// A fixed number of workers draining a shared task queue.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use grab_pool::{Task, WorkerPool};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let hits = Arc::new(AtomicUsize::new(0));
/// let tasks = (0..8)
///     .map(|id| {
///         let hits = Arc::clone(&hits);
///         Task::new(id, async move {
///             hits.fetch_add(1, Ordering::SeqCst);
///         })
///     })
///     .collect();
///
/// WorkerPool::new(3).unwrap().run(tasks).await;
/// assert_eq!(hits.load(Ordering::SeqCst), 8);
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerPool {
    concurrency: usize,
}

impl WorkerPool {
    /// Create a pool running at most `concurrency` tasks at once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConcurrency`] when `concurrency` is zero.
    pub fn new(concurrency: usize) -> Result<Self> {
        if concurrency == 0 {
            return Err(Error::InvalidConcurrency);
        }

        Ok(Self { concurrency })
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Execute every task exactly once and return when all of them finished.
    ///
    /// The queue holds exactly `tasks.len()` entries and is closed before the
    /// workers start. At most `min(concurrency, tasks.len())` workers are
    /// spawned. A panicking task is logged and counted as finished so the
    /// remaining tasks still run.
    pub async fn run(&self, tasks: Vec<Task>) {
        let total = tasks.len();
        if total == 0 {
            return;
        }

        let (tx, rx) = mpsc::channel::<Task>(total);
        for task in tasks {
            // The receiver lives until the end of this function and the
            // channel has room for every task.
            if tx.send(task).await.is_err() {
                break;
            }
        }
        drop(tx);

        let rx = Arc::new(Mutex::new(rx));
        let completion = Arc::new(Completion::default());
        let workers = self.concurrency.min(total);
        debug!(tasks = total, workers, "starting worker pool");

        let mut set = JoinSet::new();
        for worker in 0..workers {
            let rx = Arc::clone(&rx);
            let completion = Arc::clone(&completion);

            set.spawn(async move {
                loop {
                    let next = rx.lock().await.recv().await;
                    let Some(task) = next else { break };

                    let (id, work) = task.into_parts();
                    debug!(worker, task = id, "task started");
                    if AssertUnwindSafe(work).catch_unwind().await.is_err() {
                        error!(worker, task = id, "task panicked");
                    }
                    completion.mark_done();
                }
            });
        }

        completion.wait_for(total).await;

        while let Some(joined) = set.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "worker exited abnormally");
            }
        }

        debug!(completed = completion.count(), "worker pool drained");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn counting_tasks(n: usize, hits: &Arc<Vec<AtomicUsize>>) -> Vec<Task> {
        (0..n)
            .map(|id| {
                let hits = Arc::clone(hits);
                Task::new(id, async move {
                    tokio::task::yield_now().await;
                    hits[id].fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect()
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        assert!(matches!(WorkerPool::new(0), Err(Error::InvalidConcurrency)));
    }

    #[tokio::test]
    async fn test_empty_task_list_returns() {
        WorkerPool::new(4).unwrap().run(Vec::new()).await;
    }

    #[tokio::test]
    async fn test_every_task_runs_exactly_once() {
        let hits = Arc::new((0..20).map(|_| AtomicUsize::new(0)).collect::<Vec<_>>());

        WorkerPool::new(4)
            .unwrap()
            .run(counting_tasks(20, &hits))
            .await;

        for (id, hit) in hits.iter().enumerate() {
            assert_eq!(hit.load(Ordering::SeqCst), 1, "task {id} ran a wrong number of times");
        }
    }

    #[tokio::test]
    async fn test_exactly_once_for_all_small_shapes() {
        for n in 1..=12 {
            for c in 1..=n {
                let hits = Arc::new((0..n).map(|_| AtomicUsize::new(0)).collect::<Vec<_>>());

                WorkerPool::new(c).unwrap().run(counting_tasks(n, &hits)).await;

                let total: usize = hits.iter().map(|h| h.load(Ordering::SeqCst)).sum();
                assert_eq!(total, n, "n={n} c={c}");
                assert!(hits.iter().all(|h| h.load(Ordering::SeqCst) == 1), "n={n} c={c}");
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrency_is_bounded() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks = (0..12)
            .map(|id| {
                let in_flight = Arc::clone(&in_flight);
                let peak = Arc::clone(&peak);
                Task::new(id, async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                })
            })
            .collect();

        WorkerPool::new(3).unwrap().run(tasks).await;

        assert_eq!(in_flight.load(Ordering::SeqCst), 0);
        assert_eq!(peak.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_more_workers_than_tasks() {
        let hits = Arc::new((0..3).map(|_| AtomicUsize::new(0)).collect::<Vec<_>>());

        WorkerPool::new(16)
            .unwrap()
            .run(counting_tasks(3, &hits))
            .await;

        assert!(hits.iter().all(|h| h.load(Ordering::SeqCst) == 1));
    }

    #[tokio::test]
    async fn test_panicking_task_does_not_stall_pool() {
        let hits = Arc::new(AtomicUsize::new(0));

        let mut tasks = vec![Task::new(0, async { panic!("boom") })];
        for id in 1..6 {
            let hits = Arc::clone(&hits);
            tasks.push(Task::new(id, async move {
                hits.fetch_add(1, Ordering::SeqCst);
            }));
        }

        WorkerPool::new(1).unwrap().run(tasks).await;

        assert_eq!(hits.load(Ordering::SeqCst), 5);
    }
}
