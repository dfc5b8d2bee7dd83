use std::fmt;
use std::future::Future;

use futures_util::future::BoxFuture;

/// A unit of work handed to a [`WorkerPool`](crate::WorkerPool).
pub struct Task {
    id: usize,
    work: BoxFuture<'static, ()>,
}

impl Task {
    /// Wrap a future as a task identified by `id`.
    ///
    /// # Examples
    ///
    /// ```
    /// use grab_pool::Task;
    ///
    /// let task = Task::new(7, async {});
    /// assert_eq!(task.id(), 7);
    /// ```
    pub fn new<F>(id: usize, work: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        Self {
            id,
            work: Box::pin(work),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub(crate) fn into_parts(self) -> (usize, BoxFuture<'static, ()>) {
        (self.id, self.work)
    }
}

impl fmt::Debug for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("id", &self.id)
            .field("work", &"{ ... }")
            .finish()
    }
}
