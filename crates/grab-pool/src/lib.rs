//! Bounded worker pool for independent async tasks.
//!
//! # Architecture
//!
//! - [`Task`] - An identified unit of work
//! - [`WorkerPool`] - A fixed number of workers draining a shared queue
//!
//! The queue is filled with every submitted task and closed before any worker
//! starts, so workers simply drain it until it is empty. [`WorkerPool::run`]
//! resolves once a shared completion counter has seen every task.
//!
//! Tasks produce no result. A task that can fail is expected to record or log
//! the failure itself.

mod error;
mod pool;
mod task;

pub use error::{Error, Result};
pub use pool::WorkerPool;
pub use task::Task;
