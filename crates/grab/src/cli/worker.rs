use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Args;
use grab_pool::{Task, WorkerPool};
use tracing::{debug, info};

use crate::cli::app::parse_count;
use crate::utils::ui::tracker::{ProgressTracker, ProgressTrackerConfig, Tracker, TrackerUnit};

#[derive(Args, Clone, Debug)]
pub struct WorkerArg {
    #[arg(short, long, default_value_t = 20, value_parser = parse_count, help = "Number of tasks")]
    pub tasks: usize,

    #[arg(
        short,
        long,
        value_parser = parse_count,
        help = "Concurrent workers, defaults to the number of CPU threads"
    )]
    pub workers: Option<usize>,

    #[arg(long, default_value_t = 1000, help = "How long each task sleeps, in milliseconds")]
    pub sleep_ms: u64,
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
}

pub async fn run(arg: WorkerArg) -> Result<()> {
    let workers = arg.workers.unwrap_or_else(default_workers);
    let pool = WorkerPool::new(workers).context("Failed to create worker pool")?;

    let tracker = Arc::new(ProgressTracker::new(ProgressTrackerConfig {
        len: Some(arg.tasks as u64),
        unit: TrackerUnit::Tasks,
    }));
    let delay = Duration::from_millis(arg.sleep_ms);

    let tasks = (1..=arg.tasks)
        .map(|id| {
            let bar = Arc::clone(&tracker);
            Task::new(id, async move {
                debug!(task = id, "running");
                tokio::time::sleep(delay).await;
                bar.inc(1);
                debug!(task = id, "completed");
            })
        })
        .collect();

    let started = Instant::now();
    pool.run(tasks).await;

    tracker.finish(Some("all tasks finished".to_string()));
    info!(
        tasks = arg.tasks,
        workers,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "worker pool drained"
    );
    Ok(())
}
