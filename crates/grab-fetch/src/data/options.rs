use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use super::progress::Progress;
use crate::error::{Error, Result};

/// Chunk size used when none is configured: 8 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 8 * 1024 * 1024;

/// Nominal chunk size reported for transfers of unknown length: 64 KiB.
pub const UNKNOWN_SIZE_CHUNK_SIZE: u64 = 64 * 1024;

/// Callback receiving progress snapshots.
pub type ProgressCallback = Arc<dyn Fn(&Progress) + Send + Sync>;

/// Phases of a transfer.
///
/// Transfers move through these in order:
/// Connecting → Downloading → Completed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchPhase {
    /// Resolving metadata and opening the destination file.
    #[default]
    Connecting,

    /// Fetching body bytes and writing them to disk.
    Downloading,

    /// Every byte is on disk and the file has been synced.
    Completed,
}

impl fmt::Display for FetchPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchPhase::Connecting => write!(f, "Connecting"),
            FetchPhase::Downloading => write!(f, "Downloading"),
            FetchPhase::Completed => write!(f, "Completed"),
        }
    }
}

/// Bounded retry with a fixed pause between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,

    /// Pause between two consecutive attempts. Never grows.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }
}

/// Configuration for one transfer.
///
/// # Examples
///
/// ```
/// use grab_fetch::TransferConfig;
///
/// let config = TransferConfig::new("/tmp")
///     .chunk_size(4 * 1024 * 1024)
///     .concurrency(4)
///     .rate_limit(Some(30 * 1024 * 1024));
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct TransferConfig {
    /// Directory the file is written into. Must already exist.
    pub output_dir: PathBuf,

    /// Bytes per range request.
    ///
    /// Default: 8 MiB
    pub chunk_size: u64,

    /// Number of range requests in flight. `1` fetches chunks one after another.
    ///
    /// Default: 1
    pub concurrency: usize,

    /// Cap on body throughput in bytes per second, shared by all fetches.
    ///
    /// Default: None
    pub rate_limit: Option<u64>,

    /// Retry policy applied per chunk and to the whole-body fallback.
    pub retry: RetryPolicy,

    /// Treat anything but `206 Partial Content` as a failed range attempt.
    ///
    /// Default: true
    pub require_partial_content: bool,

    /// Progress callback invoked on phase changes and after every write.
    ///
    /// Default: None
    pub on_progress: Option<ProgressCallback>,
}

impl fmt::Debug for TransferConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferConfig")
            .field("output_dir", &self.output_dir)
            .field("chunk_size", &self.chunk_size)
            .field("concurrency", &self.concurrency)
            .field("rate_limit", &self.rate_limit)
            .field("retry", &self.retry)
            .field("require_partial_content", &self.require_partial_content)
            .field("on_progress", &"{ ... }")
            .finish()
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrency: 1,
            rate_limit: None,
            retry: RetryPolicy::default(),
            require_partial_content: true,
            on_progress: None,
        }
    }
}

impl TransferConfig {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Default::default()
        }
    }

    #[must_use]
    pub fn output_dir(mut self, output_dir: impl Into<PathBuf>) -> Self {
        self.output_dir = output_dir.into();
        self
    }

    /// Set the chunk size in bytes.
    #[must_use]
    pub fn chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Set the chunk size in mebibytes, as the command line takes it.
    #[must_use]
    pub fn chunk_size_mb(self, megabytes: u64) -> Self {
        self.chunk_size(megabytes.saturating_mul(1024 * 1024))
    }

    #[must_use]
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    #[must_use]
    pub fn rate_limit(mut self, bytes_per_second: Option<u64>) -> Self {
        self.rate_limit = bytes_per_second;
        self
    }

    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn require_partial_content(mut self, require: bool) -> Self {
        self.require_partial_content = require;
        self
    }

    /// Set the progress callback.
    ///
    /// # Examples
    ///
    /// ```
    /// use grab_fetch::{Progress, TransferConfig};
    /// use std::sync::Arc;
    ///
    /// let config = TransferConfig::default().on_progress(Arc::new(|p: &Progress| {
    ///     println!("{}: {} bytes", p.phase, p.bytes_downloaded);
    /// }));
    /// ```
    #[must_use]
    pub fn on_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk size must be positive".into()));
        }
        if self.concurrency == 0 {
            return Err(Error::InvalidConfig("concurrency must be positive".into()));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::InvalidConfig(
                "at least one attempt is required".into(),
            ));
        }
        if self.rate_limit == Some(0) {
            return Err(Error::InvalidConfig("rate limit must be positive".into()));
        }
        Ok(())
    }
}
