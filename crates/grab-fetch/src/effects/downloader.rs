use std::path::PathBuf;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use grab_pool::{Task, WorkerPool};
use tracing::{debug, error, info};

use super::fallback::stream_fallback;
use super::fetcher::ChunkFetcher;
use super::http::HttpClient;
use super::resolver::resolve;
use super::sink::FileSink;
use super::throttle::TokenBucket;
use crate::core::{effective_chunk_size, plan};
use crate::data::{
    ByteRange, FetchPhase, Plan, Progress, ProgressCallback, TransferConfig, TransferDescriptor,
};
use crate::error::{Error, Result};

/// How the body reached the disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    /// Byte ranges fetched independently and written at their offsets.
    Chunked { chunks: usize },
    /// One plain GET streamed from offset 0.
    Streamed,
}

/// Outcome of a finished transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub path: PathBuf,
    pub bytes_written: u64,
    pub mode: TransferMode,
    pub descriptor: TransferDescriptor,
}

/// Fans progress out to the configured callback.
struct Reporter {
    callback: Option<ProgressCallback>,
    total: Option<u64>,
    downloaded: AtomicU64,
    retries: AtomicU32,
}

impl Reporter {
    fn new(callback: Option<ProgressCallback>, total: Option<u64>) -> Self {
        Self {
            callback,
            total,
            downloaded: AtomicU64::new(0),
            retries: AtomicU32::new(0),
        }
    }

    fn emit(&self, phase: FetchPhase, bytes_downloaded: u64, retry_count: u32) {
        if let Some(callback) = &self.callback {
            callback(&Progress {
                phase,
                bytes_downloaded,
                total_bytes: self.total,
                retry_count,
            });
        }
    }

    fn advance(&self, bytes: u64, retry_count: u32) {
        let now = self.downloaded.fetch_add(bytes, Ordering::AcqRel) + bytes;
        self.set_retries(retry_count);
        self.emit(FetchPhase::Downloading, now, retry_count);
    }

    fn set(&self, bytes: u64, retry_count: u32) {
        self.downloaded.store(bytes, Ordering::Release);
        self.set_retries(retry_count);
        self.emit(FetchPhase::Downloading, bytes, retry_count);
    }

    fn set_retries(&self, retry_count: u32) {
        self.retries.fetch_max(retry_count, Ordering::AcqRel);
    }

    /// Failed attempts reported so far, chunked or streamed.
    fn retries(&self) -> u32 {
        self.retries.load(Ordering::Acquire)
    }
}

/// Keeps the first error raised by any chunk task.
#[derive(Default)]
struct FirstFailure(Mutex<Option<Error>>);

impl FirstFailure {
    fn record(&self, err: Error) {
        let mut slot = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    fn is_set(&self) -> bool {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    fn take(&self) -> Option<Error> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

/// Downloads one URL into the configured directory.
///
/// Resolves metadata, then either fetches planned byte ranges (one after
/// another, or through a [`WorkerPool`] when `concurrency > 1`) or falls back
/// to streaming the body when ranges are unsupported or the size is unknown.
///
/// # Examples
///
/// ```
/// use grab_fetch::{Downloader, MockHttpClient, TransferConfig, TransferMode};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let dir = tempfile::tempdir().unwrap();
/// let client = MockHttpClient::new(vec![7u8; 1000]);
/// let config = TransferConfig::new(dir.path()).chunk_size(400);
///
/// let report = Downloader::new(client, config)
///     .download("http://example.com/file")
///     .await
///     .unwrap();
/// assert_eq!(report.bytes_written, 1000);
/// assert_eq!(report.mode, TransferMode::Chunked { chunks: 3 });
/// # }
/// ```
#[derive(Debug)]
pub struct Downloader<C> {
    client: Arc<C>,
    config: TransferConfig,
}

impl<C: HttpClient + 'static> Downloader<C> {
    pub fn new(client: C, config: TransferConfig) -> Self {
        Self::with_shared_client(Arc::new(client), config)
    }

    pub fn with_shared_client(client: Arc<C>, config: TransferConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Download `url` and return where it landed.
    ///
    /// # Errors
    ///
    /// Any resolver, fetch or filesystem error aborts the transfer. Bytes
    /// already written stay on disk.
    pub async fn download(&self, url: &str) -> Result<TransferReport> {
        self.config.validate()?;

        if let Some(callback) = &self.config.on_progress {
            callback(&Progress::default());
        }

        let descriptor = resolve(&*self.client, url).await?;
        let sink = Arc::new(FileSink::create(&self.config.output_dir, &descriptor).await?);
        let limiter = self
            .config
            .rate_limit
            .map(TokenBucket::new)
            .transpose()?
            .map(Arc::new);

        let total = descriptor.size_known().then_some(descriptor.total_size);
        let reporter = Arc::new(Reporter::new(self.config.on_progress.clone(), total));

        let layout = if descriptor.supports_ranges {
            plan(descriptor.total_size, self.config.chunk_size)?
        } else {
            Plan::Unbounded
        };

        info!(
            url,
            path = %sink.path().display(),
            chunk_size = effective_chunk_size(descriptor.total_size, self.config.chunk_size),
            concurrency = self.config.concurrency,
            "starting download"
        );

        let mode = match layout {
            Plan::Ranges(ranges) => {
                let chunks = ranges.len();
                let fetcher = Arc::new(
                    ChunkFetcher::new(Arc::clone(&self.client))
                        .retry(self.config.retry)
                        .require_partial_content(self.config.require_partial_content)
                        .limiter(limiter),
                );
                self.fetch_ranges(url, ranges, &fetcher, &sink, &reporter)
                    .await?;
                reporter.set_retries(fetcher.failures());
                TransferMode::Chunked { chunks }
            }
            Plan::Unbounded => {
                debug!("routing to streamed fallback");
                let progress = |bytes: u64, failed: u32| reporter.set(bytes, failed);
                stream_fallback(
                    &*self.client,
                    url,
                    &sink,
                    &self.config.retry,
                    limiter.as_deref(),
                    &progress,
                )
                .await?;
                TransferMode::Streamed
            }
        };

        let bytes_written = sink.finish().await?;
        reporter.emit(FetchPhase::Completed, bytes_written, reporter.retries());
        info!(bytes = bytes_written, path = %sink.path().display(), "download complete");

        Ok(TransferReport {
            path: sink.path().to_path_buf(),
            bytes_written,
            mode,
            descriptor,
        })
    }

    async fn fetch_ranges(
        &self,
        url: &str,
        ranges: Vec<ByteRange>,
        fetcher: &Arc<ChunkFetcher<C>>,
        sink: &Arc<FileSink>,
        reporter: &Arc<Reporter>,
    ) -> Result<()> {
        if self.config.concurrency == 1 {
            for range in ranges {
                let chunk = fetcher.fetch(url, range).await?;
                let len = chunk.payload_len();
                sink.write_chunk(chunk).await?;
                reporter.advance(len, fetcher.failures());
            }
            return Ok(());
        }

        let pool = WorkerPool::new(self.config.concurrency)
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        let failure = Arc::new(FirstFailure::default());
        let url: Arc<str> = Arc::from(url);

        let tasks = ranges
            .into_iter()
            .map(|range| {
                let url = Arc::clone(&url);
                let fetcher = Arc::clone(fetcher);
                let sink = Arc::clone(sink);
                let reporter = Arc::clone(reporter);
                let failure = Arc::clone(&failure);

                Task::new(range.index as usize, async move {
                    if failure.is_set() {
                        debug!(index = range.index, "skipping chunk after earlier failure");
                        return;
                    }

                    let written = async {
                        let chunk = fetcher.fetch(&url, range).await?;
                        let len = chunk.payload_len();
                        sink.write_chunk(chunk).await?;
                        Ok::<_, Error>(len)
                    }
                    .await;

                    match written {
                        Ok(len) => reporter.advance(len, fetcher.failures()),
                        Err(e) => {
                            error!(index = range.index, error = %e, "chunk task failed");
                            failure.record(e);
                        }
                    }
                })
            })
            .collect();

        pool.run(tasks).await;

        match failure.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_failure_keeps_first() {
        let failure = FirstFailure::default();
        assert!(!failure.is_set());

        failure.record(Error::Server { status: 500 });
        failure.record(Error::Server { status: 404 });

        assert!(failure.is_set());
        assert!(matches!(failure.take(), Some(Error::Server { status: 500 })));
        assert!(failure.take().is_none());
    }

    #[test]
    fn test_reporter_accumulates() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        let callback: ProgressCallback = Arc::new(move |p: &Progress| {
            log.lock().unwrap().push(p.bytes_downloaded);
        });

        let reporter = Reporter::new(Some(callback), Some(10));
        reporter.advance(4, 0);
        reporter.advance(6, 1);
        reporter.set(3, 2);

        assert_eq!(*seen.lock().unwrap(), vec![4, 10, 3]);
        assert_eq!(reporter.retries(), 2);
    }
}
