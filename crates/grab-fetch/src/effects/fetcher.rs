use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, warn};

use super::http::{BoxStream, HttpClient};
use super::throttle::TokenBucket;
use crate::data::{ByteRange, Chunk, RetryPolicy};
use crate::error::{Error, Result};

const MAX_PREALLOC: u64 = 64 * 1024 * 1024;

/// Fetches single byte ranges with bounded retry.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use grab_fetch::{ByteRange, ChunkFetcher, MockHttpClient};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let client = Arc::new(MockHttpClient::new(&b"0123456789"[..]));
/// let fetcher = ChunkFetcher::new(client);
///
/// let range = ByteRange { index: 0, start: 2, end: 4 };
/// let chunk = fetcher.fetch("http://example.com/f", range).await.unwrap();
/// assert_eq!(chunk.payload.as_deref(), Some(&b"234"[..]));
/// # }
/// ```
#[derive(Debug)]
pub struct ChunkFetcher<C> {
    client: Arc<C>,
    retry: RetryPolicy,
    require_partial_content: bool,
    limiter: Option<Arc<TokenBucket>>,
    failures: AtomicU32,
}

impl<C: HttpClient> ChunkFetcher<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self {
            client,
            retry: RetryPolicy::default(),
            require_partial_content: true,
            limiter: None,
            failures: AtomicU32::new(0),
        }
    }

    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// When set, a reply other than `206` is a failed attempt and the payload
    /// length must match the range.
    #[must_use]
    pub fn require_partial_content(mut self, require: bool) -> Self {
        self.require_partial_content = require;
        self
    }

    #[must_use]
    pub fn limiter(mut self, limiter: Option<Arc<TokenBucket>>) -> Self {
        self.limiter = limiter;
        self
    }

    /// Failed attempts seen by this fetcher across all ranges.
    pub fn failures(&self) -> u32 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Fetch `range`, retrying errors and empty payloads.
    ///
    /// Attempts are separated by the policy's fixed delay; there is no pause
    /// after the last one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RetriesExhausted`] when no attempt produced a payload.
    pub async fn fetch(&self, url: &str, range: ByteRange) -> Result<Chunk> {
        let attempts = self.retry.max_attempts.max(1);
        let mut reason = String::new();

        for attempt in 1..=attempts {
            match self.fetch_once(url, range).await {
                Ok(chunk) if !chunk.is_empty() => {
                    debug!(
                        index = range.index,
                        start = range.start,
                        end = range.end,
                        attempt,
                        "chunk fetched"
                    );
                    return Ok(chunk);
                }
                Ok(_) => {
                    warn!(index = range.index, attempt, "chunk arrived empty");
                    reason = "empty payload".to_string();
                }
                Err(e) => {
                    warn!(index = range.index, attempt, error = %e, "chunk fetch failed");
                    reason = e.to_string();
                }
            }

            self.failures.fetch_add(1, Ordering::Relaxed);
            if attempt < attempts {
                sleep(self.retry.delay).await;
            }
        }

        error!(index = range.index, attempts, %reason, "giving up on chunk");
        Err(Error::RetriesExhausted {
            index: range.index,
            attempts,
            reason,
        })
    }

    /// A single ranged GET without retry.
    ///
    /// An empty payload is returned as a chunk without bytes rather than an
    /// error so the caller can decide whether to retry.
    pub async fn fetch_once(&self, url: &str, range: ByteRange) -> Result<Chunk> {
        let headers = [("Range".to_string(), range.header_value())];
        let response = self
            .client
            .get(url, &headers)
            .await
            .map_err(|e| Error::Request(e.to_string()))?;

        let status = response.head.status;
        if response.head.is_error() {
            return Err(Error::Server { status });
        }
        if self.require_partial_content && status != 206 {
            return Err(Error::RangeNotHonored { status });
        }

        let payload = collect_body(response.body, range.size(), self.limiter.as_deref()).await?;
        if self.require_partial_content
            && !payload.is_empty()
            && payload.len() as u64 != range.size()
        {
            return Err(Error::BodyRead(format!(
                "range {range} returned {} bytes, expected {}",
                payload.len(),
                range.size()
            )));
        }

        Ok(Chunk::new(range).with_payload(payload))
    }
}

async fn collect_body<E: std::error::Error + Send>(
    mut body: BoxStream<'static, std::result::Result<Bytes, E>>,
    expected: u64,
    limiter: Option<&TokenBucket>,
) -> Result<Bytes> {
    let mut buf = BytesMut::with_capacity(expected.min(MAX_PREALLOC) as usize);

    while let Some(piece) = body.next().await {
        let piece = piece.map_err(|e| Error::BodyRead(e.to_string()))?;
        if let Some(limiter) = limiter {
            limiter.acquire(piece.len() as u64).await;
        }
        buf.extend_from_slice(&piece);
    }

    Ok(buf.freeze())
}
