use futures_util::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use super::http::HttpClient;
use super::sink::FileSink;
use super::throttle::TokenBucket;
use crate::data::RetryPolicy;
use crate::error::{Error, Result};

/// Stream the whole body into `sink` when byte ranges cannot be used.
///
/// Each attempt is a plain GET copied to the file from offset 0. A failed
/// attempt truncates the file before the next one, so a retried body never
/// lands behind stale bytes. `on_progress` receives the number of bytes
/// written by the current attempt and how many attempts have failed so far.
///
/// # Errors
///
/// Returns [`Error::StreamExhausted`] when no attempt wrote a single byte.
/// Filesystem failures while rewinding the sink are returned as they occur.
pub async fn stream_fallback<C: HttpClient>(
    client: &C,
    url: &str,
    sink: &FileSink,
    policy: &RetryPolicy,
    limiter: Option<&TokenBucket>,
    on_progress: &(dyn Fn(u64, u32) + Send + Sync),
) -> Result<u64> {
    let attempts = policy.max_attempts.max(1);
    let mut failed = 0u32;

    for attempt in 1..=attempts {
        if attempt > 1 {
            sink.reset().await?;
            on_progress(0, failed);
        }

        let report = move |written: u64| on_progress(written, failed);
        match stream_once(client, url, sink, limiter, &report).await {
            Ok(written) if written > 0 => {
                info!(bytes = written, attempt, "streamed whole body");
                return Ok(written);
            }
            Ok(_) => warn!(attempt, "stream produced no bytes"),
            Err(e) => warn!(attempt, error = %e, "stream attempt failed"),
        }
        failed += 1;

        if attempt < attempts {
            sleep(policy.delay).await;
        }
    }

    error!(attempts, "giving up on streamed download");
    Err(Error::StreamExhausted { attempts })
}

async fn stream_once<C: HttpClient>(
    client: &C,
    url: &str,
    sink: &FileSink,
    limiter: Option<&TokenBucket>,
    on_progress: &(dyn Fn(u64) + Send + Sync),
) -> Result<u64> {
    let response = client
        .get(url, &[])
        .await
        .map_err(|e| Error::Request(e.to_string()))?;
    if response.head.is_error() {
        return Err(Error::Server {
            status: response.head.status,
        });
    }

    let mut body = response.body;
    let mut written = 0u64;
    while let Some(piece) = body.next().await {
        let piece = piece.map_err(|e| Error::BodyRead(e.to_string()))?;
        if piece.is_empty() {
            continue;
        }
        if let Some(limiter) = limiter {
            limiter.acquire(piece.len() as u64).await;
        }

        sink.write_at(written, &piece).await?;
        written += piece.len() as u64;
        on_progress(written);
    }

    if written > 0 {
        sink.verify().await?;
    }
    debug!(bytes = written, "stream attempt finished");
    Ok(written)
}
