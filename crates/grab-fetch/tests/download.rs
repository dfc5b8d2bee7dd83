//! End-to-end transfers against in-memory servers.
//!
//! Each test downloads into a fresh temporary directory and checks the bytes
//! on disk, the requests the server saw, and the error surfaced to callers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use grab_fetch::{
    Downloader, Error, FetchPhase, HttpClient, MockError, MockHttpClient, Progress, Response,
    ResponseHead, RetryPolicy, TransferConfig, TransferMode,
};

const URL: &str = "http://example.com/files/archive";

fn body(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

fn config(dir: &tempfile::TempDir) -> TransferConfig {
    TransferConfig::new(dir.path()).retry(RetryPolicy::new(3, Duration::from_millis(5)))
}

/// Wraps the mock server and records how many GETs overlap.
struct SlowClient {
    inner: MockHttpClient,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl SlowClient {
    fn new(inner: MockHttpClient) -> Self {
        Self {
            inner,
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }
}

impl HttpClient for SlowClient {
    type Error = MockError;

    async fn head(&self, url: &str) -> Result<ResponseHead, Self::Error> {
        self.inner.head(url).await
    }

    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<Response<Self::Error>, Self::Error> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let response = self.inner.get(url, headers).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        response
    }
}

#[tokio::test]
async fn test_sequential_chunks_are_byte_exact() {
    let dir = tempfile::tempdir().unwrap();
    let data = body(1000);
    let client = Arc::new(
        MockHttpClient::new(data.clone())
            .with_header("Content-Disposition", r#"attachment; filename="report.final.csv""#),
    );

    let report = Downloader::with_shared_client(Arc::clone(&client), config(&dir).chunk_size(400))
        .download(URL)
        .await
        .unwrap();

    assert_eq!(report.path, dir.path().join("report.final.csv"));
    assert_eq!(report.mode, TransferMode::Chunked { chunks: 3 });
    assert_eq!(report.bytes_written, 1000);
    assert_eq!(std::fs::read(&report.path).unwrap(), data);

    let ranges: Vec<_> = client
        .requests()
        .into_iter()
        .filter_map(|r| r.range)
        .collect();
    assert_eq!(ranges, ["bytes=0-399", "bytes=400-799", "bytes=800-999"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_chunks_are_byte_exact_and_bounded() {
    let dir = tempfile::tempdir().unwrap();
    let data = body(10_000);
    let client = Arc::new(SlowClient::new(MockHttpClient::new(data.clone()).piece_size(97)));

    let report = Downloader::with_shared_client(
        Arc::clone(&client),
        config(&dir).chunk_size(700).concurrency(3),
    )
    .download(URL)
    .await
    .unwrap();

    assert_eq!(report.mode, TransferMode::Chunked { chunks: 15 });
    assert_eq!(std::fs::read(&report.path).unwrap(), data);

    let peak = client.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak concurrency was {peak}");
    assert!(peak >= 2, "chunks never overlapped");
}

#[tokio::test]
async fn test_ranges_unsupported_uses_stream_without_range_header() {
    let dir = tempfile::tempdir().unwrap();
    let data = body(3000);
    let client = Arc::new(
        MockHttpClient::new(data.clone())
            .with_header("Accept-Ranges", "none")
            .with_header("Content-Type", "image/png"),
    );

    let report = Downloader::with_shared_client(Arc::clone(&client), config(&dir).chunk_size(400))
        .download(URL)
        .await
        .unwrap();

    assert_eq!(report.mode, TransferMode::Streamed);
    assert_eq!(report.path, dir.path().join("download.png"));
    assert_eq!(std::fs::read(&report.path).unwrap(), data);
    assert!(client.requests().iter().all(|r| r.range.is_none()));
}

#[tokio::test]
async fn test_unknown_size_uses_stream() {
    let dir = tempfile::tempdir().unwrap();
    let data = body(777);
    let client = Arc::new(MockHttpClient::new(data.clone()).without_header("Content-Length"));

    let report = Downloader::with_shared_client(Arc::clone(&client), config(&dir))
        .download(URL)
        .await
        .unwrap();

    assert_eq!(report.mode, TransferMode::Streamed);
    assert_eq!(report.descriptor.total_size, 0);
    assert_eq!(report.bytes_written, 777);
    assert!(client.requests().iter().all(|r| r.range.is_none()));
}

#[tokio::test]
async fn test_flaky_chunk_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let data = body(1000);
    let client = MockHttpClient::new(data.clone()).fail_range(400, 2);

    let report = Downloader::new(client, config(&dir).chunk_size(400))
        .download(URL)
        .await
        .unwrap();

    assert_eq!(std::fs::read(&report.path).unwrap(), data);
}

#[tokio::test]
async fn test_exhausted_chunk_aborts_and_keeps_partial_file() {
    let dir = tempfile::tempdir().unwrap();
    let data = body(1000);
    let client = Arc::new(MockHttpClient::new(data.clone()).fail_range(800, 3));

    let err = Downloader::with_shared_client(Arc::clone(&client), config(&dir).chunk_size(400))
        .download(URL)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::RetriesExhausted {
            index: 2,
            attempts: 3,
            ..
        }
    ));

    let partial = std::fs::read(dir.path().join("download.bin")).unwrap();
    assert_eq!(partial, &data[..800]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_concurrent_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let client = MockHttpClient::new(body(4000)).fail_range(0, 3);

    let err = Downloader::new(client, config(&dir).chunk_size(500).concurrency(2))
        .download(URL)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RetriesExhausted { index: 0, .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_queued_chunks_skip_after_failure() {
    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(SlowClient::new(MockHttpClient::new(body(10_000)).fail_range(0, 3)));

    let err = Downloader::with_shared_client(
        Arc::clone(&client),
        config(&dir).chunk_size(500).concurrency(2),
    )
    .download(URL)
    .await
    .unwrap_err();

    assert!(matches!(err, Error::RetriesExhausted { index: 0, .. }));

    let range_gets = client
        .inner
        .requests()
        .iter()
        .filter(|r| r.range.is_some())
        .count();
    // 20 chunks planned; chunk 0 uses 3 attempts while the other worker
    // drains a handful before the failure is recorded.
    assert!(range_gets < 14, "{range_gets} range requests were sent");
}

#[tokio::test]
async fn test_ignored_range_fails_when_strict() {
    let dir = tempfile::tempdir().unwrap();
    let client = MockHttpClient::new(body(1000)).ignore_range();

    let err = Downloader::new(client, config(&dir).chunk_size(400))
        .download(URL)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::RetriesExhausted { index: 0, .. }));
}

#[tokio::test]
async fn test_ignored_range_accepted_for_single_chunk_when_lenient() {
    let dir = tempfile::tempdir().unwrap();
    let data = body(1000);
    let client = MockHttpClient::new(data.clone()).ignore_range();

    let report = Downloader::new(
        client,
        config(&dir).chunk_size(4096).require_partial_content(false),
    )
    .download(URL)
    .await
    .unwrap();

    assert_eq!(report.mode, TransferMode::Chunked { chunks: 1 });
    assert_eq!(std::fs::read(&report.path).unwrap(), data);
}

#[tokio::test]
async fn test_head_failure_falls_back_to_get() {
    let dir = tempfile::tempdir().unwrap();
    let data = body(900);
    let client = Arc::new(MockHttpClient::new(data.clone()).head_fails());

    let report = Downloader::with_shared_client(Arc::clone(&client), config(&dir).chunk_size(300))
        .download(URL)
        .await
        .unwrap();

    assert_eq!(std::fs::read(&report.path).unwrap(), data);
    let requests = client.requests();
    assert_eq!(requests[0].method, "HEAD");
    assert_eq!(requests[1].method, "GET");
    assert_eq!(requests[1].range, None);
}

#[tokio::test]
async fn test_not_found_is_server_error() {
    let dir = tempfile::tempdir().unwrap();
    let client = MockHttpClient::new(body(10)).head_status(404);

    let err = Downloader::new(client, config(&dir))
        .download(URL)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Server { status: 404 }));
    assert!(!dir.path().join("download.bin").exists());
}

#[tokio::test]
async fn test_stream_retry_does_not_duplicate_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let data = body(2048);
    let client = MockHttpClient::new(data.clone())
        .with_header("Accept-Ranges", "none")
        .fail_stream(2);

    let report = Downloader::new(client, config(&dir))
        .download(URL)
        .await
        .unwrap();

    assert_eq!(report.bytes_written, 2048);
    assert_eq!(std::fs::read(&report.path).unwrap(), data);
}

#[tokio::test]
async fn test_stream_retries_reach_completed_progress() {
    let dir = tempfile::tempdir().unwrap();
    let last: Arc<Mutex<Option<Progress>>> = Arc::default();
    let slot = Arc::clone(&last);
    let client = MockHttpClient::new(body(512))
        .with_header("Accept-Ranges", "none")
        .fail_stream(2);

    let config = config(&dir).on_progress(Arc::new(move |p: &Progress| {
        *slot.lock().unwrap() = Some(p.clone());
    }));
    let report = Downloader::new(client, config)
        .download(URL)
        .await
        .unwrap();

    assert_eq!(report.mode, TransferMode::Streamed);
    let last = last.lock().unwrap().clone().unwrap();
    assert_eq!(last.phase, FetchPhase::Completed);
    assert_eq!(last.bytes_downloaded, 512);
    assert_eq!(last.retry_count, 2);
}

#[tokio::test]
async fn test_stream_exhausted_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let client = MockHttpClient::new(body(64))
        .with_header("Accept-Ranges", "none")
        .fail_stream(3);

    let err = Downloader::new(client, config(&dir))
        .download(URL)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::StreamExhausted { attempts: 3 }));
}

#[tokio::test]
async fn test_missing_output_dir() {
    let dir = tempfile::tempdir().unwrap();
    let config = TransferConfig::new(dir.path().join("missing"));

    let err = Downloader::new(MockHttpClient::new(body(10)), config)
        .download(URL)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[tokio::test]
async fn test_invalid_config_sends_no_requests() {
    let dir = tempfile::tempdir().unwrap();
    let client = Arc::new(MockHttpClient::new(body(10)));

    let err = Downloader::with_shared_client(Arc::clone(&client), config(&dir).chunk_size(0))
        .download(URL)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::InvalidConfig(_)));
    assert!(client.requests().is_empty());
}

#[tokio::test]
async fn test_progress_reaches_completed() {
    let dir = tempfile::tempdir().unwrap();
    let seen: Arc<Mutex<Vec<Progress>>> = Arc::default();
    let log = Arc::clone(&seen);

    let config = config(&dir)
        .chunk_size(250)
        .on_progress(Arc::new(move |p: &Progress| log.lock().unwrap().push(p.clone())));

    Downloader::new(MockHttpClient::new(body(1000)).fail_range(250, 1), config)
        .download(URL)
        .await
        .unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen.first().map(|p| p.phase), Some(FetchPhase::Connecting));

    let last = seen.last().unwrap();
    assert_eq!(last.phase, FetchPhase::Completed);
    assert_eq!(last.bytes_downloaded, 1000);
    assert_eq!(last.total_bytes, Some(1000));
    assert_eq!(last.retry_count, 1);

    let downloading: Vec<_> = seen
        .iter()
        .filter(|p| p.phase == FetchPhase::Downloading)
        .map(|p| p.bytes_downloaded)
        .collect();
    assert_eq!(downloading, [250, 500, 750, 1000]);
}

#[tokio::test]
async fn test_existing_file_is_truncated() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("download.bin"), vec![0xAA; 5000]).unwrap();
    let data = body(100);

    let report = Downloader::new(MockHttpClient::new(data.clone()), config(&dir))
        .download(URL)
        .await
        .unwrap();

    assert_eq!(std::fs::read(&report.path).unwrap(), data);
}
