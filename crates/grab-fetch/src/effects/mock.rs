//! In-memory HTTP server for exercising the engine without a network.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use bytes::Bytes;
use futures_util::stream;

use super::http::{HttpClient, Response};
use crate::data::ResponseHead;

/// Transport failure injected by [`MockHttpClient`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("mock transport error: {0}")]
pub struct MockError(pub String);

/// A request observed by [`MockHttpClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub range: Option<String>,
}

#[derive(Debug, Default)]
struct MockState {
    range_failures: HashMap<u64, u32>,
    empty_ranges: HashMap<u64, u32>,
    stream_failures: u32,
    requests: Vec<RecordedRequest>,
}

/// Serves one in-memory file the way a simple HTTP server would.
///
/// HEAD and GET replies carry `Content-Length` and `Accept-Ranges: bytes` by
/// default. Range requests get `206` with the requested slice. Faults can be
/// injected per range start or for whole-body GETs, and every request is
/// recorded for later inspection.
///
/// # Examples
///
/// ```
/// use grab_fetch::MockHttpClient;
///
/// let client = MockHttpClient::new(&b"hello world"[..])
///     .with_header("Content-Type", "text/plain")
///     .fail_range(0, 2);
/// assert!(client.requests().is_empty());
/// ```
#[derive(Debug)]
pub struct MockHttpClient {
    data: Bytes,
    headers: Vec<(String, String)>,
    head_status: u16,
    get_status: u16,
    head_fails: bool,
    get_fails: bool,
    ignore_range: bool,
    piece_size: usize,
    state: Mutex<MockState>,
}

impl MockHttpClient {
    pub fn new(data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            headers: vec![
                ("Content-Length".to_string(), data.len().to_string()),
                ("Accept-Ranges".to_string(), "bytes".to_string()),
            ],
            data,
            head_status: 200,
            get_status: 200,
            head_fails: false,
            get_fails: false,
            ignore_range: false,
            piece_size: 16,
            state: Mutex::new(MockState::default()),
        }
    }

    /// Set a header, replacing any existing value of the same name.
    #[must_use]
    pub fn with_header(self, name: &str, value: impl Into<String>) -> Self {
        let mut this = self.without_header(name);
        this.headers.push((name.to_string(), value.into()));
        this
    }

    #[must_use]
    pub fn without_header(mut self, name: &str) -> Self {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self
    }

    /// Make every HEAD request fail at the transport level.
    #[must_use]
    pub fn head_fails(mut self) -> Self {
        self.head_fails = true;
        self
    }

    /// Make every GET request fail at the transport level.
    #[must_use]
    pub fn get_fails(mut self) -> Self {
        self.get_fails = true;
        self
    }

    #[must_use]
    pub fn head_status(mut self, status: u16) -> Self {
        self.head_status = status;
        self
    }

    /// Status for every GET. Error statuses come with an empty body.
    #[must_use]
    pub fn get_status(mut self, status: u16) -> Self {
        self.get_status = status;
        self
    }

    /// Answer range requests with the whole body and status 200.
    #[must_use]
    pub fn ignore_range(mut self) -> Self {
        self.ignore_range = true;
        self
    }

    /// Size of the pieces the body stream is cut into.
    #[must_use]
    pub fn piece_size(mut self, piece_size: usize) -> Self {
        self.piece_size = piece_size.max(1);
        self
    }

    /// Fail the first `times` range requests starting at `start`.
    #[must_use]
    pub fn fail_range(self, start: u64, times: u32) -> Self {
        self.lock().range_failures.insert(start, times);
        self
    }

    /// Answer the first `times` range requests starting at `start` with an empty body.
    #[must_use]
    pub fn empty_range(self, start: u64, times: u32) -> Self {
        self.lock().empty_ranges.insert(start, times);
        self
    }

    /// Break the body of the first `times` whole-body GETs halfway through.
    #[must_use]
    pub fn fail_stream(self, times: u32) -> Self {
        self.lock().stream_failures = times;
        self
    }

    /// Requests received so far, in arrival order.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.lock().requests.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn head_for(&self, status: u16) -> ResponseHead {
        ResponseHead {
            status,
            headers: self.headers.clone(),
        }
    }

    fn body(&self, data: Bytes, fault: Option<MockError>) -> Response<MockError> {
        let mut pieces: Vec<Result<Bytes, MockError>> = data
            .chunks(self.piece_size)
            .map(|piece| Ok(data.slice_ref(piece)))
            .collect();
        if let Some(err) = fault {
            pieces.push(Err(err));
        }
        Response {
            head: ResponseHead::default(),
            body: Box::pin(stream::iter(pieces)),
        }
    }

    fn serve_range(&self, value: &str) -> Result<Response<MockError>, MockError> {
        let (start, end) = parse_range(value)
            .ok_or_else(|| MockError(format!("malformed range header '{value}'")))?;
        let len = self.data.len() as u64;

        {
            let mut state = self.lock();
            if let Some(left) = state.range_failures.get_mut(&start).filter(|n| **n > 0) {
                *left -= 1;
                return Err(MockError(format!("connection reset at {start}")));
            }
            if let Some(left) = state.empty_ranges.get_mut(&start).filter(|n| **n > 0) {
                *left -= 1;
                let mut response = self.body(Bytes::new(), None);
                response.head = self.head_for(206);
                return Ok(response);
            }
        }

        if start >= len {
            let mut response = self.body(Bytes::new(), None);
            response.head = self.head_for(416);
            return Ok(response);
        }

        let end = end.min(len - 1);
        let slice = self.data.slice(start as usize..=end as usize);
        let mut response = self.body(slice.clone(), None);
        response.head = self
            .head_for(206)
            .with_header("Content-Range", format!("bytes {start}-{end}/{len}"));
        if let Some(entry) = response
            .head
            .headers
            .iter_mut()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        {
            entry.1 = slice.len().to_string();
        }
        Ok(response)
    }

    fn serve_whole(&self) -> Response<MockError> {
        let fault = {
            let mut state = self.lock();
            (state.stream_failures > 0).then(|| {
                state.stream_failures -= 1;
                MockError("connection reset mid-body".into())
            })
        };

        let data = match fault {
            Some(_) => self.data.slice(..self.data.len() / 2),
            None => self.data.clone(),
        };
        let mut response = self.body(data, fault);
        response.head = self.head_for(self.get_status);
        response
    }
}

fn parse_range(value: &str) -> Option<(u64, u64)> {
    let (start, end) = value.strip_prefix("bytes=")?.split_once('-')?;
    Some((start.trim().parse().ok()?, end.trim().parse().ok()?))
}

impl HttpClient for MockHttpClient {
    type Error = MockError;

    async fn head(&self, _url: &str) -> Result<ResponseHead, Self::Error> {
        self.lock().requests.push(RecordedRequest {
            method: "HEAD",
            range: None,
        });
        if self.head_fails {
            return Err(MockError("HEAD refused".into()));
        }
        Ok(self.head_for(self.head_status))
    }

    async fn get(
        &self,
        _url: &str,
        headers: &[(String, String)],
    ) -> Result<Response<Self::Error>, Self::Error> {
        let range = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("range"))
            .map(|(_, v)| v.clone());
        self.lock().requests.push(RecordedRequest {
            method: "GET",
            range: range.clone(),
        });

        if self.get_fails {
            return Err(MockError("GET refused".into()));
        }
        if self.get_status >= 400 {
            let mut response = self.body(Bytes::new(), None);
            response.head = self.head_for(self.get_status);
            return Ok(response);
        }

        match range {
            Some(value) if !self.ignore_range => self.serve_range(&value),
            _ => Ok(self.serve_whole()),
        }
    }
}
