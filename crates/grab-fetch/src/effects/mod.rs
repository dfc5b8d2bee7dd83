//! Network and filesystem effects.
//!
//! Every type here touches the outside world through either the
//! [`HttpClient`] trait or the destination file, and is driven by the pure
//! functions in [`core`](crate::core).

mod downloader;
mod fallback;
mod fetcher;
mod http;
mod mock;
mod resolver;
mod sink;
mod throttle;

pub use downloader::{Downloader, TransferMode, TransferReport};
pub use fallback::stream_fallback;
pub use fetcher::ChunkFetcher;
pub use http::{BoxStream, HttpClient, Response};
pub use mock::{MockError, MockHttpClient, RecordedRequest};
pub use resolver::resolve;
pub use sink::FileSink;
pub use throttle::TokenBucket;

#[cfg(feature = "reqwest")]
pub use http::ReqwestClient;
