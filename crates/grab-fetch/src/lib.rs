//! Chunked HTTP downloads with bounded retry and positioned writes.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration and types
//! - [`core`] - Pure transformations
//! - [`effects`] - I/O operations with trait abstraction
//!
//! # Flow
//!
//! [`resolve`] reads size, name and range support from a HEAD reply. When the
//! server accepts byte ranges and reports a size, [`plan`](crate::core::plan) splits
//! the file into ranges, each fetched by a [`ChunkFetcher`] and written at its
//! offset by the [`FileSink`]. Otherwise [`stream_fallback`] copies the whole
//! body. [`Downloader`] ties the steps together.
//!
//! # Example
//!
//! ```no_run
//! use grab_fetch::{Downloader, ReqwestClient, TransferConfig};
//!
//! # async fn run() -> grab_fetch::Result<()> {
//! let config = TransferConfig::new("/tmp").concurrency(4);
//! let report = Downloader::new(ReqwestClient::new()?, config)
//!     .download("https://example.com/archive.zip")
//!     .await?;
//! println!("saved {}", report.path.display());
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use data::{
    ByteRange, Chunk, FetchPhase, Plan, Progress, ProgressCallback, ResponseHead, RetryPolicy,
    TransferConfig, TransferDescriptor,
};
pub use effects::{
    BoxStream, ChunkFetcher, Downloader, FileSink, HttpClient, MockError, MockHttpClient,
    RecordedRequest, Response, TokenBucket, TransferMode, TransferReport, resolve,
    stream_fallback,
};
pub use error::{Error, Result};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;
