//! Error types for grab-fetch.

use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("request failed: {0}")]
    Request(String),

    #[error("server responded with status {status}")]
    Server { status: u16 },

    #[error("failed to read response body: {0}")]
    BodyRead(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("file I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("range request answered with status {status} instead of 206")]
    RangeNotHonored { status: u16 },

    #[error("chunk {index} has no payload to write")]
    EmptyChunk { index: u64 },

    #[error("chunk {index} is still empty after {attempts} attempts: {reason}")]
    RetriesExhausted {
        index: u64,
        attempts: u32,
        reason: String,
    },

    #[error("no bytes were written after {attempts} attempts")]
    StreamExhausted { attempts: u32 },
}

pub type Result<T> = std::result::Result<T, Error>;
