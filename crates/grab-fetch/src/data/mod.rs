//! Immutable data types shared by the planner, fetchers and sink.
//!
//! Nothing in here performs I/O. Values are created once and handed between
//! the pure [`core`](crate::core) functions and the [`effects`](crate::effects)
//! that talk to the network and the filesystem.

pub mod descriptor;
pub mod options;
pub mod progress;
pub mod range;
pub mod response;

pub use descriptor::TransferDescriptor;
pub use options::{
    DEFAULT_CHUNK_SIZE, FetchPhase, ProgressCallback, RetryPolicy, TransferConfig,
    UNKNOWN_SIZE_CHUNK_SIZE,
};
pub use progress::Progress;
pub use range::{ByteRange, Chunk, Plan};
pub use response::ResponseHead;
