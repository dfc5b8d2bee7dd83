//! Pure transformations for chunked transfers.
//!
//! Everything here is deterministic and free of I/O: range planning, header
//! interpretation and the small lookup tables the resolver relies on.

mod filename;
mod metadata;
mod mime;
mod plan;
mod rate;

pub use filename::{
    parse_disposition_filename, resolve_file_name, sanitize_file_name, split_last_dot,
};
pub use metadata::describe;
pub use mime::extension_for_mime;
pub use plan::{effective_chunk_size, plan, range_header};
pub use rate::parse_rate_limit;
