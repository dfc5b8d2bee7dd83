use super::filename::resolve_file_name;
use crate::data::{ResponseHead, TransferDescriptor};

/// Build a [`TransferDescriptor`] from response headers.
///
/// A missing or malformed `Content-Length` means the size is unknown. Range
/// support requires `Accept-Ranges` to be exactly `bytes`.
pub fn describe(head: &ResponseHead) -> TransferDescriptor {
    let (name, extension) = resolve_file_name(
        head.header("content-disposition"),
        head.header("content-type"),
    );

    let total_size = head
        .header("content-length")
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(0);

    let supports_ranges = head.header("accept-ranges") == Some("bytes");

    TransferDescriptor {
        name,
        extension,
        total_size,
        supports_ranges,
    }
}
