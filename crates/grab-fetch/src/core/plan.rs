use crate::data::{ByteRange, Plan, UNKNOWN_SIZE_CHUNK_SIZE};
use crate::error::{Error, Result};

/// Partition `[0, total_size)` into contiguous ranges of `chunk_size` bytes.
///
/// The last range absorbs whatever is left and may be shorter. A `total_size`
/// of zero means the size is unknown and yields [`Plan::Unbounded`] rather
/// than a zero-length range.
///
/// # Errors
///
/// Returns [`Error::InvalidConfig`] when `chunk_size` is zero.
///
/// # Examples
///
/// ```
/// use grab_fetch::{core::plan, Plan};
///
/// let Plan::Ranges(ranges) = plan(1000, 400).unwrap() else { unreachable!() };
/// let bounds: Vec<_> = ranges.iter().map(|r| (r.start, r.end)).collect();
/// assert_eq!(bounds, [(0, 399), (400, 799), (800, 999)]);
/// ```
pub fn plan(total_size: u64, chunk_size: u64) -> Result<Plan> {
    if chunk_size == 0 {
        return Err(Error::InvalidConfig("chunk size must be positive".into()));
    }

    if total_size == 0 {
        return Ok(Plan::Unbounded);
    }

    let count = total_size.div_ceil(chunk_size);
    let last = total_size - 1;

    let ranges = (0..count)
        .map(|index| {
            let start = index * chunk_size;
            let end = start.saturating_add(chunk_size - 1).min(last);
            ByteRange { index, start, end }
        })
        .collect();

    Ok(Plan::Ranges(ranges))
}

/// Chunk size a transfer actually uses, for reporting.
///
/// Unknown sizes are streamed, which is reported with a small nominal chunk.
pub fn effective_chunk_size(total_size: u64, chunk_size: u64) -> u64 {
    if total_size == 0 {
        UNKNOWN_SIZE_CHUNK_SIZE
    } else {
        chunk_size.min(total_size)
    }
}

/// `Range` header value for an inclusive byte span.
pub fn range_header(start: u64, end: u64) -> String {
    format!("bytes={start}-{end}")
}
