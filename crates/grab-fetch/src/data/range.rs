use std::fmt;

use bytes::Bytes;

/// An inclusive byte range of the remote file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteRange {
    /// Ordinal position (0-based)
    pub index: u64,
    /// First byte offset (inclusive)
    pub start: u64,
    /// Last byte offset (inclusive)
    pub end: u64,
}

impl ByteRange {
    /// Number of bytes covered by the range.
    ///
    /// Saturates instead of wrapping: an inverted range is empty and a range
    /// spanning every `u64` offset reports `u64::MAX`.
    pub fn size(&self) -> u64 {
        match self.end.checked_sub(self.start) {
            Some(span) => span.saturating_add(1),
            None => 0,
        }
    }

    /// Value for the `Range` request header.
    ///
    /// # Examples
    ///
    /// ```
    /// use grab_fetch::ByteRange;
    ///
    /// let r = ByteRange { index: 1, start: 400, end: 799 };
    /// assert_eq!(r.header_value(), "bytes=400-799");
    /// ```
    pub fn header_value(&self) -> String {
        crate::core::range_header(self.start, self.end)
    }
}

impl fmt::Display for ByteRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.end)
    }
}

/// Outcome of planning a transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Contiguous ranges covering `[0, total_size)`.
    Ranges(Vec<ByteRange>),

    /// The size is unknown; the body has to be streamed in one piece.
    Unbounded,
}

/// A byte range and, once fetched, its payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub range: ByteRange,
    pub payload: Option<Bytes>,
}

impl Chunk {
    pub fn new(range: ByteRange) -> Self {
        Self {
            range,
            payload: None,
        }
    }

    #[must_use]
    pub fn with_payload(mut self, payload: Bytes) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Length of the fetched payload, zero when nothing was fetched.
    pub fn payload_len(&self) -> u64 {
        self.payload.as_ref().map_or(0, |p| p.len() as u64)
    }

    pub fn is_empty(&self) -> bool {
        self.payload_len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_range_size_is_inclusive() {
        let r = ByteRange {
            index: 0,
            start: 0,
            end: 0,
        };
        assert_eq!(r.size(), 1);

        let r = ByteRange {
            index: 2,
            start: 800,
            end: 999,
        };
        assert_eq!(r.size(), 200);
        assert_eq!(r.to_string(), "800-999");
    }

    #[test]
    fn test_range_size_saturates() {
        let inverted = ByteRange {
            index: 0,
            start: 10,
            end: 3,
        };
        assert_eq!(inverted.size(), 0);

        let everything = ByteRange {
            index: 0,
            start: 0,
            end: u64::MAX,
        };
        assert_eq!(everything.size(), u64::MAX);
    }

    #[test]
    fn test_chunk_payload_states() {
        let range = ByteRange {
            index: 0,
            start: 0,
            end: 3,
        };

        let chunk = Chunk::new(range);
        assert!(chunk.is_empty());

        let chunk = chunk.with_payload(Bytes::new());
        assert!(chunk.is_empty());

        let chunk = Chunk::new(range).with_payload(Bytes::from_static(b"abcd"));
        assert!(!chunk.is_empty());
        assert_eq!(chunk.payload_len(), 4);
    }
}
