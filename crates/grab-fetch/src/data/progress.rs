use crate::data::options::FetchPhase;

/// Snapshot of a running transfer, handed to progress callbacks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Progress {
    /// Current phase of the transfer.
    pub phase: FetchPhase,

    /// Bytes written to the destination file so far.
    pub bytes_downloaded: u64,

    /// Total expected bytes, if the server sent `Content-Length`.
    pub total_bytes: Option<u64>,

    /// Failed attempts observed so far across all chunks.
    pub retry_count: u32,
}

impl Progress {
    /// Completion as a percentage, when the total is known.
    ///
    /// # Examples
    ///
    /// ```
    /// use grab_fetch::{FetchPhase, Progress};
    ///
    /// let p = Progress {
    ///     phase: FetchPhase::Downloading,
    ///     bytes_downloaded: 250,
    ///     total_bytes: Some(1000),
    ///     retry_count: 0,
    /// };
    /// assert_eq!(p.percentage(), Some(25.0));
    /// ```
    pub fn percentage(&self) -> Option<f64> {
        match self.total_bytes {
            Some(0) | None => None,
            Some(total) => Some(self.bytes_downloaded as f64 / total as f64 * 100.0),
        }
    }

    pub fn is_completed(&self) -> bool {
        self.phase == FetchPhase::Completed
    }
}
