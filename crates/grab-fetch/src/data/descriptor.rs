/// Base name used when the server does not suggest one.
pub const DEFAULT_NAME: &str = "download";

/// Extension used when neither the disposition nor the content type yields one.
pub const DEFAULT_EXTENSION: &str = "bin";

/// Metadata resolved for one transfer before any body bytes are fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDescriptor {
    /// File base name, without the extension.
    pub name: String,

    /// File extension, without the leading dot.
    pub extension: String,

    /// Size from `Content-Length`. Zero means unknown.
    pub total_size: u64,

    /// Whether the server advertised `Accept-Ranges: bytes`.
    pub supports_ranges: bool,
}

impl Default for TransferDescriptor {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            extension: DEFAULT_EXTENSION.to_string(),
            total_size: 0,
            supports_ranges: false,
        }
    }
}

impl TransferDescriptor {
    /// The on-disk file name, `name.extension`.
    ///
    /// # Examples
    ///
    /// ```
    /// use grab_fetch::TransferDescriptor;
    ///
    /// let d = TransferDescriptor {
    ///     name: "report.final".into(),
    ///     extension: "csv".into(),
    ///     ..Default::default()
    /// };
    /// assert_eq!(d.file_name(), "report.final.csv");
    /// ```
    pub fn file_name(&self) -> String {
        if self.extension.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.name, self.extension)
        }
    }

    pub fn size_known(&self) -> bool {
        self.total_size > 0
    }

    /// Ranges are only planned when the server accepts them and the size is known.
    pub fn chunkable(&self) -> bool {
        self.supports_ranges && self.size_known()
    }
}
