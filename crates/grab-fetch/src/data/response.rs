/// Status line and headers of an HTTP response.
///
/// Header names are matched case-insensitively. Bodies are handled separately
/// by [`Response`](crate::effects::Response) so that a HEAD reply and a GET
/// reply share the same metadata type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: u16,
    pub headers: Vec<(String, String)>,
}

impl ResponseHead {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// First value of the named header.
    ///
    /// # Examples
    ///
    /// ```
    /// use grab_fetch::ResponseHead;
    ///
    /// let head = ResponseHead::new(200).with_header("Accept-Ranges", "bytes");
    /// assert_eq!(head.header("accept-ranges"), Some("bytes"));
    /// assert_eq!(head.header("content-length"), None);
    /// ```
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn is_error(&self) -> bool {
        self.status >= 400
    }
}
