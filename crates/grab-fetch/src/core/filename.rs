use once_cell::sync::Lazy;
use regex::Regex;

use super::mime::extension_for_mime;
use crate::data::descriptor::DEFAULT_NAME;

static QUOTED_FILENAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)filename="([^"]+)""#).expect("valid regex"));

static BARE_FILENAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"(?i)filename=([^";\s]+)"#).expect("valid regex"));

/// Extract the `filename` parameter of a `Content-Disposition` header.
///
/// The quoted form is preferred; a bare token is accepted as a fallback.
///
/// # Examples
///
/// ```
/// use grab_fetch::core::parse_disposition_filename;
///
/// let cd = r#"attachment; filename="report.final.csv""#;
/// assert_eq!(parse_disposition_filename(cd).as_deref(), Some("report.final.csv"));
/// assert_eq!(parse_disposition_filename("inline"), None);
/// ```
pub fn parse_disposition_filename(disposition: &str) -> Option<String> {
    QUOTED_FILENAME
        .captures(disposition)
        .or_else(|| BARE_FILENAME.captures(disposition))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Split at the last `.` into base name and extension.
///
/// A name without a dot has an empty extension.
pub fn split_last_dot(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(idx) => (&name[..idx], &name[idx + 1..]),
        None => (name, ""),
    }
}

/// Reduce a server supplied name to its final path component.
///
/// Returns `None` for names that cannot be used as a file name.
pub fn sanitize_file_name(raw: &str) -> Option<String> {
    let last = raw
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    match last {
        "" | "." | ".." => None,
        name if name.chars().any(char::is_control) => None,
        name => Some(name.to_string()),
    }
}

/// Pick the base name and extension for a download.
///
/// The disposition filename wins. When it carries no extension, the
/// content type decides, and `bin` is used when that is unknown too.
pub fn resolve_file_name(
    disposition: Option<&str>,
    content_type: Option<&str>,
) -> (String, String) {
    let from_disposition = disposition
        .and_then(parse_disposition_filename)
        .and_then(|raw| sanitize_file_name(&raw));

    let (name, extension) = match from_disposition.as_deref() {
        Some(file) => match split_last_dot(file) {
            ("", _) => (file.to_string(), String::new()),
            (base, ext) => (base.to_string(), ext.to_string()),
        },
        None => (DEFAULT_NAME.to_string(), String::new()),
    };

    let extension = if extension.is_empty() {
        extension_for_mime(content_type.unwrap_or_default()).to_string()
    } else {
        extension
    };

    (name, extension)
}
