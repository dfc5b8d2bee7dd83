use crate::data::descriptor::DEFAULT_EXTENSION;

/// Map a `Content-Type` value to a file extension.
///
/// Parameters such as `; charset=utf-8` are ignored and the match is
/// case-insensitive. Unknown types map to `bin`.
///
/// # Examples
///
/// ```
/// use grab_fetch::core::extension_for_mime;
///
/// assert_eq!(extension_for_mime("image/png"), "png");
/// assert_eq!(extension_for_mime("text/plain; charset=utf-8"), "txt");
/// assert_eq!(extension_for_mime("application/x-unknown"), "bin");
/// ```
pub fn extension_for_mime(content_type: &str) -> &'static str {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        // Images
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        "image/svg+xml" => "svg",
        "image/tiff" => "tiff",
        "image/vnd.microsoft.icon" => "ico",

        // Audio
        "audio/mpeg" => "mp3",
        "audio/wav" => "wav",
        "audio/ogg" => "ogg",
        "audio/webm" => "webm",
        "audio/flac" => "flac",

        // Video
        "video/mp4" => "mp4",
        "video/webm" => "webm",
        "video/ogg" => "ogv",
        "video/x-msvideo" => "avi",
        "video/mpeg" => "mpeg",

        // Documents
        "application/pdf" => "pdf",
        "application/msword" => "doc",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "docx",
        "application/vnd.ms-excel" => "xls",
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet" => "xlsx",
        "application/vnd.ms-powerpoint" => "ppt",
        "application/vnd.openxmlformats-officedocument.presentationml.presentation" => "pptx",

        // Text and code
        "text/plain" => "txt",
        "text/html" => "html",
        "text/css" => "css",
        "text/javascript" => "js",
        "application/json" => "json",
        "application/xml" => "xml",
        "application/x-yaml" => "yaml",
        "application/x-sh" => "sh",
        "application/x-httpd-php" => "php",

        // Archives and executables
        "application/zip" => "zip",
        "application/x-rar-compressed" => "rar",
        "application/x-7z-compressed" => "7z",
        "application/gzip" => "gz",
        "application/x-tar" => "tar",
        "application/java-archive" => "jar",
        "application/x-msdownload" => "exe",
        "application/x-iso9660-image" => "iso",

        _ => DEFAULT_EXTENSION,
    }
}
