//! Content-Type lookup by file extension

use std::path::Path;

/// Fallback for unknown or missing extensions
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Guess the MIME type of a file from its extension
///
/// The extension is everything after the last `.` of the file name, so a
/// dotfile such as `.png` counts as a PNG. The lookup is case-insensitive
/// and never fails.
pub fn guess_content_type(path: impl AsRef<Path>) -> &'static str {
    let ext = match extension(path.as_ref()) {
        Some(ext) => ext.to_ascii_lowercase(),
        None => return DEFAULT_CONTENT_TYPE,
    };

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "html" => "text/html",
        "css" => "text/css",
        "js" | "mjs" => "application/javascript",
        "json" => "application/json",
        _ => DEFAULT_CONTENT_TYPE,
    }
}

fn extension(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_string_lossy();
    name.rsplit_once('.').map(|(_, ext)| ext.to_string())
}
