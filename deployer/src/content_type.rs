//! Extension based content type lookup for deployed files

use std::path::Path;

use mime::Mime;

/// Content type used when the extension is missing or unknown
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Resolves the content type of a file from its extension
///
/// The lookup is case-insensitive and never touches the filesystem. Unknown
/// extensions resolve to `application/octet-stream`.
#[must_use]
pub fn resolve(path: &Path) -> Mime {
    let essence = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map_or(DEFAULT_CONTENT_TYPE, content_type_for_extension);

    essence.parse().unwrap_or(mime::APPLICATION_OCTET_STREAM)
}

/// Maps a bare extension (without the dot) to a content type
#[must_use]
pub fn content_type_for_extension(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        // Documents
        "html" | "htm" => "text/html",
        "xhtml" => "application/xhtml+xml",
        "css" => "text/css",
        "js" | "mjs" | "cjs" => "text/javascript",
        "json" | "map" => "application/json",
        "jsonld" => "application/ld+json",
        "webmanifest" => "application/manifest+json",
        "xml" | "xsl" => "application/xml",
        "rss" => "application/rss+xml",
        "atom" => "application/atom+xml",
        "txt" => "text/plain",
        "md" | "markdown" => "text/markdown",
        "csv" => "text/csv",
        "ics" => "text/calendar",
        "pdf" => "application/pdf",

        // Images
        "png" => "image/png",
        "jpg" | "jpeg" | "jpe" => "image/jpeg",
        "gif" => "image/gif",
        "svg" | "svgz" => "image/svg+xml",
        "webp" => "image/webp",
        "avif" => "image/avif",
        "ico" => "image/vnd.microsoft.icon",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",

        // Fonts
        "woff" => "font/woff",
        "woff2" => "font/woff2",
        "ttf" => "font/ttf",
        "otf" => "font/otf",
        "eot" => "application/vnd.ms-fontobject",

        // Audio and video
        "mp3" => "audio/mpeg",
        "ogg" | "oga" => "audio/ogg",
        "wav" => "audio/wav",
        "m4a" => "audio/mp4",
        "mp4" | "m4v" => "video/mp4",
        "webm" => "video/webm",
        "ogv" => "video/ogg",
        "mov" => "video/quicktime",

        // Archives and binaries
        "zip" => "application/zip",
        "gz" => "application/gzip",
        "tar" => "application/x-tar",
        "wasm" => "application/wasm",

        _ => DEFAULT_CONTENT_TYPE,
    }
}
