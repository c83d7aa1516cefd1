//! Extension-based content classification.
//!
//! Both lookups are pure functions over the extension token (no dot,
//! case-sensitive); anything outside the table publishes as raw binary.

/// Content classification of a published artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentClass {
    Text,
    Gif,
    Jpeg,
    Png,
    Binary,
}

/// Classify a file by its extension.
pub fn content_class(extension: &str) -> ContentClass {
    match extension {
        "css" | "js" | "htc" => ContentClass::Text,
        "gif" => ContentClass::Gif,
        "jpg" | "jpeg" | "jpe" => ContentClass::Jpeg,
        "ico" | "png" => ContentClass::Png,
        _ => ContentClass::Binary,
    }
}

/// Mime type for an extension.
pub fn mime_type(extension: &str) -> &'static str {
    match extension {
        "css" => "text/css",
        "js" => "application/x-javascript",
        "htc" => "text/x-component",
        "gif" => "image/gif",
        "jpg" | "jpeg" | "jpe" => "image/jpeg",
        "ico" => "image/x-icon",
        "png" => "image/png",
        "svg" => "image/svg+xml",
        "eot" => "application/vnd.ms-fontobject",
        "woff" => "application/x-woff",
        "otf" => "application/x-font-opentype",
        "ttf" => "application/x-font-ttf",
        _ => "application/octet-stream",
    }
}
