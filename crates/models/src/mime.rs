//! MIME type detection from file extensions.
//!
//! Only covers what the desk can classify. Anything unknown is reported as
//! `application/octet-stream` and ends up in [`Category::Other`](crate::Category::Other).

use std::path::Path;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Guess a MIME type from the extension of `path` (case-insensitive).
pub fn from_path(path: impl AsRef<Path>) -> &'static str {
    let Some(ext) = path.as_ref().extension().and_then(|e| e.to_str()) else {
        return OCTET_STREAM;
    };
    match ext.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "heif" => "image/heif",
        "avif" => "image/avif",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xls" => "application/vnd.ms-excel",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        "ppt" => "application/vnd.ms-powerpoint",
        "pptx" => "application/vnd.openxmlformats-officedocument.presentationml.presentation",
        _ => OCTET_STREAM,
    }
}

/// Whether the MIME type describes an image.
pub fn is_image(mime_type: &str) -> bool {
    mime_type.starts_with("image/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("photo.JPG", "image/jpeg")]
    #[case("dir/scan.jpeg", "image/jpeg")]
    #[case("site.png", "image/png")]
    #[case("report.pdf", "application/pdf")]
    #[case("sheet.xlsx", "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")]
    #[case("README", OCTET_STREAM)]
    #[case("archive.tar.gz", OCTET_STREAM)]
    fn test_from_path(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(from_path(path), expected);
    }

    #[test]
    fn test_is_image() {
        assert!(is_image("image/heic"));
        assert!(!is_image("application/pdf"));
    }
}
