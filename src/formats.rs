/// Output format resolution
///
/// Turns an optional requested format string and the source bytes into the
/// concrete encoding a job will produce.
use crate::codec::Codec;
use crate::error::{CompressionError, Result};
use image::ImageFormat;
use std::fmt;
use std::str::FromStr;

/// Encodings a compression job can produce
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResolvedFormat {
    Jpeg,
    Png,
    WebP,
    Avif,
}

impl ResolvedFormat {
    pub const ALL: [ResolvedFormat; 4] = [
        ResolvedFormat::Jpeg,
        ResolvedFormat::Png,
        ResolvedFormat::WebP,
        ResolvedFormat::Avif,
    ];

    /// Canonical lowercase name, as reported over HTTP
    pub fn name(&self) -> &'static str {
        match self {
            ResolvedFormat::Jpeg => "jpeg",
            ResolvedFormat::Png => "png",
            ResolvedFormat::WebP => "webp",
            ResolvedFormat::Avif => "avif",
        }
    }

    /// Returns the file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ResolvedFormat::Jpeg => "jpg",
            other => other.name(),
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ResolvedFormat::Jpeg => "image/jpeg",
            ResolvedFormat::Png => "image/png",
            ResolvedFormat::WebP => "image/webp",
            ResolvedFormat::Avif => "image/avif",
        }
    }

    pub fn to_image_format(&self) -> ImageFormat {
        match self {
            ResolvedFormat::Jpeg => ImageFormat::Jpeg,
            ResolvedFormat::Png => ImageFormat::Png,
            ResolvedFormat::WebP => ImageFormat::WebP,
            ResolvedFormat::Avif => ImageFormat::Avif,
        }
    }

    pub fn from_image_format(format: ImageFormat) -> Option<Self> {
        match format {
            ImageFormat::Jpeg => Some(ResolvedFormat::Jpeg),
            ImageFormat::Png => Some(ResolvedFormat::Png),
            ImageFormat::WebP => Some(ResolvedFormat::WebP),
            ImageFormat::Avif => Some(ResolvedFormat::Avif),
            _ => None,
        }
    }
}

impl fmt::Display for ResolvedFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResolvedFormat {
    type Err = CompressionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(ResolvedFormat::Jpeg),
            "png" => Ok(ResolvedFormat::Png),
            "webp" => Ok(ResolvedFormat::WebP),
            "avif" => Ok(ResolvedFormat::Avif),
            _ => Err(CompressionError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Decide the output encoding for a job.
///
/// An explicit, non-empty request wins; an unrecognized request falls back
/// to JPEG. Without a request the source is inspected, and anything the
/// codec cannot identify as one of the four output formats becomes JPEG.
pub fn resolve_format<C: Codec + ?Sized>(
    codec: &C,
    requested: Option<&str>,
    source: &[u8],
) -> ResolvedFormat {
    match requested.map(str::trim).filter(|r| !r.is_empty()) {
        Some(requested) => requested.parse().unwrap_or(ResolvedFormat::Jpeg),
        None => codec
            .introspect_format(source)
            .and_then(ResolvedFormat::from_image_format)
            .unwrap_or(ResolvedFormat::Jpeg),
    }
}
