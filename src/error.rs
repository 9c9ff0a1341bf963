use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PNG optimization error: {0}")]
    PngOptimization(String),

    #[error("{format} encoding error: {message}")]
    Encoding {
        format: &'static str,
        message: String,
    },

    #[error("Quality must be between 1 and 100 (got {0})")]
    InvalidQuality(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("No image data provided")]
    MissingImageData,

    #[error("Invalid image data: {0}")]
    InvalidImageData(#[from] base64::DecodeError),

    #[error("Compression timed out after {0:?}")]
    Timeout(Duration),

    #[error("Compression task failed: {0}")]
    TaskFailed(String),
}

/// Coarse failure category reported alongside each failed batch item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    InvalidInput,
    Codec,
    Filesystem,
    Timeout,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::InvalidInput => "invalid input",
            FailureKind::Codec => "codec failure",
            FailureKind::Filesystem => "filesystem failure",
            FailureKind::Timeout => "timeout",
        };
        f.write_str(name)
    }
}

impl CompressionError {
    pub fn kind(&self) -> FailureKind {
        match self {
            CompressionError::InvalidQuality(_)
            | CompressionError::MissingImageData
            | CompressionError::InvalidImageData(_) => FailureKind::InvalidInput,
            CompressionError::Image(_)
            | CompressionError::PngOptimization(_)
            | CompressionError::Encoding { .. }
            | CompressionError::UnsupportedFormat(_)
            | CompressionError::TaskFailed(_) => FailureKind::Codec,
            CompressionError::Io(_) | CompressionError::FileNotFound(_) => FailureKind::Filesystem,
            CompressionError::Timeout(_) => FailureKind::Timeout,
        }
    }
}

pub type Result<T> = std::result::Result<T, CompressionError>;
