use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by facestamp operations.
#[derive(Debug, Error)]
pub enum FaceStampError {
    #[error("failed to load classifier {}: {reason}", .path.display())]
    ClassifierLoadError { path: PathBuf, reason: String },

    #[error("failed to decode image: {0}")]
    DecodeError(String),

    #[error("image dimensions are zero")]
    ZeroDimensions,

    #[error("face detection failed: {0}")]
    DetectionError(String),

    #[error("failed to encode image: {0}")]
    EncodeError(String),

    #[error("quality must be between 1 and 100, got {0}")]
    InvalidQuality(u8),

    #[error("failed to write {}: {source}", .path.display())]
    FileWriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
