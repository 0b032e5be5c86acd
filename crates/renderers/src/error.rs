use thiserror::Error;

use crate::document::SourceFormat;

/// Result type used by this crate.
pub type Result<T> = std::result::Result<T, RenderError>;

/// Errors reported by document probing and the engine models.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RenderError {
    #[error("invalid animation document: {reason}")]
    InvalidDocument { reason: String },
    #[error("invalid frame range {in_point}..{out_point}")]
    InvalidFrameRange { in_point: f64, out_point: f64 },
    #[error("invalid frame rate: {0}")]
    InvalidFrameRate(f64),
    #[error("invalid dotLottie archive: {reason}")]
    InvalidArchive { reason: String },
    #[error("dotLottie archive does not contain an animation")]
    MissingAnimation,
    #[error("{engine} cannot decode {format} sources")]
    UnsupportedFormat {
        engine: &'static str,
        format: SourceFormat,
    },
    #[error("animation is not loaded")]
    NotLoaded,
}

impl From<serde_json::Error> for RenderError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidDocument {
            reason: value.to_string(),
        }
    }
}

impl From<zip::result::ZipError> for RenderError {
    fn from(value: zip::result::ZipError) -> Self {
        Self::InvalidArchive {
            reason: value.to_string(),
        }
    }
}
