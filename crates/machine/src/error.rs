use std::path::PathBuf;

use thiserror::Error;

/// Result type used by the machine crate.
pub type Result<T> = std::result::Result<T, MachineError>;

/// Load-level failures. They block the pipeline and move the machine into
/// `error` until `RETRY`.
///
/// `Display` output is the exact text shown next to the upload control.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileError {
    #[error("No file selected.")]
    FileMissing,
    #[error("Invalid file type. Please upload a .lottie file.")]
    InvalidFileType { name: String },
    #[error("File size exceeds {limit_mb}MB limit")]
    FileTooLarge { size: u64, limit_mb: u64 },
    #[error("Error loading file.")]
    LoadFailure,
}

/// Infrastructure errors around the machine.
///
/// Transition logic itself never fails: illegal commands are ignored and
/// load or engine failures are recorded in the context.
#[derive(Debug, Error)]
pub enum MachineError {
    #[error("{context}: {} ({source})", .path.display())]
    FileIo {
        context: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid machine config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("machine dispatcher is disconnected")]
    Disconnected,
}
