use std::path::Path;
use std::sync::Arc;

use crate::config::MachineConfig;
use crate::error::{FileError, MachineError, Result};

/// The single animation asset previewed by every player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationFile {
    name: String,
    bytes: Arc<[u8]>,
}

impl AnimationFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }

    /// Reads an asset from disk, keeping only its file name.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| MachineError::FileIo {
            context: "read animation file",
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::new(name, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn extension(&self) -> Option<&str> {
        Path::new(&self.name)
            .extension()
            .and_then(|extension| extension.to_str())
    }
}

/// Applies the acceptance rule in order: presence, type, size.
///
/// # Example
/// ```
/// use machine::{AnimationFile, FileError, MachineConfig, validate_file};
///
/// let config = MachineConfig::default();
/// let notes = AnimationFile::new("notes.txt", vec![0u8; 4]);
///
/// assert_eq!(validate_file(None, &config), Err(FileError::FileMissing));
/// assert!(matches!(
///     validate_file(Some(&notes), &config),
///     Err(FileError::InvalidFileType { .. })
/// ));
/// ```
pub fn validate_file<'a>(
    file: Option<&'a AnimationFile>,
    config: &MachineConfig,
) -> std::result::Result<&'a AnimationFile, FileError> {
    let file = file.ok_or(FileError::FileMissing)?;

    let accepted = file
        .extension()
        .is_some_and(|extension| config.accepts_extension(extension));
    if !accepted {
        return Err(FileError::InvalidFileType {
            name: file.name.clone(),
        });
    }

    if file.size() > config.max_file_size {
        return Err(FileError::FileTooLarge {
            size: file.size(),
            limit_mb: config.max_file_size_mb(),
        });
    }

    Ok(file)
}

/// Resolves the `loading` state: succeeds whenever a file is present.
pub fn confirm_load(file: Option<&AnimationFile>) -> std::result::Result<AnimationFile, FileError> {
    file.cloned().ok_or(FileError::LoadFailure)
}
