use std::path::PathBuf;
use thiserror::Error;

use super::artifact::ArtifactKind;

#[derive(Error, Debug)]
/// Errors returned while reading or writing model artifacts.
pub enum StorageError {
    /// IO error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Artifact file does not exist.
    #[error("artifact not found: {path}")]
    NotFound {
        /// Missing path.
        path: PathBuf,
    },

    /// Frame or payload failed an integrity check.
    #[error("corrupt artifact: {reason}")]
    Corrupt {
        /// What failed.
        reason: String,
    },

    /// File holds a different artifact kind than requested.
    #[error("artifact kind mismatch: expected {expected}, found {actual}")]
    KindMismatch {
        /// Requested kind.
        expected: ArtifactKind,
        /// Kind byte found in the header.
        actual: u8,
    },

    /// Format version this build cannot read.
    #[error("unsupported artifact version {version} (supported: {supported})")]
    UnsupportedVersion {
        /// Version byte found in the header.
        version: u8,
        /// Version written by this build.
        supported: u8,
    },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    /// Returns `true` for failures that indicate unusable artifact contents.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Self::Corrupt { .. }
                | Self::KindMismatch { .. }
                | Self::UnsupportedVersion { .. }
                | Self::Serialization(_)
        )
    }
}

/// Convenience result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
