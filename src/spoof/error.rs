use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
/// Errors returned by autoencoder training, inference, and persistence.
pub enum SpoofError {
    /// Tensor operation failed.
    #[error("tensor error: {0}")]
    Candle(#[from] candle_core::Error),

    /// Too few samples for the requested split.
    #[error("insufficient training data: {reason}")]
    InsufficientData {
        /// Description of the shortfall.
        reason: String,
    },

    /// Percentile outside `[0, 100]`.
    #[error("invalid percentile {value}: must be within [0, 100]")]
    InvalidPercentile {
        /// Offending value.
        value: f64,
    },

    /// Layer widths are not strictly decreasing, or do not match the data.
    #[error("invalid architecture: {reason}")]
    InvalidArchitecture {
        /// Description of the problem.
        reason: String,
    },

    /// Stored weights do not fit the declared architecture.
    #[error("architecture mismatch: {reason}")]
    ArchitectureMismatch {
        /// Description of the mismatch.
        reason: String,
    },

    /// Probe dimension does not match the model input.
    #[error("dimension mismatch: model expects {expected}, got {actual}")]
    DimensionMismatch {
        /// Model input width.
        expected: usize,
        /// Probe width.
        actual: usize,
    },

    /// Persistence failure.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Convenience result type for spoof detection.
pub type SpoofResult<T> = Result<T, SpoofError>;
