use thiserror::Error;

use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum CalibrationError {
    /// Bad fit data, unknown method, or an unrecognized serialized calibrator.
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("length mismatch: {scores} scores but {labels} labels")]
    LengthMismatch { scores: usize, labels: usize },

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

pub type CalibrationResult<T> = Result<T, CalibrationError>;
