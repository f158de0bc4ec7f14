use thiserror::Error;

use super::UserId;
use crate::embedding::EmbeddingError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
/// Errors returned by prototype computation and the prototype store.
pub enum PrototypeError {
    /// No prototypes stored for this user.
    #[error("user {user_id} not found in prototype store")]
    NotFound {
        /// Requested user id.
        user_id: UserId,
    },

    /// Malformed request (k = 0, empty enrollment, unknown method).
    #[error("invalid input: {reason}")]
    InvalidInput {
        /// Description of the problem.
        reason: String,
    },

    /// Embedding dimension disagrees with the store.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Store dimension.
        expected: usize,
        /// Offending dimension.
        actual: usize,
    },

    /// Matrix construction failed.
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Persistence failure.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Convenience result type for prototype operations.
pub type PrototypeResult<T> = Result<T, PrototypeError>;
