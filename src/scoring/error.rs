use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },

    #[error("dimension mismatch: prototypes have {expected} dims, probe has {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("prototype set is empty")]
    NoPrototypes,
}

pub type ScoringResult<T> = Result<T, ScoringError>;
