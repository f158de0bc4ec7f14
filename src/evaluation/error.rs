use thiserror::Error;

#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("no {which} scores supplied")]
    EmptyScores { which: &'static str },

    #[error("scores contain non-finite values")]
    NonFinite,

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },
}

pub type EvaluationResult<T> = Result<T, EvaluationError>;
