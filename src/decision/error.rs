use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("invalid decision config: {reason}")]
    InvalidConfig { reason: String },
}

pub type DecisionResult<T> = Result<T, DecisionError>;
