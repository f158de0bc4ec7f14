use thiserror::Error;

use crate::calibration::CalibrationError;
use crate::constants::DimValidationError;
use crate::decision::DecisionError;
use crate::embedding::EmbeddingError;
use crate::prototypes::PrototypeError;
use crate::scoring::ScoringError;
use crate::spoof::SpoofError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error(transparent)]
    Prototype(#[from] PrototypeError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),

    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    #[error(transparent)]
    Spoof(#[from] SpoofError),

    #[error(transparent)]
    Decision(#[from] DecisionError),

    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error("embedding width does not fit the models: {0}")]
    Dimension(#[from] DimValidationError),

    #[error("no artifact paths configured for reload")]
    NoArtifactPaths,
}

impl AuthError {
    /// True for failures caused by unreadable or inconsistent artifacts.
    pub fn is_corruption(&self) -> bool {
        match self {
            Self::Prototype(PrototypeError::Storage(e))
            | Self::Calibration(CalibrationError::Storage(e))
            | Self::Spoof(SpoofError::Storage(e)) => e.is_corruption(),
            Self::Spoof(SpoofError::ArchitectureMismatch { .. }) => true,
            _ => false,
        }
    }
}

pub type AuthResult<T> = Result<T, AuthError>;
