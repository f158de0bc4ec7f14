use serde::{Deserialize, Serialize};

use super::error::{SpoofError, SpoofResult};
use crate::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_EMBEDDING_DIM, DEFAULT_EPOCHS, DEFAULT_HIDDEN_DIM,
    DEFAULT_LATENT_DIM, DEFAULT_LEARNING_RATE, DEFAULT_SPOOF_PERCENTILE, DEFAULT_TRAINING_SEED,
    DEFAULT_VAL_SPLIT,
};

/// Layer widths: `input → hidden → latent → hidden → input`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoencoderConfig {
    pub input_dim: usize,
    pub hidden_dim: usize,
    pub latent_dim: usize,
}

impl Default for AutoencoderConfig {
    fn default() -> Self {
        Self {
            input_dim: DEFAULT_EMBEDDING_DIM,
            hidden_dim: DEFAULT_HIDDEN_DIM,
            latent_dim: DEFAULT_LATENT_DIM,
        }
    }
}

impl AutoencoderConfig {
    pub fn new(input_dim: usize, hidden_dim: usize, latent_dim: usize) -> Self {
        Self {
            input_dim,
            hidden_dim,
            latent_dim,
        }
    }

    /// Encoder widths must strictly decrease.
    pub fn validate(&self) -> SpoofResult<()> {
        if self.latent_dim == 0
            || self.hidden_dim <= self.latent_dim
            || self.input_dim <= self.hidden_dim
        {
            return Err(SpoofError::InvalidArchitecture {
                reason: format!(
                    "widths must satisfy input > hidden > latent > 0, got {} > {} > {}",
                    self.input_dim, self.hidden_dim, self.latent_dim
                ),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f64,
    /// Fraction held out for threshold calibration.
    pub val_split: f32,
    /// Seeds weight init, the train/val split and batch shuffling.
    pub seed: u64,
    pub percentile: f64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            epochs: DEFAULT_EPOCHS,
            batch_size: DEFAULT_BATCH_SIZE,
            learning_rate: DEFAULT_LEARNING_RATE,
            val_split: DEFAULT_VAL_SPLIT,
            seed: DEFAULT_TRAINING_SEED,
            percentile: DEFAULT_SPOOF_PERCENTILE as f64,
        }
    }
}

impl TrainingConfig {
    pub fn validate(&self) -> SpoofResult<()> {
        if self.epochs == 0 || self.batch_size == 0 {
            return Err(SpoofError::InsufficientData {
                reason: "epochs and batch_size must be at least 1".to_string(),
            });
        }
        if self.val_split.is_nan() || self.val_split <= 0.0 || self.val_split >= 1.0 {
            return Err(SpoofError::InsufficientData {
                reason: format!("val_split must be in (0, 1), got {}", self.val_split),
            });
        }
        if self.learning_rate.is_nan() || self.learning_rate <= 0.0 {
            return Err(SpoofError::InsufficientData {
                reason: format!("learning rate must be positive, got {}", self.learning_rate),
            });
        }
        super::threshold::check_percentile(self.percentile)
    }
}
