//! Cross-cutting, shared constants.
//!
//! Decision-policy numbers live here as defaults only. Every one of them is overridable
//! through [`crate::config::Config`] because the right values depend on the deployed
//! calibrator's score distribution.
//!
//! # Dimension Invariants
//!
//! The embedding dimension is fixed by the upstream encoder. Prototype sets, the spoof
//! autoencoder and every probe must agree on it:
//!
//! 1. Use [`DimConfig`] to pass the dimension through initialization
//! 2. Use [`validate_embedding_dim`] at module boundaries to catch mismatches early
//! 3. [`DEFAULT_EMBEDDING_DIM`] remains the default for configs and fixtures

pub const DEFAULT_EMBEDDING_DIM: usize = 128;

/// Additive epsilon in the cosine-similarity denominator and prototype renormalization.
pub const COSINE_EPSILON: f64 = 1e-8;

/// Tolerance used when checking the unit-norm contract of embeddings.
pub const UNIT_NORM_TOLERANCE: f32 = 1e-3;

pub const DEFAULT_PROTOTYPE_K: usize = 2;
pub const DEFAULT_KMEANS_SEED: u64 = 42;
pub const KMEANS_N_INIT: usize = 10;
pub const KMEANS_MAX_ITER: usize = 300;
pub const KMEANS_TOLERANCE: f64 = 1e-4;

pub const DEFAULT_AUTH_THRESHOLD: f32 = 0.5;

/// Probability used when no calibrator is loaded.
pub const NEUTRAL_PROBABILITY: f32 = 0.5;

/// Confidence tiers are symmetric around 0.5: HIGH above this or below `1 - this`.
pub const DEFAULT_TIER_HIGH: f64 = 0.8;
/// MEDIUM above this or below `1 - this` (when not already HIGH).
pub const DEFAULT_TIER_MEDIUM: f64 = 0.6;

pub const DEFAULT_SPOOF_PERCENTILE: f32 = 99.0;

pub const DEFAULT_HIDDEN_DIM: usize = 64;
pub const DEFAULT_LATENT_DIM: usize = 32;
pub const DEFAULT_EPOCHS: usize = 50;
pub const DEFAULT_BATCH_SIZE: usize = 64;
pub const DEFAULT_LEARNING_RATE: f64 = 1e-3;
pub const DEFAULT_VAL_SPLIT: f32 = 0.2;
pub const DEFAULT_TRAINING_SEED: u64 = 42;

/// Enrollments with fewer trials than this are reported as limited quality.
pub const MIN_QUALITY_TRIALS: usize = 3;
/// Trial count at which enrollment confidence saturates.
pub const OPTIMAL_ENROLLMENT_TRIALS: usize = 5;

/// Embedding width shared by the prototype store, the spoof autoencoder and probes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimConfig {
    pub embedding_dim: usize,
}

impl Default for DimConfig {
    fn default() -> Self {
        Self::new(DEFAULT_EMBEDDING_DIM)
    }
}

impl DimConfig {
    pub fn new(embedding_dim: usize) -> Self {
        Self { embedding_dim }
    }

    pub fn validate(&self) -> Result<(), DimValidationError> {
        if self.embedding_dim == 0 {
            return Err(DimValidationError::ZeroDimension);
        }
        Ok(())
    }

    /// Checks an encoder or artifact width against this configuration.
    pub fn check(&self, actual: usize) -> Result<(), DimValidationError> {
        validate_embedding_dim(actual, self.embedding_dim)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DimValidationError {
    #[error("embedding dimension cannot be zero")]
    ZeroDimension,

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Rejects an embedding width that differs from the one the models were built for.
///
/// ```
/// use neurokey::constants::{validate_embedding_dim, DEFAULT_EMBEDDING_DIM};
///
/// assert!(validate_embedding_dim(128, DEFAULT_EMBEDDING_DIM).is_ok());
/// assert!(validate_embedding_dim(64, DEFAULT_EMBEDDING_DIM).is_err());
/// ```
pub fn validate_embedding_dim(actual: usize, expected: usize) -> Result<(), DimValidationError> {
    if actual != expected {
        return Err(DimValidationError::DimensionMismatch { expected, actual });
    }
    Ok(())
}
