//! Boundary with the external EEG encoder.
//!
//! The neural encoder itself lives outside this crate. Anything that maps a
//! preprocessed multi-channel trial to a unit-norm embedding can implement [`Encoder`].
//! [`StubEncoder`] produces deterministic embeddings for tests and offline tooling.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{EmbeddingError, EmbeddingResult};
use super::vector::normalize_in_place;
use crate::hashing::hash_trial;

/// A preprocessed, model-ready EEG trial (`channels × samples`, row-major).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub channels: usize,
    pub samples: usize,
    pub data: Vec<f32>,
}

impl Trial {
    pub fn new(channels: usize, samples: usize, data: Vec<f32>) -> EmbeddingResult<Self> {
        if channels == 0 || samples == 0 {
            return Err(EmbeddingError::InvalidTrial {
                reason: format!("empty trial shape {}x{}", channels, samples),
            });
        }
        if data.len() != channels * samples {
            return Err(EmbeddingError::InvalidTrial {
                reason: format!(
                    "trial holds {} values, expected {} ({} channels x {} samples)",
                    data.len(),
                    channels * samples,
                    channels,
                    samples
                ),
            });
        }
        Ok(Self {
            channels,
            samples,
            data,
        })
    }
}

/// Maps a trial to an L2-normalized embedding of [`Encoder::embedding_dim`] floats.
pub trait Encoder: Send + Sync {
    fn embed(&self, trial: &Trial) -> EmbeddingResult<Vec<f32>>;

    fn embedding_dim(&self) -> usize;

    fn embed_batch(&self, trials: &[Trial]) -> EmbeddingResult<Vec<Vec<f32>>> {
        trials.iter().map(|t| self.embed(t)).collect()
    }
}

/// Deterministic encoder: identical trials map to identical unit vectors.
#[derive(Debug, Clone)]
pub struct StubEncoder {
    embedding_dim: usize,
}

impl StubEncoder {
    pub fn new(embedding_dim: usize) -> Self {
        Self { embedding_dim }
    }
}

impl Default for StubEncoder {
    fn default() -> Self {
        Self::new(crate::constants::DEFAULT_EMBEDDING_DIM)
    }
}

impl Encoder for StubEncoder {
    fn embed(&self, trial: &Trial) -> EmbeddingResult<Vec<f32>> {
        debug!(
            channels = trial.channels,
            samples = trial.samples,
            "Generating stub embedding"
        );

        let mut state = hash_trial(trial);
        let mut embedding = Vec::with_capacity(self.embedding_dim);
        for _ in 0..self.embedding_dim {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
            let value = ((state >> 32) as f32 / u32::MAX as f32) * 2.0 - 1.0;
            embedding.push(value);
        }

        normalize_in_place(&mut embedding);
        Ok(embedding)
    }

    fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }
}
