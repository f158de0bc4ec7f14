use std::collections::HashMap;
use std::path::Path;

use candle_core::{Device, Tensor};
use rkyv::rancor::Error as RkyvError;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize, from_bytes, to_bytes};
use serde::Serialize as SerdeSerialize;
use tracing::{debug, info};

use crate::embedding::Matrix;
use crate::storage::{ArtifactKind, StorageError, read_artifact, write_artifact};

use super::config::{AutoencoderConfig, TrainingConfig};
use super::error::{SpoofError, SpoofResult};
use super::model::EmbeddingAutoencoder;
use super::threshold::{check_percentile, compute_threshold, is_spoof};
use super::trainer::{EpochLoss, train};

#[derive(Archive, Serialize, Deserialize, Debug)]
struct StoredTensor {
    name: String,
    shape: Vec<u32>,
    data: Vec<f32>,
}

/// Weights, threshold and architecture persisted as one unit.
#[derive(Archive, Serialize, Deserialize, Debug)]
struct StoredDetector {
    input_dim: u32,
    hidden_dim: u32,
    latent_dim: u32,
    threshold: f64,
    percentile: f64,
    tensors: Vec<StoredTensor>,
}

/// Outcome of screening one embedding.
#[derive(Debug, Clone, Copy, PartialEq, SerdeSerialize)]
pub struct SpoofAssessment {
    pub reconstruction_error: f32,
    pub threshold: f64,
    pub is_spoof: bool,
}

/// Trained autoencoder bound to its percentile threshold.
#[derive(Debug, Clone)]
pub struct SpoofDetector {
    model: EmbeddingAutoencoder,
    threshold: f64,
    percentile: f64,
}

impl SpoofDetector {
    pub fn new(model: EmbeddingAutoencoder, threshold: f64, percentile: f64) -> SpoofResult<Self> {
        check_percentile(percentile)?;
        if !threshold.is_finite() {
            return Err(SpoofError::InsufficientData {
                reason: format!("threshold must be finite, got {}", threshold),
            });
        }
        Ok(Self {
            model,
            threshold,
            percentile,
        })
    }

    /// Derives the threshold as the `percentile`-th validation error.
    pub fn from_validation_errors(
        model: EmbeddingAutoencoder,
        validation_errors: &[f32],
        percentile: f64,
    ) -> SpoofResult<Self> {
        let threshold = compute_threshold(validation_errors, percentile)?;
        info!(percentile, threshold, "Spoof threshold derived");
        Self::new(model, threshold, percentile)
    }

    /// Trains on genuine embeddings and calibrates the threshold on the held-out split.
    pub fn fit(
        genuine: &Matrix,
        architecture: AutoencoderConfig,
        config: &TrainingConfig,
        device: &Device,
    ) -> SpoofResult<(Self, Vec<EpochLoss>)> {
        let outcome = train(genuine, architecture, config, device)?;
        let detector = Self::from_validation_errors(
            outcome.model,
            &outcome.validation_errors,
            config.percentile,
        )?;
        Ok((detector, outcome.history))
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn percentile(&self) -> f64 {
        self.percentile
    }

    pub fn architecture(&self) -> &AutoencoderConfig {
        self.model.config()
    }

    pub fn model(&self) -> &EmbeddingAutoencoder {
        &self.model
    }

    pub fn reconstruction_errors(&self, embeddings: &Matrix) -> SpoofResult<Vec<f32>> {
        if embeddings.is_empty() {
            return Ok(Vec::new());
        }
        let xs = self.model.to_tensor(embeddings)?;
        self.model.reconstruction_errors_tensor(&xs)
    }

    pub fn reconstruction_error(&self, embedding: &[f32]) -> SpoofResult<f32> {
        let expected = self.architecture().input_dim;
        if embedding.len() != expected {
            return Err(SpoofError::DimensionMismatch {
                expected,
                actual: embedding.len(),
            });
        }
        let xs = Tensor::from_slice(embedding, (1, expected), self.model.device())?;
        let errors = self.model.reconstruction_errors_tensor(&xs)?;
        errors.first().copied().ok_or_else(|| SpoofError::InsufficientData {
            reason: "model returned no reconstruction error".to_string(),
        })
    }

    pub fn is_spoof(&self, error: f32) -> bool {
        is_spoof(error, self.threshold)
    }

    pub fn assess(&self, embedding: &[f32]) -> SpoofResult<SpoofAssessment> {
        let reconstruction_error = self.reconstruction_error(embedding)?;
        let flagged = self.is_spoof(reconstruction_error);
        debug!(
            error = reconstruction_error,
            threshold = self.threshold,
            spoof = flagged,
            "Spoof assessment"
        );
        Ok(SpoofAssessment {
            reconstruction_error,
            threshold: self.threshold,
            is_spoof: flagged,
        })
    }

    pub fn to_bytes(&self) -> SpoofResult<Vec<u8>> {
        let arch = self.architecture();
        let mut tensors = Vec::new();
        for (name, tensor) in self.model.named_tensors() {
            let shape = tensor.dims().iter().map(|&d| d as u32).collect();
            let data = tensor.flatten_all()?.to_vec1::<f32>()?;
            tensors.push(StoredTensor { name, shape, data });
        }
        let stored = StoredDetector {
            input_dim: arch.input_dim as u32,
            hidden_dim: arch.hidden_dim as u32,
            latent_dim: arch.latent_dim as u32,
            threshold: self.threshold,
            percentile: self.percentile,
            tensors,
        };
        let bytes = to_bytes::<RkyvError>(&stored)
            .map_err(|e| StorageError::Serialization(format!("{:?}", e)))?;
        Ok(bytes.to_vec())
    }

    pub fn from_bytes(bytes: &[u8], device: &Device) -> SpoofResult<Self> {
        let mut aligned = AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);
        let stored = from_bytes::<StoredDetector, RkyvError>(&aligned).map_err(|e| {
            StorageError::Corrupt {
                reason: format!("spoof detector bundle: {:?}", e),
            }
        })?;

        let architecture = AutoencoderConfig::new(
            stored.input_dim as usize,
            stored.hidden_dim as usize,
            stored.latent_dim as usize,
        );
        let mut tensors = HashMap::with_capacity(stored.tensors.len());
        for t in stored.tensors {
            let shape: Vec<usize> = t.shape.iter().map(|&d| d as usize).collect();
            let expected: usize = shape.iter().product();
            if expected != t.data.len() {
                return Err(SpoofError::ArchitectureMismatch {
                    reason: format!(
                        "{} declares shape {:?} but holds {} values",
                        t.name,
                        shape,
                        t.data.len()
                    ),
                });
            }
            tensors.insert(t.name, Tensor::from_vec(t.data, shape, device)?);
        }

        let model = EmbeddingAutoencoder::from_tensors(architecture, tensors, device)?;
        Self::new(model, stored.threshold, stored.percentile)
    }

    /// Atomically writes weights, threshold and architecture together.
    pub fn save(&self, path: &Path) -> SpoofResult<()> {
        write_artifact(path, ArtifactKind::SpoofDetector, &self.to_bytes()?)?;
        info!(
            path = %path.display(),
            threshold = self.threshold,
            "Saved spoof detector"
        );
        Ok(())
    }

    pub fn load(path: &Path, device: &Device) -> SpoofResult<Self> {
        let payload = read_artifact(path, ArtifactKind::SpoofDetector)?;
        let detector = Self::from_bytes(&payload, device)?;
        info!(
            path = %path.display(),
            threshold = detector.threshold,
            "Loaded spoof detector"
        );
        Ok(detector)
    }
}
