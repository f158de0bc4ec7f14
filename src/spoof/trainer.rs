use candle_core::{Device, Tensor};
use candle_nn::{AdamW, Module, Optimizer, ParamsAdamW};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::{debug, info};

use crate::embedding::Matrix;

use super::config::{AutoencoderConfig, TrainingConfig};
use super::error::{SpoofError, SpoofResult};
use super::model::EmbeddingAutoencoder;

/// Mean losses after one epoch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EpochLoss {
    pub epoch: usize,
    pub train_loss: f32,
    pub val_loss: f32,
}

/// Trained model plus the held-out errors its threshold is derived from.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: EmbeddingAutoencoder,
    pub validation_errors: Vec<f32>,
    pub history: Vec<EpochLoss>,
}

fn index_tensor(indices: &[usize], device: &Device) -> SpoofResult<Tensor> {
    let ids: Vec<u32> = indices.iter().map(|&i| i as u32).collect();
    Ok(Tensor::from_vec(ids, indices.len(), device)?)
}

/// Trains on genuine embeddings only.
///
/// `floor(n · val_split)` randomly chosen rows are held out; the rest are
/// shuffled into mini-batches each epoch and fit with Adam on mean squared
/// reconstruction error.
pub fn train(
    embeddings: &Matrix,
    architecture: AutoencoderConfig,
    config: &TrainingConfig,
    device: &Device,
) -> SpoofResult<TrainingOutcome> {
    config.validate()?;
    architecture.validate()?;
    if embeddings.dim() != architecture.input_dim {
        return Err(SpoofError::DimensionMismatch {
            expected: architecture.input_dim,
            actual: embeddings.dim(),
        });
    }

    let n = embeddings.rows();
    let n_val = (n as f64 * config.val_split as f64).floor() as usize;
    if n_val == 0 || n_val >= n {
        return Err(SpoofError::InsufficientData {
            reason: format!(
                "{} embeddings with val_split {} leave {} for validation and {} for training",
                n,
                config.val_split,
                n_val,
                n.saturating_sub(n_val)
            ),
        });
    }

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut permutation: Vec<usize> = (0..n).collect();
    permutation.shuffle(&mut rng);
    let (val_idx, train_idx) = permutation.split_at(n_val);
    let mut train_idx = train_idx.to_vec();

    let (model, varmap) = EmbeddingAutoencoder::init(architecture, config.seed, device)?;
    let all = model.to_tensor(embeddings)?;
    let val = all.index_select(&index_tensor(val_idx, device)?, 0)?;

    let params = ParamsAdamW {
        lr: config.learning_rate,
        weight_decay: 0.0,
        ..Default::default()
    };
    let mut optimizer = AdamW::new(varmap.all_vars(), params)?;

    info!(
        train = train_idx.len(),
        validation = n_val,
        epochs = config.epochs,
        "Training spoof autoencoder"
    );

    let mut history = Vec::with_capacity(config.epochs);
    for epoch in 1..=config.epochs {
        train_idx.shuffle(&mut rng);
        let mut loss_sum = 0.0f64;
        let mut batches = 0usize;

        for chunk in train_idx.chunks(config.batch_size) {
            let xs = all.index_select(&index_tensor(chunk, device)?, 0)?;
            let loss = candle_nn::loss::mse(&model.forward(&xs)?, &xs)?;
            optimizer.backward_step(&loss)?;
            loss_sum += loss.to_scalar::<f32>()? as f64;
            batches += 1;
        }

        let train_loss = (loss_sum / batches.max(1) as f64) as f32;
        let val_loss = candle_nn::loss::mse(&model.forward(&val)?.detach(), &val)?.to_scalar::<f32>()?;
        history.push(EpochLoss {
            epoch,
            train_loss,
            val_loss,
        });

        if epoch % 10 == 0 {
            info!(epoch, epochs = config.epochs, train_loss, val_loss, "Autoencoder epoch");
        } else {
            debug!(epoch, train_loss, val_loss, "Autoencoder epoch");
        }
    }

    let validation_errors = model.reconstruction_errors_tensor(&val)?;
    let mean = validation_errors.iter().map(|&e| e as f64).sum::<f64>() / n_val as f64;
    info!(mean_val_error = mean, "Autoencoder training complete");

    Ok(TrainingOutcome {
        model,
        validation_errors,
        history,
    })
}
