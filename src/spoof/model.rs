//! Embedding autoencoder on candle.
//!
//! Encoder `D → H → L` and decoder `L → H → D`, ReLU between layers, linear output.

use std::collections::HashMap;

use candle_core::{DType, Device, Tensor, Var};
use candle_nn::{Linear, Module, VarBuilder, VarMap};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::config::AutoencoderConfig;
use super::error::{SpoofError, SpoofResult};
use crate::embedding::Matrix;

/// Tensor names and `(out, in)` shapes of every linear layer, in forward order.
pub(crate) fn layer_shapes(config: &AutoencoderConfig) -> [(&'static str, usize, usize); 4] {
    let AutoencoderConfig {
        input_dim: d,
        hidden_dim: h,
        latent_dim: l,
    } = *config;
    [
        ("encoder.fc1", h, d),
        ("encoder.fc2", l, h),
        ("decoder.fc1", h, l),
        ("decoder.fc2", d, h),
    ]
}

#[derive(Debug, Clone)]
pub struct EmbeddingAutoencoder {
    config: AutoencoderConfig,
    layers: [Linear; 4],
    device: Device,
}

impl EmbeddingAutoencoder {
    /// Fresh model with seeded uniform `±1/√fan_in` weights.
    ///
    /// Returns the `VarMap` holding the trainable variables.
    pub fn init(
        config: AutoencoderConfig,
        seed: u64,
        device: &Device,
    ) -> SpoofResult<(Self, VarMap)> {
        config.validate()?;
        let varmap = VarMap::new();
        let mut rng = StdRng::seed_from_u64(seed);

        {
            let mut data = varmap.data().lock().map_err(|_| {
                SpoofError::Candle(candle_core::Error::Msg("variable map lock poisoned".into()))
            })?;
            for (name, out_dim, in_dim) in layer_shapes(&config) {
                let bound = 1.0 / (in_dim as f32).sqrt();
                let weight: Vec<f32> = (0..out_dim * in_dim)
                    .map(|_| rng.gen_range(-bound..bound))
                    .collect();
                let bias: Vec<f32> = (0..out_dim).map(|_| rng.gen_range(-bound..bound)).collect();
                data.insert(
                    format!("{name}.weight"),
                    Var::from_tensor(&Tensor::from_vec(weight, (out_dim, in_dim), device)?)?,
                );
                data.insert(
                    format!("{name}.bias"),
                    Var::from_tensor(&Tensor::from_vec(bias, out_dim, device)?)?,
                );
            }
        }

        let vb = VarBuilder::from_varmap(&varmap, DType::F32, device);
        let model = Self::build(config, vb, device)?;
        Ok((model, varmap))
    }

    /// Rebuilds a model from named weight tensors, checking every shape first.
    pub fn from_tensors(
        config: AutoencoderConfig,
        tensors: HashMap<String, Tensor>,
        device: &Device,
    ) -> SpoofResult<Self> {
        config.validate()?;
        for (name, out_dim, in_dim) in layer_shapes(&config) {
            for (suffix, expected) in [("weight", vec![out_dim, in_dim]), ("bias", vec![out_dim])] {
                let key = format!("{name}.{suffix}");
                let tensor = tensors.get(&key).ok_or_else(|| SpoofError::ArchitectureMismatch {
                    reason: format!("missing tensor {}", key),
                })?;
                if tensor.dims() != expected.as_slice() {
                    return Err(SpoofError::ArchitectureMismatch {
                        reason: format!(
                            "{} has shape {:?}, architecture requires {:?}",
                            key,
                            tensor.dims(),
                            expected
                        ),
                    });
                }
            }
        }
        if tensors.len() != 8 {
            return Err(SpoofError::ArchitectureMismatch {
                reason: format!("expected 8 tensors, found {}", tensors.len()),
            });
        }

        let vb = VarBuilder::from_tensors(tensors, DType::F32, device);
        Self::build(config, vb, device)
    }

    fn build(config: AutoencoderConfig, vb: VarBuilder, device: &Device) -> SpoofResult<Self> {
        let [l0, l1, l2, l3] = layer_shapes(&config);
        let layer = |(name, out_dim, in_dim): (&str, usize, usize)| {
            candle_nn::linear(in_dim, out_dim, vb.pp(name))
        };
        Ok(Self {
            config,
            layers: [layer(l0)?, layer(l1)?, layer(l2)?, layer(l3)?],
            device: device.clone(),
        })
    }

    pub fn config(&self) -> &AutoencoderConfig {
        &self.config
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    /// Named weight tensors (`encoder.fc1.weight`, ...), detached from the graph.
    pub fn named_tensors(&self) -> Vec<(String, Tensor)> {
        let mut out = Vec::with_capacity(8);
        for ((name, _, _), layer) in layer_shapes(&self.config).into_iter().zip(&self.layers) {
            out.push((format!("{name}.weight"), layer.weight().detach()));
            if let Some(bias) = layer.bias() {
                out.push((format!("{name}.bias"), bias.detach()));
            }
        }
        out
    }

    /// Uploads a matrix as a `rows × D` tensor.
    pub fn to_tensor(&self, embeddings: &Matrix) -> SpoofResult<Tensor> {
        if embeddings.dim() != self.config.input_dim {
            return Err(SpoofError::DimensionMismatch {
                expected: self.config.input_dim,
                actual: embeddings.dim(),
            });
        }
        Ok(Tensor::from_slice(
            embeddings.as_slice(),
            (embeddings.rows(), embeddings.dim()),
            &self.device,
        )?)
    }

    /// Per-row mean squared reconstruction error, without gradient tracking.
    pub fn reconstruction_errors_tensor(&self, xs: &Tensor) -> SpoofResult<Vec<f32>> {
        let xs = xs.detach();
        let recon = self.forward(&xs)?.detach();
        let errors = (xs - recon)?.sqr()?.mean(1)?;
        Ok(errors.to_vec1::<f32>()?)
    }
}

impl Module for EmbeddingAutoencoder {
    fn forward(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        let [enc1, enc2, dec1, dec2] = &self.layers;
        let latent = enc2.forward(&enc1.forward(xs)?.relu()?)?.relu()?;
        dec2.forward(&dec1.forward(&latent)?.relu()?)
    }
}
