//! Platt scaling: L2-regularised 1-D logistic regression fit by Newton's method.
//!
//! Minimises `0.5·w² + C·Σ logloss(σ(w·s + b), y)`. The intercept is not penalised.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{CalibrationError, CalibrationResult};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattConfig {
    /// Inverse regularisation strength.
    pub c: f64,
    pub max_iter: usize,
    /// Stop once the gradient's max-norm drops below this.
    pub tol: f64,
}

impl Default for PlattConfig {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_iter: 1000,
            tol: 1e-10,
        }
    }
}

/// Fitted slope and intercept. `p = σ(slope·s + intercept)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattModel {
    pub slope: f64,
    pub intercept: f64,
}

#[inline]
fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// `log(1 + exp(z))` without overflow.
#[inline]
fn softplus(z: f64) -> f64 {
    if z > 0.0 {
        z + (-z).exp().ln_1p()
    } else {
        z.exp().ln_1p()
    }
}

impl PlattModel {
    pub fn predict(&self, score: f64) -> f64 {
        sigmoid(self.slope * score + self.intercept)
    }

    pub fn fit(scores: &[f64], labels: &[bool], config: &PlattConfig) -> CalibrationResult<Self> {
        let positives = labels.iter().filter(|&&l| l).count();
        if positives == 0 || positives == labels.len() {
            return Err(CalibrationError::InvalidInput {
                reason: "logistic calibration needs both genuine and impostor samples".to_string(),
            });
        }

        let c = config.c;
        let objective = |w: f64, b: f64| -> f64 {
            let loss: f64 = scores
                .iter()
                .zip(labels)
                .map(|(&s, &y)| {
                    let z = w * s + b;
                    if y { softplus(-z) } else { softplus(z) }
                })
                .sum();
            0.5 * w * w + c * loss
        };

        let (mut w, mut b) = (0.0f64, 0.0f64);
        let mut current = objective(w, b);
        let mut iterations = 0;

        for iter in 0..config.max_iter {
            iterations = iter + 1;
            let (mut gw, mut gb) = (w, 0.0);
            let (mut hww, mut hwb, mut hbb) = (1.0, 0.0, 0.0);
            for (&s, &y) in scores.iter().zip(labels) {
                let p = sigmoid(w * s + b);
                let r = p - if y { 1.0 } else { 0.0 };
                let v = p * (1.0 - p);
                gw += c * r * s;
                gb += c * r;
                hww += c * v * s * s;
                hwb += c * v * s;
                hbb += c * v;
            }

            if gw.abs().max(gb.abs()) < config.tol {
                break;
            }

            hbb += 1e-12;
            let det = hww * hbb - hwb * hwb;
            let (dw, db) = if det > 0.0 {
                ((hbb * gw - hwb * gb) / det, (hww * gb - hwb * gw) / det)
            } else {
                (gw, gb)
            };

            // Backtracking keeps each step a descent step.
            let mut step = 1.0;
            let mut improved = false;
            while step > 1e-10 {
                let (nw, nb) = (w - step * dw, b - step * db);
                let candidate = objective(nw, nb);
                if candidate <= current {
                    improved = candidate < current;
                    w = nw;
                    b = nb;
                    current = candidate;
                    break;
                }
                step *= 0.5;
            }
            if !improved {
                break;
            }
        }

        debug!(slope = w, intercept = b, iterations, "Fitted logistic calibrator");
        Ok(Self {
            slope: w,
            intercept: b,
        })
    }
}
