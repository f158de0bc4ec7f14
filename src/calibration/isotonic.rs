//! Isotonic calibration: pool-adjacent-violators fit, piecewise-linear prediction.
//!
//! Inputs outside the fitted score range clip to the nearest endpoint.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{CalibrationError, CalibrationResult};

/// Non-decreasing step function over the distinct training scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IsotonicModel {
    /// Strictly increasing knot positions.
    pub x: Vec<f64>,
    /// Non-decreasing fitted values in `[0, 1]`.
    pub y: Vec<f64>,
}

struct Block {
    sum: f64,
    weight: f64,
    /// Number of distinct-score knots pooled into this block.
    len: usize,
}

impl Block {
    fn value(&self) -> f64 {
        self.sum / self.weight
    }
}

impl IsotonicModel {
    pub fn fit(scores: &[f64], labels: &[bool]) -> CalibrationResult<Self> {
        if scores.is_empty() {
            return Err(CalibrationError::InvalidInput {
                reason: "isotonic calibration needs at least one sample".to_string(),
            });
        }

        let mut pairs: Vec<(f64, f64)> = scores
            .iter()
            .zip(labels)
            .map(|(&s, &l)| (s, if l { 1.0 } else { 0.0 }))
            .collect();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));

        // Ties collapse to one knot carrying the mean label and the tie count as weight.
        let mut x: Vec<f64> = Vec::new();
        let mut blocks: Vec<Block> = Vec::new();
        for (s, label) in pairs {
            match (x.last(), blocks.last_mut()) {
                (Some(&last), Some(block)) if last == s => {
                    block.sum += label;
                    block.weight += 1.0;
                }
                _ => {
                    x.push(s);
                    blocks.push(Block {
                        sum: label,
                        weight: 1.0,
                        len: 1,
                    });
                }
            }
        }

        let mut pooled: Vec<Block> = Vec::with_capacity(blocks.len());
        for block in blocks {
            pooled.push(block);
            while pooled.len() >= 2
                && pooled[pooled.len() - 2].value() > pooled[pooled.len() - 1].value()
            {
                if let Some(last) = pooled.pop()
                    && let Some(prev) = pooled.last_mut()
                {
                    prev.sum += last.sum;
                    prev.weight += last.weight;
                    prev.len += last.len;
                }
            }
        }

        let y: Vec<f64> = pooled
            .iter()
            .flat_map(|b| std::iter::repeat_n(b.value().clamp(0.0, 1.0), b.len))
            .collect();

        debug!(knots = x.len(), blocks = pooled.len(), "Fitted isotonic calibrator");
        Ok(Self { x, y })
    }

    pub fn predict(&self, score: f64) -> f64 {
        let n = self.x.len();
        if n == 0 {
            return 0.5;
        }
        if n == 1 || score <= self.x[0] {
            return self.y[0];
        }
        if score >= self.x[n - 1] {
            return self.y[n - 1];
        }

        let hi = self.x.partition_point(|&k| k <= score);
        let lo = hi - 1;
        let (x0, x1) = (self.x[lo], self.x[hi]);
        let (y0, y1) = (self.y[lo], self.y[hi]);
        let t = (score - x0) / (x1 - x0);
        (y0 + t * (y1 - y0)).clamp(0.0, 1.0)
    }

    pub(crate) fn validate(&self) -> CalibrationResult<()> {
        let bad = |reason: &str| {
            Err(CalibrationError::InvalidInput {
                reason: format!("malformed isotonic calibrator: {}", reason),
            })
        };
        if self.x.is_empty() || self.x.len() != self.y.len() {
            return bad("knot arrays are empty or differ in length");
        }
        if self.x.iter().any(|v| !v.is_finite()) || self.x.windows(2).any(|w| w[0] >= w[1]) {
            return bad("knots are not strictly increasing");
        }
        if self.y.windows(2).any(|w| w[0] > w[1]) || self.y.iter().any(|v| !(0.0..=1.0).contains(v)) {
            return bad("values are not non-decreasing within [0, 1]");
        }
        Ok(())
    }
}
