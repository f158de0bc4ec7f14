use serde::Serialize;

use super::calibrator::Calibrator;
use super::error::{CalibrationError, CalibrationResult};

/// Reliability diagram data over `n_bins` equal-width probability bins.
///
/// Bins are `[lo, hi)` except the last, which also holds probability `1.0`.
/// Empty bins report `NaN` accuracy and confidence.
#[derive(Debug, Clone, Serialize)]
pub struct ReliabilityCurve {
    pub bin_centers: Vec<f32>,
    /// Fraction of genuine labels per bin.
    pub bin_accuracy: Vec<f32>,
    /// Mean predicted probability per bin.
    pub bin_confidence: Vec<f32>,
    pub bin_counts: Vec<usize>,
}

impl ReliabilityCurve {
    pub fn from_probabilities(
        probabilities: &[f32],
        labels: &[bool],
        n_bins: usize,
    ) -> CalibrationResult<Self> {
        if probabilities.len() != labels.len() {
            return Err(CalibrationError::LengthMismatch {
                scores: probabilities.len(),
                labels: labels.len(),
            });
        }
        if n_bins == 0 {
            return Err(CalibrationError::InvalidInput {
                reason: "n_bins must be at least 1".to_string(),
            });
        }

        let width = 1.0 / n_bins as f64;
        let mut hits = vec![0usize; n_bins];
        let mut counts = vec![0usize; n_bins];
        let mut conf_sum = vec![0.0f64; n_bins];

        for (&p, &label) in probabilities.iter().zip(labels) {
            let p = p as f64;
            if !(0.0..=1.0).contains(&p) {
                continue;
            }
            let mut bin = ((p / width) as usize).min(n_bins - 1);
            // Snap to the edges `i * width` so boundary values land where a direct comparison puts them.
            while bin + 1 < n_bins && p >= (bin + 1) as f64 * width {
                bin += 1;
            }
            while bin > 0 && p < bin as f64 * width {
                bin -= 1;
            }
            counts[bin] += 1;
            conf_sum[bin] += p;
            if label {
                hits[bin] += 1;
            }
        }

        let bin_centers = (0..n_bins)
            .map(|i| ((i as f64 + 0.5) * width) as f32)
            .collect();
        let bin_accuracy = hits
            .iter()
            .zip(&counts)
            .map(|(&h, &c)| if c == 0 { f32::NAN } else { (h as f64 / c as f64) as f32 })
            .collect();
        let bin_confidence = conf_sum
            .iter()
            .zip(&counts)
            .map(|(&s, &c)| if c == 0 { f32::NAN } else { (s / c as f64) as f32 })
            .collect();

        Ok(Self {
            bin_centers,
            bin_accuracy,
            bin_confidence,
            bin_counts: counts,
        })
    }

    /// Count-weighted mean |accuracy − confidence| over non-empty bins.
    pub fn expected_calibration_error(&self) -> f32 {
        let total: usize = self.bin_counts.iter().sum();
        if total == 0 {
            return f32::NAN;
        }
        let ece: f64 = self
            .bin_counts
            .iter()
            .zip(self.bin_accuracy.iter().zip(&self.bin_confidence))
            .filter(|(c, _)| **c > 0)
            .map(|(&c, (&acc, &conf))| c as f64 * (acc as f64 - conf as f64).abs())
            .sum();
        (ece / total as f64) as f32
    }
}

/// Calibrates `scores` and bins the resulting probabilities against `labels`.
pub fn evaluate(
    calibrator: &Calibrator,
    scores: &[f32],
    labels: &[bool],
    n_bins: usize,
) -> CalibrationResult<ReliabilityCurve> {
    if scores.len() != labels.len() {
        return Err(CalibrationError::LengthMismatch {
            scores: scores.len(),
            labels: labels.len(),
        });
    }
    let probabilities = calibrator.apply(scores)?;
    ReliabilityCurve::from_probabilities(&probabilities, labels, n_bins)
}
