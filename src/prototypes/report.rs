use std::fmt;

use serde::Serialize;

use crate::constants::{MIN_QUALITY_TRIALS, OPTIMAL_ENROLLMENT_TRIALS};
use crate::embedding::Matrix;
use crate::scoring::scorer::cosine;

use super::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentQuality {
    /// Fewer trials than needed for a reliable estimate.
    Limited,
    Strong,
    Good,
    /// Re-enrollment suggested.
    Weak,
}

impl fmt::Display for EnrollmentQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Limited => "LIMITED",
            Self::Strong => "STRONG",
            Self::Good => "GOOD",
            Self::Weak => "WEAK",
        };
        f.write_str(s)
    }
}

/// Quality summary returned from every enrollment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrollmentReport {
    pub user_id: UserId,
    pub num_trials: usize,
    pub k: usize,
    pub degraded: bool,
    /// Mean best-prototype cosine similarity of the enrollment embeddings.
    pub prototype_strength: f32,
    pub confidence: f32,
    pub quality: EnrollmentQuality,
    pub summary: String,
}

impl EnrollmentReport {
    pub fn analyze(user_id: UserId, embeddings: &Matrix, prototypes: &Matrix, degraded: bool) -> Self {
        let num_trials = embeddings.rows();
        let prototype_strength = prototype_strength(embeddings, prototypes);
        let trial_confidence = (num_trials as f32 / OPTIMAL_ENROLLMENT_TRIALS as f32).min(1.0);
        let confidence = (trial_confidence + prototype_strength) / 2.0;

        let quality = if num_trials < MIN_QUALITY_TRIALS {
            EnrollmentQuality::Limited
        } else if prototype_strength > 0.8 {
            EnrollmentQuality::Strong
        } else if prototype_strength > 0.6 {
            EnrollmentQuality::Good
        } else {
            EnrollmentQuality::Weak
        };

        let summary = match quality {
            EnrollmentQuality::Limited => format!(
                "Limited trials ({}), may affect authentication accuracy",
                num_trials
            ),
            EnrollmentQuality::Strong => format!(
                "Strong prototype created ({:.3}), excellent quality",
                prototype_strength
            ),
            EnrollmentQuality::Good => format!(
                "Good prototype created ({:.3}), good quality",
                prototype_strength
            ),
            EnrollmentQuality::Weak => format!(
                "Weak prototype created ({:.3}), may need re-enrollment",
                prototype_strength
            ),
        };

        Self {
            user_id,
            num_trials,
            k: prototypes.rows(),
            degraded,
            prototype_strength,
            confidence,
            quality,
            summary,
        }
    }
}

fn prototype_strength(embeddings: &Matrix, prototypes: &Matrix) -> f32 {
    if embeddings.is_empty() || prototypes.is_empty() {
        return 0.0;
    }
    let total: f64 = embeddings
        .iter_rows()
        .map(|e| {
            prototypes
                .iter_rows()
                .map(|p| cosine(e, p))
                .fold(f32::NEG_INFINITY, f32::max) as f64
        })
        .sum();
    (total / embeddings.rows() as f64) as f32
}
