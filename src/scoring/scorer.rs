use serde::Serialize;
use tracing::debug;

use crate::constants::COSINE_EPSILON;
use crate::embedding::Matrix;
use crate::embedding::vector::dot;

use super::aggregation::Aggregation;
use super::error::{ScoringError, ScoringResult};

/// `a·b / (‖a‖‖b‖ + ε)`, accumulated in `f64`. Callers guarantee equal lengths.
#[inline]
pub(crate) fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let num = dot(a, b);
    let denom = dot(a, a).sqrt() * dot(b, b).sqrt() + COSINE_EPSILON;
    (num / denom) as f32
}

/// Cosine similarity between two embeddings of equal dimension.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> ScoringResult<f32> {
    if a.len() != b.len() {
        return Err(ScoringError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(cosine(a, b))
}

fn check_probe(probe: &[f32], prototypes: &Matrix) -> ScoringResult<()> {
    if prototypes.is_empty() {
        return Err(ScoringError::NoPrototypes);
    }
    if probe.len() != prototypes.dim() {
        return Err(ScoringError::DimensionMismatch {
            expected: prototypes.dim(),
            actual: probe.len(),
        });
    }
    if let Some(i) = probe.iter().position(|v| !v.is_finite()) {
        return Err(ScoringError::InvalidInput {
            reason: format!("probe contains a non-finite value at index {}", i),
        });
    }
    Ok(())
}

/// Similarity of `probe` to every prototype row, in row order.
pub fn prototype_similarities(probe: &[f32], prototypes: &Matrix) -> ScoringResult<Vec<f32>> {
    check_probe(probe, prototypes)?;
    Ok(prototypes.iter_rows().map(|row| cosine(probe, row)).collect())
}

/// Aggregated similarity of `probe` against `prototypes`.
pub fn score(probe: &[f32], prototypes: &Matrix, aggregation: Aggregation) -> ScoringResult<f32> {
    let sims = prototype_similarities(probe, prototypes)?;
    aggregation.apply(&sims).ok_or(ScoringError::NoPrototypes)
}

/// String-configured variant of [`score`]; unknown modes fail with `InvalidInput`.
pub fn score_vs_prototypes(
    probe: &[f32],
    prototypes: &Matrix,
    aggregation: &str,
) -> ScoringResult<f32> {
    let aggregation: Aggregation = aggregation.parse()?;
    score(probe, prototypes, aggregation)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
/// Per-prototype detail behind an aggregated score.
pub struct ScoreBreakdown {
    pub similarities: Vec<f32>,
    pub aggregation: Aggregation,
    pub score: f32,
    /// Row with the highest similarity.
    pub best_prototype: usize,
}

/// Scorer bound to one aggregation policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityScorer {
    aggregation: Aggregation,
}

impl SimilarityScorer {
    pub fn new(aggregation: Aggregation) -> Self {
        Self { aggregation }
    }

    pub fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    pub fn score(&self, probe: &[f32], prototypes: &Matrix) -> ScoringResult<f32> {
        let s = score(probe, prototypes, self.aggregation)?;
        debug!(
            score = s,
            aggregation = %self.aggregation,
            k = prototypes.rows(),
            "Scored probe against prototypes"
        );
        Ok(s)
    }

    pub fn breakdown(&self, probe: &[f32], prototypes: &Matrix) -> ScoringResult<ScoreBreakdown> {
        let similarities = prototype_similarities(probe, prototypes)?;
        let score = self
            .aggregation
            .apply(&similarities)
            .ok_or(ScoringError::NoPrototypes)?;
        let best_prototype = similarities
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap_or(0);

        Ok(ScoreBreakdown {
            similarities,
            aggregation: self.aggregation,
            score,
            best_prototype,
        })
    }
}
