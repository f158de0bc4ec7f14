use serde::Serialize;

use super::error::{EvaluationError, EvaluationResult};
use super::metrics::{
    AccuracyAtThreshold, EqualErrorRate, accuracy_at_threshold, equal_error_rate, far_frr, linspace,
};

/// FRR operating points reported alongside the EER.
pub const FRR_TARGETS: [f64; 3] = [0.01, 0.05, 0.10];

const TARGET_SWEEP_POINTS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreStats {
    pub count: usize,
    pub mean: f64,
    /// Population standard deviation.
    pub std: f64,
    pub min: f64,
    pub max: f64,
}

impl ScoreStats {
    pub fn from_scores(scores: &[f32]) -> Option<Self> {
        if scores.is_empty() {
            return None;
        }
        let n = scores.len() as f64;
        let mean = scores.iter().map(|&s| s as f64).sum::<f64>() / n;
        let var = scores
            .iter()
            .map(|&s| (s as f64 - mean).powi(2))
            .sum::<f64>()
            / n;
        let (min, max) = scores
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &s| {
                (lo.min(s as f64), hi.max(s as f64))
            });
        Some(Self {
            count: scores.len(),
            mean,
            std: var.sqrt(),
            min,
            max,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OperatingPoint {
    pub target_frr: f64,
    pub frr: f64,
    pub far: f64,
    pub threshold: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub genuine: ScoreStats,
    pub impostor: ScoreStats,
    pub eer: EqualErrorRate,
    pub at_eer: AccuracyAtThreshold,
    pub threshold: f64,
    pub at_threshold: AccuracyAtThreshold,
    pub far_at_frr: Vec<OperatingPoint>,
}

/// Sweeps the genuine score range and picks, per target, the threshold whose
/// FRR is closest to it.
fn far_at_frr_targets(genuine: &[f32], impostor: &[f32]) -> EvaluationResult<Vec<OperatingPoint>> {
    let stats =
        ScoreStats::from_scores(genuine).ok_or(EvaluationError::EmptyScores { which: "genuine" })?;
    let thresholds = linspace(stats.min, stats.max, TARGET_SWEEP_POINTS);
    let (far, frr) = far_frr(genuine, impostor, &thresholds)?;

    Ok(FRR_TARGETS
        .iter()
        .map(|&target| {
            let idx = frr
                .iter()
                .enumerate()
                .fold((0, f64::INFINITY), |best, (i, r)| {
                    let gap = (r - target).abs();
                    if gap < best.1 { (i, gap) } else { best }
                })
                .0;
            OperatingPoint {
                target_frr: target,
                frr: frr[idx],
                far: far[idx],
                threshold: thresholds[idx],
            }
        })
        .collect())
}

/// Full verification summary for one score set at the given decision threshold.
pub fn evaluate_scores(
    genuine: &[f32],
    impostor: &[f32],
    threshold: f64,
) -> EvaluationResult<EvaluationReport> {
    let genuine_stats =
        ScoreStats::from_scores(genuine).ok_or(EvaluationError::EmptyScores { which: "genuine" })?;
    let impostor_stats = ScoreStats::from_scores(impostor)
        .ok_or(EvaluationError::EmptyScores { which: "impostor" })?;
    let eer = equal_error_rate(genuine, impostor)?;
    let at_eer = accuracy_at_threshold(genuine, impostor, eer.threshold)?;
    let at_threshold = accuracy_at_threshold(genuine, impostor, threshold)?;
    let far_at_frr = far_at_frr_targets(genuine, impostor)?;

    tracing::info!(
        eer = eer.eer,
        eer_threshold = eer.threshold,
        accuracy = at_threshold.accuracy,
        "Evaluation complete"
    );

    Ok(EvaluationReport {
        genuine: genuine_stats,
        impostor: impostor_stats,
        eer,
        at_eer,
        threshold,
        at_threshold,
        far_at_frr,
    })
}
