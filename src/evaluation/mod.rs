//! Biometric error rates over genuine and impostor similarity scores.
//!
//! Scores are "higher is more similar". At threshold `t` an impostor is falsely
//! accepted when `score >= t` and a genuine attempt is falsely rejected when
//! `score < t`.

pub mod error;
pub mod metrics;
pub mod report;


pub use error::{EvaluationError, EvaluationResult};
pub use metrics::{
    AccuracyAtThreshold, DetCurve, EqualErrorRate, RocCurve, accuracy_at_threshold, det_curve,
    equal_error_rate, far_frr, linspace, roc_curve,
};
pub use report::{EvaluationReport, FRR_TARGETS, OperatingPoint, ScoreStats, evaluate_scores};
