use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::decision::{ConfidenceTier, Decision, DecisionOutcome, ImpostorProfile};
use crate::hashing::embedding_fingerprint;
use crate::prototypes::UserId;

/// Which optional models were missing when a decision was made.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReducedMode {
    /// Probability fixed at 0.5.
    pub calibrator_missing: bool,
    /// Spoof flag fixed at false.
    pub spoof_detector_missing: bool,
}

impl ReducedMode {
    pub fn any(&self) -> bool {
        self.calibrator_missing || self.spoof_detector_missing
    }
}

/// Record of one authentication attempt, handed to the audit layer as-is.
#[derive(Debug, Clone, Serialize)]
pub struct AuthenticationEvent {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub user_id: UserId,
    pub probe: Vec<f32>,
    pub probe_fingerprint: String,
    pub similarity: f32,
    /// Index of the best-matching prototype row.
    pub best_prototype: usize,
    pub probability: f32,
    pub reconstruction_error: Option<f32>,
    pub spoof_threshold: Option<f64>,
    pub spoof_flag: bool,
    pub authenticated: bool,
    pub tier: ConfidenceTier,
    pub outcome: DecisionOutcome,
    pub reason: String,
    pub reduced_mode: ReducedMode,
    /// Present only for rejected attempts.
    pub impostor_profile: Option<ImpostorProfile>,
}

pub(crate) struct EventParts {
    pub user_id: UserId,
    pub probe: Vec<f32>,
    pub similarity: f32,
    pub best_prototype: usize,
    pub probability: f32,
    pub reconstruction_error: Option<f32>,
    pub spoof_threshold: Option<f64>,
    pub spoof_flag: bool,
    pub reduced_mode: ReducedMode,
}

impl AuthenticationEvent {
    pub(crate) fn new(parts: EventParts, decision: Decision) -> Self {
        let impostor_profile = (!decision.authenticated).then(|| {
            ImpostorProfile::analyze(parts.similarity, parts.probability, parts.spoof_flag)
        });
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            user_id: parts.user_id,
            probe_fingerprint: embedding_fingerprint(&parts.probe),
            probe: parts.probe,
            similarity: parts.similarity,
            best_prototype: parts.best_prototype,
            probability: parts.probability,
            reconstruction_error: parts.reconstruction_error,
            spoof_threshold: parts.spoof_threshold,
            spoof_flag: parts.spoof_flag,
            authenticated: decision.authenticated,
            tier: decision.tier,
            outcome: decision.outcome,
            reason: decision.reason,
            reduced_mode: parts.reduced_mode,
            impostor_profile,
        }
    }
}
