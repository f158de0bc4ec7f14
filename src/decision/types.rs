use std::fmt;

use serde::{Deserialize, Serialize};

/// Confidence in the verdict, in either direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        })
    }
}

/// Reasoning bucket behind a verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionOutcome {
    Spoofed,
    ExcellentMatch,
    GoodMatch,
    AcceptableMatch,
    WeakMatch,
    VeryPoorMatch,
    PoorMatch,
    BelowThreshold,
    UncertainIdentity,
}

/// Signals the policy decides on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionInput {
    pub similarity: f32,
    pub probability: f32,
    pub spoof_flag: bool,
    /// Reconstruction error, quoted in the reason when flagged.
    pub spoof_score: Option<f32>,
}

/// Final verdict with tier and audit-ready reason.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub authenticated: bool,
    pub tier: ConfidenceTier,
    pub outcome: DecisionOutcome,
    pub reason: String,
}
