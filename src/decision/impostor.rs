use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImpostorKind {
    /// Synthetic or replayed signal.
    ReplayAttack,
    /// Unrelated neural patterns.
    Random,
    /// Some resemblance, still clearly different.
    Targeted,
    /// Close to the enrolled user, hardest to separate.
    Sophisticated,
}

impl fmt::Display for ImpostorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ReplayAttack => "REPLAY_ATTACK",
            Self::Random => "RANDOM",
            Self::Targeted => "TARGETED",
            Self::Sophisticated => "SOPHISTICATED",
        })
    }
}

/// Post-hoc classification of a rejected attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpostorProfile {
    pub kind: ImpostorKind,
    pub detection_confidence: f32,
    pub anomalies: Vec<String>,
    pub analysis: String,
}

impl ImpostorProfile {
    pub fn analyze(similarity: f32, probability: f32, spoof_flag: bool) -> Self {
        let (kind, detection_confidence) = if spoof_flag {
            (ImpostorKind::ReplayAttack, 0.95)
        } else if probability < 0.05 {
            (ImpostorKind::Random, 0.95)
        } else if probability < 0.2 {
            (ImpostorKind::Targeted, 0.85)
        } else {
            (ImpostorKind::Sophisticated, 0.65)
        };

        let mut anomalies = Vec::new();
        if spoof_flag {
            anomalies.push("Synthetic signal detected".to_string());
        }
        if similarity < 0.3 {
            anomalies.push("Very different neural patterns".to_string());
        }

        Self {
            kind,
            detection_confidence,
            anomalies,
            analysis: format!(
                "Similarity: {:.3}, Probability: {:.3}, Expected genuine: >0.7",
                similarity, probability
            ),
        }
    }
}
