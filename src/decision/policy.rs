use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::constants::{DEFAULT_AUTH_THRESHOLD, DEFAULT_TIER_HIGH, DEFAULT_TIER_MEDIUM};

use super::error::{DecisionError, DecisionResult};
use super::types::{ConfidenceTier, Decision, DecisionInput, DecisionOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionConfig {
    /// Minimum calibrated probability to authenticate (inclusive).
    pub auth_threshold: f32,
    /// `p > tier_high` or `p < 1 - tier_high` is HIGH.
    pub tier_high: f64,
    /// `p > tier_medium` or `p < 1 - tier_medium` is MEDIUM.
    pub tier_medium: f64,
}

impl Default for DecisionConfig {
    fn default() -> Self {
        Self {
            auth_threshold: DEFAULT_AUTH_THRESHOLD,
            tier_high: DEFAULT_TIER_HIGH,
            tier_medium: DEFAULT_TIER_MEDIUM,
        }
    }
}

impl DecisionConfig {
    pub fn validate(&self) -> DecisionResult<()> {
        if !(0.0..=1.0).contains(&self.auth_threshold) {
            return Err(DecisionError::InvalidConfig {
                reason: format!("auth_threshold {} outside [0, 1]", self.auth_threshold),
            });
        }
        if !(0.5 < self.tier_medium && self.tier_medium <= self.tier_high && self.tier_high < 1.0) {
            return Err(DecisionError::InvalidConfig {
                reason: format!(
                    "tier bounds must satisfy 0.5 < medium ({}) <= high ({}) < 1",
                    self.tier_medium, self.tier_high
                ),
            });
        }
        Ok(())
    }
}

/// Upper and mirrored lower bound in probability precision.
///
/// The mirror is taken before narrowing so `0.8` yields exactly `0.2f32`.
fn tier_bounds(bound: f64) -> (f32, f32) {
    (bound as f32, (1.0 - bound) as f32)
}

/// Stateless verdict rule: `probability >= auth_threshold && !spoof_flag`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DecisionPolicy {
    config: DecisionConfig,
}

impl DecisionPolicy {
    pub fn new(config: DecisionConfig) -> DecisionResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DecisionConfig {
        &self.config
    }

    pub fn tier(&self, probability: f32, spoof_flag: bool) -> ConfidenceTier {
        let p = probability;
        let (high_above, high_below) = tier_bounds(self.config.tier_high);
        let (medium_above, medium_below) = tier_bounds(self.config.tier_medium);
        if spoof_flag || p > high_above || p < high_below {
            ConfidenceTier::High
        } else if p > medium_above || p < medium_below {
            ConfidenceTier::Medium
        } else {
            ConfidenceTier::Low
        }
    }

    pub fn decide(&self, input: &DecisionInput) -> Decision {
        let DecisionInput {
            similarity: sim,
            probability: prob,
            spoof_flag,
            spoof_score,
        } = *input;

        // Spoof is an absolute veto.
        let authenticated = !spoof_flag && prob >= self.config.auth_threshold;
        let tier = self.tier(prob, spoof_flag);

        let outcome = if spoof_flag {
            DecisionOutcome::Spoofed
        } else if authenticated {
            if prob > 0.9 {
                DecisionOutcome::ExcellentMatch
            } else if prob > 0.7 {
                DecisionOutcome::GoodMatch
            } else if prob > 0.5 {
                DecisionOutcome::AcceptableMatch
            } else {
                DecisionOutcome::WeakMatch
            }
        } else if prob < 0.1 {
            DecisionOutcome::VeryPoorMatch
        } else if prob < 0.3 {
            DecisionOutcome::PoorMatch
        } else if prob < 0.5 {
            DecisionOutcome::BelowThreshold
        } else {
            DecisionOutcome::UncertainIdentity
        };

        let scores = format!("prob={:.3}, sim={:.3}", prob, sim);
        let reason = match outcome {
            DecisionOutcome::Spoofed => match spoof_score {
                Some(s) => format!(
                    "REJECTED: Spoof/replay attack detected (spoof_score={:.6}, {}). Signal appears synthetic or replayed.",
                    s, scores
                ),
                None => format!(
                    "REJECTED: Spoof/replay attack detected ({}). Signal appears synthetic or replayed.",
                    scores
                ),
            },
            DecisionOutcome::ExcellentMatch => format!(
                "AUTHENTICATED: Excellent match ({}). Brain patterns strongly match enrolled prototype.",
                scores
            ),
            DecisionOutcome::GoodMatch => format!(
                "AUTHENTICATED: Good match ({}). Brain patterns match enrolled prototype.",
                scores
            ),
            DecisionOutcome::AcceptableMatch => format!(
                "AUTHENTICATED: Acceptable match ({}). Brain patterns sufficiently match prototype.",
                scores
            ),
            DecisionOutcome::WeakMatch => format!(
                "AUTHENTICATED: Weak match ({}). Consider re-enrollment for better accuracy.",
                scores
            ),
            DecisionOutcome::VeryPoorMatch => format!(
                "REJECTED: Very poor match ({}). Brain patterns completely different, likely impostor.",
                scores
            ),
            DecisionOutcome::PoorMatch => format!(
                "REJECTED: Poor match ({}). Brain patterns significantly different, possible impostor.",
                scores
            ),
            DecisionOutcome::BelowThreshold => format!(
                "REJECTED: Below threshold ({}). Brain patterns don't match sufficiently.",
                scores
            ),
            DecisionOutcome::UncertainIdentity => format!(
                "REJECTED: Uncertain identity ({}). Patterns similar but not confident enough.",
                scores
            ),
        };

        debug!(
            authenticated,
            tier = %tier,
            probability = prob,
            similarity = sim,
            spoof = spoof_flag,
            "Decision"
        );

        Decision {
            authenticated,
            tier,
            outcome,
            reason,
        }
    }
}

/// Decides with default tier bounds and the given threshold.
pub fn decide(
    similarity: f32,
    probability: f32,
    spoof_flag: bool,
    auth_threshold: f32,
) -> Decision {
    let policy = DecisionPolicy {
        config: DecisionConfig {
            auth_threshold,
            ..DecisionConfig::default()
        },
    };
    policy.decide(&DecisionInput {
        similarity,
        probability,
        spoof_flag,
        spoof_score: None,
    })
}
