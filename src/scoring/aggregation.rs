use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ScoringError;

/// How per-prototype similarities collapse into one score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    #[default]
    Max,
    Mean,
    Min,
}

impl Aggregation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Max => "max",
            Self::Mean => "mean",
            Self::Min => "min",
        }
    }

    /// Collapses `similarities`. Returns `None` when empty.
    pub fn apply(&self, similarities: &[f32]) -> Option<f32> {
        if similarities.is_empty() {
            return None;
        }
        let out = match self {
            Self::Max => similarities.iter().copied().fold(f32::NEG_INFINITY, f32::max),
            Self::Min => similarities.iter().copied().fold(f32::INFINITY, f32::min),
            Self::Mean => {
                let sum: f64 = similarities.iter().map(|&s| s as f64).sum();
                (sum / similarities.len() as f64) as f32
            }
        };
        Some(out)
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Aggregation {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max" => Ok(Self::Max),
            "mean" => Ok(Self::Mean),
            "min" => Ok(Self::Min),
            other => Err(ScoringError::InvalidInput {
                reason: format!("unknown aggregation '{}': expected max, mean or min", other),
            }),
        }
    }
}
