use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::storage::{ArtifactKind, read_artifact, write_artifact};

use super::error::{CalibrationError, CalibrationResult};
use super::isotonic::IsotonicModel;
use super::platt::{PlattConfig, PlattModel};

/// Which calibrator family to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalibrationMethod {
    /// Logistic (Platt) scaling.
    #[default]
    Platt,
    Isotonic,
}

impl fmt::Display for CalibrationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Platt => f.write_str("platt"),
            Self::Isotonic => f.write_str("isotonic"),
        }
    }
}

impl FromStr for CalibrationMethod {
    type Err = CalibrationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "platt" => Ok(Self::Platt),
            "isotonic" => Ok(Self::Isotonic),
            other => Err(CalibrationError::InvalidInput {
                reason: format!(
                    "unknown calibration method '{}': expected platt or isotonic",
                    other
                ),
            }),
        }
    }
}

/// Fitted score → probability mapping.
///
/// Serialized as JSON with a `type` discriminator (`parametric` or `monotonic`).
/// Any other discriminator fails to load with [`CalibrationError::InvalidInput`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Calibrator {
    Parametric(PlattModel),
    Monotonic(IsotonicModel),
}

fn check_fit_input(scores: &[f32], labels: &[bool]) -> CalibrationResult<Vec<f64>> {
    if scores.len() != labels.len() {
        return Err(CalibrationError::LengthMismatch {
            scores: scores.len(),
            labels: labels.len(),
        });
    }
    if scores.is_empty() {
        return Err(CalibrationError::InvalidInput {
            reason: "no calibration samples".to_string(),
        });
    }
    if let Some(i) = scores.iter().position(|s| !s.is_finite()) {
        return Err(CalibrationError::InvalidInput {
            reason: format!("score {} is not finite", i),
        });
    }
    Ok(scores.iter().map(|&s| s as f64).collect())
}

impl Calibrator {
    /// Wraps known logistic parameters.
    pub fn parametric(slope: f64, intercept: f64) -> Self {
        Self::Parametric(PlattModel { slope, intercept })
    }

    /// Fits logistic calibration. Labels: `true` = genuine.
    pub fn fit_parametric(scores: &[f32], labels: &[bool]) -> CalibrationResult<Self> {
        Self::fit_parametric_with(scores, labels, &PlattConfig::default())
    }

    pub fn fit_parametric_with(
        scores: &[f32],
        labels: &[bool],
        config: &PlattConfig,
    ) -> CalibrationResult<Self> {
        let xs = check_fit_input(scores, labels)?;
        let model = PlattModel::fit(&xs, labels, config)?;
        info!(
            samples = xs.len(),
            slope = model.slope,
            intercept = model.intercept,
            "Fitted parametric calibrator"
        );
        Ok(Self::Parametric(model))
    }

    /// Fits isotonic calibration. Labels: `true` = genuine.
    pub fn fit_monotonic(scores: &[f32], labels: &[bool]) -> CalibrationResult<Self> {
        let xs = check_fit_input(scores, labels)?;
        let model = IsotonicModel::fit(&xs, labels)?;
        info!(samples = xs.len(), knots = model.x.len(), "Fitted monotonic calibrator");
        Ok(Self::Monotonic(model))
    }

    pub fn fit(method: CalibrationMethod, scores: &[f32], labels: &[bool]) -> CalibrationResult<Self> {
        match method {
            CalibrationMethod::Platt => Self::fit_parametric(scores, labels),
            CalibrationMethod::Isotonic => Self::fit_monotonic(scores, labels),
        }
    }

    pub fn method(&self) -> CalibrationMethod {
        match self {
            Self::Parametric(_) => CalibrationMethod::Platt,
            Self::Monotonic(_) => CalibrationMethod::Isotonic,
        }
    }

    /// Probability for one score, in `[0, 1]`.
    pub fn apply_one(&self, score: f32) -> CalibrationResult<f32> {
        if !score.is_finite() {
            return Err(CalibrationError::InvalidInput {
                reason: format!("cannot calibrate non-finite score {}", score),
            });
        }
        let s = score as f64;
        let p = match self {
            Self::Parametric(m) => m.predict(s),
            Self::Monotonic(m) => m.predict(s),
        };
        Ok(p.clamp(0.0, 1.0) as f32)
    }

    pub fn apply(&self, scores: &[f32]) -> CalibrationResult<Vec<f32>> {
        scores.iter().map(|&s| self.apply_one(s)).collect()
    }

    pub fn to_json(&self) -> CalibrationResult<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| CalibrationError::InvalidInput {
            reason: format!("failed to serialize calibrator: {}", e),
        })
    }

    pub fn from_json(bytes: &[u8]) -> CalibrationResult<Self> {
        let calibrator: Self =
            serde_json::from_slice(bytes).map_err(|e| CalibrationError::InvalidInput {
                reason: format!("unrecognized calibrator: {}", e),
            })?;
        calibrator.validate()?;
        Ok(calibrator)
    }

    fn validate(&self) -> CalibrationResult<()> {
        match self {
            Self::Parametric(m) if !m.slope.is_finite() || !m.intercept.is_finite() => {
                Err(CalibrationError::InvalidInput {
                    reason: "malformed logistic calibrator: non-finite parameters".to_string(),
                })
            }
            Self::Parametric(_) => Ok(()),
            Self::Monotonic(m) => m.validate(),
        }
    }

    pub fn save(&self, path: &Path) -> CalibrationResult<()> {
        write_artifact(path, ArtifactKind::Calibrator, &self.to_json()?)?;
        info!(method = %self.method(), path = %path.display(), "Saved calibrator");
        Ok(())
    }

    pub fn load(path: &Path) -> CalibrationResult<Self> {
        let payload = read_artifact(path, ArtifactKind::Calibrator)?;
        let calibrator = Self::from_json(&payload)?;
        info!(method = %calibrator.method(), path = %path.display(), "Loaded calibrator");
        Ok(calibrator)
    }
}
