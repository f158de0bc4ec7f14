//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `NEUROKEY_*` environment variables.
//! Values are parsed strictly: a malformed override is an error, never a silent
//! fallback to the default.

pub mod error;

#[cfg(test)]
mod tests;

pub use error::ConfigError;

use std::env;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::calibration::CalibrationMethod;
use crate::constants::{
    DEFAULT_AUTH_THRESHOLD, DEFAULT_EMBEDDING_DIM, DEFAULT_KMEANS_SEED, DEFAULT_PROTOTYPE_K,
    DEFAULT_SPOOF_PERCENTILE, DEFAULT_TIER_HIGH, DEFAULT_TIER_MEDIUM, DimConfig,
};
use crate::decision::DecisionConfig;
use crate::prototypes::{PrototypeConfig, PrototypeMethod};
use crate::scoring::Aggregation;
use crate::spoof::{AutoencoderConfig, TrainingConfig};

pub const PROTOTYPES_FILENAME: &str = "prototypes.nkaf";
pub const CALIBRATOR_FILENAME: &str = "calibrator.nkaf";
pub const SPOOF_MODEL_FILENAME: &str = "spoof_detector.nkaf";

/// Runtime configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `NEUROKEY_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Encoder output width. Default: `128`.
    pub embedding_dim: usize,

    /// Prototypes per user. Default: `2`.
    pub prototype_k: usize,

    pub prototype_method: PrototypeMethod,

    pub kmeans_seed: u64,

    /// How per-prototype similarities collapse to one score. Default: `max`.
    pub aggregation: Aggregation,

    pub auth_threshold: f32,
    pub tier_high: f64,
    pub tier_medium: f64,

    /// Percentile of genuine validation error used as the spoof threshold.
    pub spoof_percentile: f64,

    pub calibration_method: CalibrationMethod,

    /// Directory holding all artifacts. Default: `./models`.
    pub artifact_dir: PathBuf,

    pub prototypes_path: Option<PathBuf>,
    pub calibrator_path: Option<PathBuf>,
    pub spoof_model_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            prototype_k: DEFAULT_PROTOTYPE_K,
            prototype_method: PrototypeMethod::default(),
            kmeans_seed: DEFAULT_KMEANS_SEED,
            aggregation: Aggregation::default(),
            auth_threshold: DEFAULT_AUTH_THRESHOLD,
            tier_high: DEFAULT_TIER_HIGH,
            tier_medium: DEFAULT_TIER_MEDIUM,
            spoof_percentile: DEFAULT_SPOOF_PERCENTILE as f64,
            calibration_method: CalibrationMethod::default(),
            artifact_dir: PathBuf::from("./models"),
            prototypes_path: None,
            calibrator_path: None,
            spoof_model_path: None,
        }
    }
}

impl Config {
    const ENV_EMBEDDING_DIM: &'static str = "NEUROKEY_EMBEDDING_DIM";
    const ENV_PROTOTYPE_K: &'static str = "NEUROKEY_PROTOTYPE_K";
    const ENV_PROTOTYPE_METHOD: &'static str = "NEUROKEY_PROTOTYPE_METHOD";
    const ENV_KMEANS_SEED: &'static str = "NEUROKEY_KMEANS_SEED";
    const ENV_AGGREGATION: &'static str = "NEUROKEY_AGGREGATION";
    const ENV_AUTH_THRESHOLD: &'static str = "NEUROKEY_AUTH_THRESHOLD";
    const ENV_TIER_HIGH: &'static str = "NEUROKEY_TIER_HIGH";
    const ENV_TIER_MEDIUM: &'static str = "NEUROKEY_TIER_MEDIUM";
    const ENV_SPOOF_PERCENTILE: &'static str = "NEUROKEY_SPOOF_PERCENTILE";
    const ENV_CALIBRATION_METHOD: &'static str = "NEUROKEY_CALIBRATION_METHOD";
    const ENV_ARTIFACT_DIR: &'static str = "NEUROKEY_ARTIFACT_DIR";
    const ENV_PROTOTYPES_PATH: &'static str = "NEUROKEY_PROTOTYPES_PATH";
    const ENV_CALIBRATOR_PATH: &'static str = "NEUROKEY_CALIBRATOR_PATH";
    const ENV_SPOOF_MODEL_PATH: &'static str = "NEUROKEY_SPOOF_MODEL_PATH";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            embedding_dim: Self::parse_from_env(Self::ENV_EMBEDDING_DIM, defaults.embedding_dim)?,
            prototype_k: Self::parse_from_env(Self::ENV_PROTOTYPE_K, defaults.prototype_k)?,
            prototype_method: Self::parse_from_env(
                Self::ENV_PROTOTYPE_METHOD,
                defaults.prototype_method,
            )?,
            kmeans_seed: Self::parse_from_env(Self::ENV_KMEANS_SEED, defaults.kmeans_seed)?,
            aggregation: Self::parse_from_env(Self::ENV_AGGREGATION, defaults.aggregation)?,
            auth_threshold: Self::parse_from_env(
                Self::ENV_AUTH_THRESHOLD,
                defaults.auth_threshold,
            )?,
            tier_high: Self::parse_from_env(Self::ENV_TIER_HIGH, defaults.tier_high)?,
            tier_medium: Self::parse_from_env(Self::ENV_TIER_MEDIUM, defaults.tier_medium)?,
            spoof_percentile: Self::parse_from_env(
                Self::ENV_SPOOF_PERCENTILE,
                defaults.spoof_percentile,
            )?,
            calibration_method: Self::parse_from_env(
                Self::ENV_CALIBRATION_METHOD,
                defaults.calibration_method,
            )?,
            artifact_dir: Self::parse_path_from_env(Self::ENV_ARTIFACT_DIR, defaults.artifact_dir),
            prototypes_path: Self::parse_optional_path_from_env(Self::ENV_PROTOTYPES_PATH),
            calibrator_path: Self::parse_optional_path_from_env(Self::ENV_CALIBRATOR_PATH),
            spoof_model_path: Self::parse_optional_path_from_env(Self::ENV_SPOOF_MODEL_PATH),
        })
    }

    /// Checks numeric invariants and path kinds (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.dim_config()
            .validate()
            .map_err(|e| ConfigError::InvalidValue {
                name: Self::ENV_EMBEDDING_DIM,
                reason: e.to_string(),
            })?;

        if self.prototype_k == 0 {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_PROTOTYPE_K,
                reason: "must be at least 1".to_string(),
            });
        }

        self.decision_config()
            .validate()
            .map_err(|e| ConfigError::InvalidValue {
                name: "decision thresholds",
                reason: e.to_string(),
            })?;

        if !(0.0..=100.0).contains(&self.spoof_percentile) {
            return Err(ConfigError::InvalidValue {
                name: Self::ENV_SPOOF_PERCENTILE,
                reason: format!("{} outside [0, 100]", self.spoof_percentile),
            });
        }

        if self.artifact_dir.exists() && !self.artifact_dir.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.artifact_dir.clone(),
            });
        }

        for path in [
            &self.prototypes_path,
            &self.calibrator_path,
            &self.spoof_model_path,
        ]
        .into_iter()
        .flatten()
        {
            if path.exists() && !path.is_file() {
                return Err(ConfigError::NotAFile { path: path.clone() });
            }
        }

        Ok(())
    }

    /// Prototype store location: the override, else `{artifact_dir}/prototypes.nkaf`.
    pub fn prototypes_artifact(&self) -> PathBuf {
        self.resolve(&self.prototypes_path, PROTOTYPES_FILENAME)
    }

    pub fn calibrator_artifact(&self) -> PathBuf {
        self.resolve(&self.calibrator_path, CALIBRATOR_FILENAME)
    }

    pub fn spoof_artifact(&self) -> PathBuf {
        self.resolve(&self.spoof_model_path, SPOOF_MODEL_FILENAME)
    }

    /// Width every loaded artifact and incoming embedding must have.
    pub fn dim_config(&self) -> DimConfig {
        DimConfig::new(self.embedding_dim)
    }

    pub fn prototype_config(&self) -> PrototypeConfig {
        PrototypeConfig::new(self.prototype_k, self.prototype_method).with_seed(self.kmeans_seed)
    }

    pub fn decision_config(&self) -> DecisionConfig {
        DecisionConfig {
            auth_threshold: self.auth_threshold,
            tier_high: self.tier_high,
            tier_medium: self.tier_medium,
        }
    }

    /// Default hidden/latent widths over the configured input width.
    pub fn autoencoder_config(&self) -> AutoencoderConfig {
        AutoencoderConfig {
            input_dim: self.embedding_dim,
            ..AutoencoderConfig::default()
        }
    }

    pub fn training_config(&self) -> TrainingConfig {
        TrainingConfig {
            percentile: self.spoof_percentile,
            ..TrainingConfig::default()
        }
    }

    fn resolve(&self, explicit: &Option<PathBuf>, filename: &str) -> PathBuf {
        explicit
            .clone()
            .unwrap_or_else(|| Path::new(&self.artifact_dir).join(filename))
    }

    fn parse_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::ParseError {
                    name: var_name,
                    value: value.clone(),
                    reason: e.to_string(),
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }
}
