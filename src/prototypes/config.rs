use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{PrototypeError, PrototypeResult};
use crate::constants::{DEFAULT_KMEANS_SEED, DEFAULT_PROTOTYPE_K, KMEANS_MAX_ITER, KMEANS_N_INIT};

/// Strategy for deriving `k` prototypes from `n >= k` enrollment embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrototypeMethod {
    /// `k` cluster centroids.
    #[default]
    KMeans,
    /// Column mean replicated `k` times.
    Mean,
    /// Column median replicated `k` times.
    Median,
}

impl PrototypeMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::KMeans => "kmeans",
            Self::Mean => "mean",
            Self::Median => "median",
        }
    }
}

impl fmt::Display for PrototypeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PrototypeMethod {
    type Err = PrototypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kmeans" => Ok(Self::KMeans),
            "mean" => Ok(Self::Mean),
            "median" => Ok(Self::Median),
            other => Err(PrototypeError::InvalidInput {
                reason: format!(
                    "unknown prototype method '{}': expected kmeans, mean or median",
                    other
                ),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Prototype computation settings.
pub struct PrototypeConfig {
    /// Prototypes per user.
    pub k: usize,
    pub method: PrototypeMethod,
    /// K-means RNG seed.
    pub seed: u64,
    /// Independent k-means++ initialisations; the lowest inertia wins.
    pub n_init: usize,
    pub max_iter: usize,
}

impl Default for PrototypeConfig {
    fn default() -> Self {
        Self {
            k: DEFAULT_PROTOTYPE_K,
            method: PrototypeMethod::default(),
            seed: DEFAULT_KMEANS_SEED,
            n_init: KMEANS_N_INIT,
            max_iter: KMEANS_MAX_ITER,
        }
    }
}

impl PrototypeConfig {
    pub fn new(k: usize, method: PrototypeMethod) -> Self {
        Self {
            k,
            method,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> PrototypeResult<()> {
        if self.k == 0 {
            return Err(PrototypeError::InvalidInput {
                reason: "k must be at least 1".to_string(),
            });
        }
        if self.n_init == 0 || self.max_iter == 0 {
            return Err(PrototypeError::InvalidInput {
                reason: "n_init and max_iter must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}
