use std::collections::HashMap;

use serde::Serialize;
use tracing::{info, warn};

use crate::embedding::Matrix;

use super::UserId;
use super::config::{PrototypeConfig, PrototypeMethod};
use super::error::{PrototypeError, PrototypeResult};
use super::kmeans::KMeans;

/// A user enrolled with fewer embeddings than prototypes.
///
/// Not an error: the prototype set was padded with the enrollment mean.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegradedEnrollment {
    pub user_id: UserId,
    pub available: usize,
    pub k: usize,
}

/// Output of [`compute_prototypes`].
#[derive(Debug, Clone, Default)]
pub struct PrototypeComputation {
    pub prototypes: HashMap<UserId, Matrix>,
    pub degraded: Vec<DegradedEnrollment>,
}

/// Rejects NaN or infinite values in a user's embeddings or prototypes.
pub(crate) fn ensure_finite(user_id: UserId, matrix: &Matrix, what: &str) -> PrototypeResult<()> {
    if let Some(pos) = matrix.as_slice().iter().position(|v| !v.is_finite()) {
        return Err(PrototypeError::InvalidInput {
            reason: format!(
                "user {} {} row {} holds a non-finite value",
                user_id,
                what,
                pos / matrix.dim()
            ),
        });
    }
    Ok(())
}

/// Computes `k` unit-norm prototypes for one user.
pub fn compute_user_prototypes(
    user_id: UserId,
    embeddings: &Matrix,
    config: &PrototypeConfig,
) -> PrototypeResult<(Matrix, Option<DegradedEnrollment>)> {
    config.validate()?;
    let n = embeddings.rows();
    let k = config.k;
    if n == 0 {
        return Err(PrototypeError::InvalidInput {
            reason: format!("user {} has no enrollment embeddings", user_id),
        });
    }

    ensure_finite(user_id, embeddings, "enrollment")?;

    let mut degraded = None;
    let mut prototypes = if n < k {
        warn!(
            user_id,
            available = n,
            k,
            "Fewer enrollment embeddings than prototypes, padding with mean"
        );
        degraded = Some(DegradedEnrollment {
            user_id,
            available: n,
            k,
        });
        let mut padded = embeddings.clone();
        padded.append(&Matrix::replicate(&embeddings.mean_row(), k - n)?)?;
        padded
    } else {
        match config.method {
            PrototypeMethod::KMeans => {
                KMeans::new(k, config.seed, config.n_init, config.max_iter)
                    .fit(embeddings)?
                    .centroids
            }
            PrototypeMethod::Mean => Matrix::replicate(&embeddings.mean_row(), k)?,
            PrototypeMethod::Median => Matrix::replicate(&embeddings.median_row(), k)?,
        }
    };

    prototypes.normalize_rows();
    ensure_finite(user_id, &prototypes, "prototype")?;
    info!(user_id, k, method = %config.method, n, "Computed prototypes");
    Ok((prototypes, degraded))
}

/// Computes prototypes for every user. All users must share one embedding dimension.
pub fn compute_prototypes(
    embeddings_by_user: &HashMap<UserId, Matrix>,
    config: &PrototypeConfig,
) -> PrototypeResult<PrototypeComputation> {
    config.validate()?;

    let mut user_ids: Vec<UserId> = embeddings_by_user.keys().copied().collect();
    user_ids.sort_unstable();

    let mut out = PrototypeComputation::default();
    let mut dim = None;
    for user_id in user_ids {
        let embeddings = &embeddings_by_user[&user_id];
        match dim {
            None => dim = Some(embeddings.dim()),
            Some(d) if d != embeddings.dim() => {
                return Err(PrototypeError::DimensionMismatch {
                    expected: d,
                    actual: embeddings.dim(),
                });
            }
            Some(_) => {}
        }

        let (prototypes, degraded) = compute_user_prototypes(user_id, embeddings, config)?;
        out.prototypes.insert(user_id, prototypes);
        out.degraded.extend(degraded);
    }

    Ok(out)
}
