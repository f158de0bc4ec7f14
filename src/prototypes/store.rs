use std::collections::HashMap;
use std::path::Path;

use rkyv::rancor::Error as RkyvError;
use rkyv::util::AlignedVec;
use rkyv::{Archive, Deserialize, Serialize, from_bytes, to_bytes};
use tracing::info;

use crate::embedding::Matrix;
use crate::storage::{ArtifactKind, StorageError, read_artifact, write_artifact};

use super::UserId;
use super::compute::{compute_user_prototypes, ensure_finite};
use super::config::PrototypeConfig;
use super::error::{PrototypeError, PrototypeResult};
use super::report::EnrollmentReport;

#[derive(Archive, Serialize, Deserialize, Debug)]
struct StoredUser {
    user_id: u64,
    prototypes: Matrix,
}

#[derive(Archive, Serialize, Deserialize, Debug)]
struct StoredPrototypes {
    users: Vec<StoredUser>,
}

/// Per-user prototype sets, keyed by user id.
///
/// Every entry shares one embedding dimension. Entries are replaced whole,
/// never edited in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PrototypeStore {
    entries: HashMap<UserId, Matrix>,
}

impl PrototypeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Embedding dimension shared by all entries, `None` when empty.
    pub fn dim(&self) -> Option<usize> {
        self.entries.values().next().map(Matrix::dim)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, user_id: UserId) -> bool {
        self.entries.contains_key(&user_id)
    }

    /// Sorted user ids.
    pub fn users(&self) -> Vec<UserId> {
        let mut ids: Vec<UserId> = self.entries.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn get(&self, user_id: UserId) -> PrototypeResult<&Matrix> {
        self.entries
            .get(&user_id)
            .ok_or(PrototypeError::NotFound { user_id })
    }

    fn check_dim(&self, user_id: UserId, dim: usize) -> PrototypeResult<()> {
        match self.dim() {
            Some(expected) if expected != dim && !(self.len() == 1 && self.contains(user_id)) => {
                Err(PrototypeError::DimensionMismatch {
                    expected,
                    actual: dim,
                })
            }
            _ => Ok(()),
        }
    }

    /// Inserts a precomputed prototype set, replacing any existing entry.
    pub fn insert(&mut self, user_id: UserId, prototypes: Matrix) -> PrototypeResult<()> {
        if prototypes.is_empty() {
            return Err(PrototypeError::InvalidInput {
                reason: format!("user {} has an empty prototype set", user_id),
            });
        }
        ensure_finite(user_id, &prototypes, "prototype")?;
        self.check_dim(user_id, prototypes.dim())?;
        self.entries.insert(user_id, prototypes);
        Ok(())
    }

    /// Recomputes `user_id`'s prototypes from `embeddings`. Other users are untouched.
    pub fn add_or_update(
        &mut self,
        user_id: UserId,
        embeddings: &Matrix,
        config: &PrototypeConfig,
    ) -> PrototypeResult<EnrollmentReport> {
        self.check_dim(user_id, embeddings.dim())?;
        let (prototypes, degraded) = compute_user_prototypes(user_id, embeddings, config)?;
        let report = EnrollmentReport::analyze(user_id, embeddings, &prototypes, degraded.is_some());
        self.entries.insert(user_id, prototypes);
        info!(
            user_id,
            quality = %report.quality,
            strength = report.prototype_strength,
            "Added/updated prototypes"
        );
        Ok(report)
    }

    /// Serializes the store as an rkyv archive (users in ascending id order).
    pub fn to_bytes(&self) -> PrototypeResult<Vec<u8>> {
        let users = self
            .users()
            .into_iter()
            .map(|user_id| StoredUser {
                user_id,
                prototypes: self.entries[&user_id].clone(),
            })
            .collect();
        let bytes = to_bytes::<RkyvError>(&StoredPrototypes { users })
            .map_err(|e| StorageError::Serialization(format!("{:?}", e)))?;
        Ok(bytes.to_vec())
    }

    pub fn from_bytes(bytes: &[u8]) -> PrototypeResult<Self> {
        let mut aligned = AlignedVec::<16>::with_capacity(bytes.len());
        aligned.extend_from_slice(bytes);
        let stored = from_bytes::<StoredPrototypes, RkyvError>(&aligned)
            .map_err(|e| StorageError::Corrupt {
                reason: format!("prototype archive: {:?}", e),
            })?;

        let mut store = Self::new();
        for user in stored.users {
            let rows = user.prototypes.rows();
            let dim = user.prototypes.dim();
            // Re-validate the shape; the archive only guarantees well-formed bytes.
            let prototypes = Matrix::new(rows, dim, user.prototypes.into_vec()).map_err(|e| {
                StorageError::Corrupt {
                    reason: format!("user {}: {}", user.user_id, e),
                }
            })?;
            store.insert(user.user_id, prototypes)?;
        }
        Ok(store)
    }

    /// Atomically writes the whole store to `path`.
    pub fn save(&self, path: &Path) -> PrototypeResult<()> {
        let payload = self.to_bytes()?;
        write_artifact(path, ArtifactKind::Prototypes, &payload)?;
        info!(users = self.len(), path = %path.display(), "Saved prototypes");
        Ok(())
    }

    pub fn load(path: &Path) -> PrototypeResult<Self> {
        let payload = read_artifact(path, ArtifactKind::Prototypes)?;
        let store = Self::from_bytes(&payload)?;
        info!(users = store.len(), path = %path.display(), "Loaded prototypes");
        Ok(store)
    }
}
