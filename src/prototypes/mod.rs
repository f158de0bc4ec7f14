//! Per-user prototype sets.
//!
//! At enrollment a user's `n` embeddings are reduced to `k` unit-norm prototype
//! rows, by k-means centroids or by replicating the column mean/median. When
//! `n < k` the available embeddings are padded with their mean and the
//! enrollment is reported as degraded rather than rejected.
//!
//! [`PrototypeStore`] owns the `user_id → k × D` mapping and persists it as a
//! framed rkyv artifact.

pub mod compute;
pub mod config;
pub mod error;
pub mod kmeans;
pub mod report;
pub mod store;


/// Stable numeric user identifier.
pub type UserId = u64;

pub use compute::{
    DegradedEnrollment, PrototypeComputation, compute_prototypes, compute_user_prototypes,
};
pub use config::{PrototypeConfig, PrototypeMethod};
pub use error::{PrototypeError, PrototypeResult};
pub use kmeans::{KMeans, KMeansFit};
pub use report::{EnrollmentQuality, EnrollmentReport};
pub use store::PrototypeStore;
