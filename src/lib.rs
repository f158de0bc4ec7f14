//! Neurokey library crate (used by the offline tool and integration tests).
//!
//! A probe embedding travels through four stages:
//!
//! 1. [`scoring`]: cosine similarity against the claimed user's prototypes,
//!    aggregated by an [`Aggregation`] policy.
//! 2. [`calibration`]: raw score to genuine-match probability (Platt or isotonic).
//! 3. [`spoof`]: autoencoder reconstruction error against a percentile threshold.
//! 4. [`decision`]: `probability >= threshold && !spoof`, a confidence tier and a
//!    reason string.
//!
//! [`auth::AuthContext`] ties the stages to one shared, swappable model state.
//! [`prototypes`] builds and persists the per-user prototype sets, [`evaluation`]
//! measures FAR/FRR/EER over score sets, and [`storage`] frames every artifact.
//!
//! ```
//! use neurokey::{Aggregation, Matrix, score};
//!
//! let prototypes = Matrix::from_rows(vec![vec![1.0, 0.0], vec![0.0, 1.0]]).unwrap();
//! let s = score(&[1.0, 0.0], &prototypes, Aggregation::Max).unwrap();
//! assert!((s - 1.0).abs() < 1e-6);
//! ```

pub mod auth;
pub mod calibration;
pub mod config;
pub mod constants;
pub mod decision;
pub mod embedding;
pub mod evaluation;
pub mod hashing;
pub mod prototypes;
pub mod scoring;
pub mod spoof;
pub mod storage;

pub use auth::{
    ArtifactPaths, AuthContext, AuthError, AuthResult, AuthenticationEvent, ContextStatus,
    ModelState, ReducedMode,
};
pub use calibration::{
    CalibrationError, CalibrationMethod, Calibrator, IsotonicModel, PlattModel, ReliabilityCurve,
};
pub use config::{Config, ConfigError};
pub use constants::{DimConfig, DimValidationError, validate_embedding_dim};
pub use decision::{
    ConfidenceTier, Decision, DecisionConfig, DecisionInput, DecisionPolicy, ImpostorKind,
    ImpostorProfile, decide,
};
pub use embedding::{EmbeddingError, Encoder, Matrix, StubEncoder, Trial};
pub use evaluation::{EvaluationError, EvaluationReport, equal_error_rate, evaluate_scores};
pub use hashing::{embedding_fingerprint, hash_payload, hash_trial};
pub use prototypes::{
    EnrollmentQuality, EnrollmentReport, PrototypeConfig, PrototypeError, PrototypeMethod,
    PrototypeStore, UserId,
};
pub use scoring::{
    Aggregation, ScoringError, SimilarityScorer, cosine_similarity, score, score_vs_prototypes,
};
pub use spoof::{AutoencoderConfig, SpoofDetector, SpoofError, TrainingConfig};
pub use storage::{ArtifactKind, StorageError};
