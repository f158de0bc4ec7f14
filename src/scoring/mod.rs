//! Cosine similarity between a probe embedding and a user's prototype set.
//!
//! Each prototype row is compared to the probe and the `k` similarities are
//! collapsed by an [`Aggregation`] policy. `Max` accepts a probe that matches any
//! stored mode of the user's signal; `Mean` and `Min` are progressively stricter.
//!
//! Scoring is pure: no state, no I/O.

pub mod aggregation;
pub mod error;
pub mod scorer;


pub use aggregation::Aggregation;
pub use error::{ScoringError, ScoringResult};
pub use scorer::{
    ScoreBreakdown, SimilarityScorer, cosine_similarity, prototype_similarities, score,
    score_vs_prototypes,
};
