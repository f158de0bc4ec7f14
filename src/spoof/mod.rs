//! One-class spoof screening by embedding reconstruction error.
//!
//! An autoencoder is trained on genuine embeddings only. At inference a probe
//! whose reconstruction error exceeds the P-th percentile of held-out genuine
//! errors is flagged. The threshold bounds false flags on genuine users at
//! roughly `(100 - P)%`; it says nothing about recall on real attacks, which
//! were never seen during training.

pub mod config;
pub mod detector;
pub mod error;
pub mod model;
pub mod threshold;
pub mod trainer;


pub use config::{AutoencoderConfig, TrainingConfig};
pub use detector::{SpoofAssessment, SpoofDetector};
pub use error::{SpoofError, SpoofResult};
pub use model::EmbeddingAutoencoder;
pub use threshold::{compute_threshold, is_spoof};
pub use trainer::{EpochLoss, TrainingOutcome, train};
