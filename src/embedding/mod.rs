//! Embedding primitives shared by every stage of the pipeline.
//!
//! - [`Matrix`] stores enrollment batches and prototype sets.
//! - [`vector`] holds the norm/normalization helpers behind the unit-norm contract.
//! - [`encoder`] defines the boundary with the external EEG encoder.

/// Device selection (CPU / Metal / CUDA).
pub mod device;
pub mod encoder;
mod error;
pub mod matrix;
pub mod vector;

pub use encoder::{Encoder, StubEncoder, Trial};
pub use error::{EmbeddingError, EmbeddingResult};
pub use matrix::Matrix;
pub use vector::{is_unit_norm, l2_norm, normalized};
