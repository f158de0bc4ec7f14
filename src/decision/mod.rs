//! Final authenticate/reject verdict.
//!
//! `authenticated = probability >= auth_threshold && !spoof_flag`. The confidence
//! tier measures distance of the probability from 0.5 in either direction, and a
//! spoof flag is always HIGH. Every decision carries a reason string quoting the
//! probability and similarity to three decimals.

pub mod error;
pub mod impostor;
pub mod policy;
pub mod types;

#[cfg(test)]
mod tests;

pub use error::{DecisionError, DecisionResult};
pub use impostor::{ImpostorKind, ImpostorProfile};
pub use policy::{DecisionConfig, DecisionPolicy, decide};
pub use types::{ConfidenceTier, Decision, DecisionInput, DecisionOutcome};
