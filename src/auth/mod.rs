//! Authentication against the currently loaded model state.
//!
//! [`AuthContext`] replaces process-global model variables with one shared
//! snapshot. Authentication clones the current `Arc<ModelState>` and never
//! blocks on enrollment; enrollment and component swaps are serialised and
//! publish a new snapshot when they finish.

pub mod context;
pub mod error;
pub mod event;

#[cfg(test)]
mod tests;

pub use context::{ArtifactPaths, AuthContext, ContextStatus, ModelState};
pub use error::{AuthError, AuthResult};
pub use event::{AuthenticationEvent, ReducedMode};
