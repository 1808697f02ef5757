//! # Reconciler
//!
//! Core reconciliation logic for `GSMSecret` resources.
//!
//! The reconciler:
//! - Re-reads the `GSMSecret` so every pass works from current state
//! - Obtains a fresh Google credential through the identity broker
//! - Resolves entries against Secret Manager and builds the target Secret
//! - Creates, updates or adopts the Secret
//! - Records the outcome in the `Ready` condition
//!
//! Nothing is cached between passes apart from per-resource backoff counters.

pub mod apply;
pub mod reconcile;
pub mod status;
pub mod types;

// Re-export public API
pub use apply::{apply_secret, upsert_owner_reference, ApplyOutcome};
pub use reconcile::reconcile;
pub use status::update_ready_condition;
pub use types::{BackoffState, Reconciler, ReconcilerError};
