//! GSM Secret Controller Library
//!
//! Materializes Google Secret Manager secret versions into Kubernetes Secrets,
//! authenticating per resource through Workload Identity Federation.
//! Tests are included in the module files (e.g., reconciler/reconcile.rs).
//!
//! ## Quick Start
//!
//! ```rust
//! use gsm_secret_controller::prelude::*;
//! ```
//!
//! This brings commonly used types and traits into scope. For more specific imports,
//! use the individual modules.

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod error;
pub mod identity;
pub mod observability;
pub mod prelude;
pub mod provider;
pub mod runtime;
