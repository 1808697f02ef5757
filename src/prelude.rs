//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ```rust
//! use gsm_secret_controller::prelude::*;
//! ```

// CRD types - most commonly used
pub use crate::crd::*;

// Seams between the reconciler and the outside world
pub use crate::controller::kube_client::{ClusterClient, KubeClusterClient};
pub use crate::identity::{Credential, GcpIdentityBroker, IdentityBroker};
pub use crate::provider::{SecretStore, SecretStoreConnector};

// Reconciler types - core controller functionality
pub use crate::controller::reconciler::{reconcile, Reconciler, ReconcilerError};

// Config types - for configuration management
pub use crate::config::{ControllerConfig, ServerConfig};

pub use crate::error::Error;

pub use crate::provider::gcp::{SecretManagerConnector, SecretManagerREST};
