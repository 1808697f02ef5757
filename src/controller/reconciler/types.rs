//! # Types
//!
//! Core types for the reconciler.

use crate::config::ControllerConfig;
use crate::controller::backoff::FibonacciBackoff;
use crate::controller::kube_client::ClusterClient;
use crate::crd::{REASON_APPLY_FAILED, REASON_BUILD_FAILED, REASON_FETCH_FAILED};
use crate::error::Error;
use crate::identity::IdentityBroker;
use crate::provider::SecretStoreConnector;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tracing::warn;

/// Reconcile failure, tagged with the phase that failed
#[derive(Debug, Error)]
pub enum ReconcilerError {
    /// Credential or secret fetch failed
    #[error("fetch failed: {0}")]
    FetchFailed(#[source] Error),

    #[error("build failed: {0}")]
    BuildFailed(#[source] Error),

    /// Secret create/update/adopt failed
    #[error("apply failed: {0}")]
    ApplyFailed(#[source] Error),

    #[error("status update failed: {0}")]
    StatusUpdateFailed(#[source] Error),

    #[error("Reconciliation failed: {0}")]
    ReconciliationFailed(#[from] anyhow::Error),
}

impl ReconcilerError {
    /// Label for metrics; matches the `Ready` reason where one was written
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            ReconcilerError::FetchFailed(_) => REASON_FETCH_FAILED,
            ReconcilerError::BuildFailed(_) => REASON_BUILD_FAILED,
            ReconcilerError::ApplyFailed(_) => REASON_APPLY_FAILED,
            ReconcilerError::StatusUpdateFailed(_) => "StatusUpdateFailed",
            ReconcilerError::ReconciliationFailed(_) => "ReconciliationFailed",
        }
    }

    /// Whether retrying soon is pointless (configuration and validation problems)
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        match self {
            ReconcilerError::FetchFailed(e)
            | ReconcilerError::BuildFailed(e)
            | ReconcilerError::ApplyFailed(e)
            | ReconcilerError::StatusUpdateFailed(e) => e.is_terminal(),
            ReconcilerError::ReconciliationFailed(_) => false,
        }
    }
}

/// Backoff state for a specific resource
/// Tracks error count and backoff calculator for progressive retries
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    #[must_use]
    pub fn new(min_secs: u64, max_secs: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min_secs, max_secs),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count = self.error_count.saturating_add(1);
    }
}

/// Shared reconcile context
///
/// Every collaborator is injected, so tests can run the full pipeline against
/// mocks and an in-memory cluster.
#[derive(Clone)]
pub struct Reconciler {
    pub cluster: Arc<dyn ClusterClient>,
    pub broker: Arc<dyn IdentityBroker>,
    pub connector: Arc<dyn SecretStoreConnector>,
    pub config: Arc<ControllerConfig>,
    // Backoff state per resource (identified by namespace/name)
    pub backoff_states: Arc<Mutex<HashMap<String, BackoffState>>>,
}

impl std::fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reconciler")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Reconciler {
    #[must_use]
    pub fn new(
        cluster: Arc<dyn ClusterClient>,
        broker: Arc<dyn IdentityBroker>,
        connector: Arc<dyn SecretStoreConnector>,
        config: Arc<ControllerConfig>,
    ) -> Self {
        Self {
            cluster,
            broker,
            connector,
            config,
            backoff_states: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Advance the resource's backoff and return the delay and error count.
    pub fn next_backoff(&self, resource_key: &str) -> (Duration, u32) {
        match self.backoff_states.lock() {
            Ok(mut states) => {
                let state = states.entry(resource_key.to_string()).or_insert_with(|| {
                    BackoffState::new(self.config.backoff_min_secs, self.config.backoff_max_secs)
                });
                state.increment_error();
                (state.backoff.next_backoff(), state.error_count)
            }
            Err(e) => {
                warn!(
                    "Failed to lock backoff_states: {}, using default backoff",
                    e
                );
                (Duration::from_secs(self.config.backoff_min_secs.max(1)), 0)
            }
        }
    }

    /// Forget the resource's failure history after a successful reconcile.
    /// Deleted resources also end in a success, so their entries go too.
    pub fn reset_backoff(&self, resource_key: &str) {
        if let Ok(mut states) = self.backoff_states.lock() {
            states.remove(resource_key);
        }
    }
}
