//! # Status Management
//!
//! Writes the `Ready` condition back to the GSMSecret status subresource.

use crate::controller::kube_client::ClusterClient;
use crate::crd::{ConditionStatus, GsmSecret, GsmSecretStatus};
use crate::error::{with_deadline, Error, Result};
use chrono::Utc;
use kube::ResourceExt;
use std::time::Duration;
use tracing::debug;

/// Record a `Ready` outcome for `resource`'s current generation.
///
/// Skips the write when the status would not change, so a steady resync does
/// not bump `resourceVersion` on every pass.
///
/// # Errors
///
/// Kubernetes API failures and deadline expiry.
pub async fn update_ready_condition(
    cluster: &dyn ClusterClient,
    resource: &GsmSecret,
    status: ConditionStatus,
    reason: &str,
    message: impl Into<String>,
    timeout: Duration,
) -> Result<GsmSecretStatus> {
    let current = resource.status.clone().unwrap_or_default();
    let mut next = current.clone();
    next.set_ready(
        status,
        reason,
        message,
        resource.metadata.generation,
        Utc::now(),
    );

    if resource.status.is_some() && next == current {
        debug!(reason, "Skipping status update - Ready condition unchanged");
        return Ok(next);
    }

    let namespace = resource.namespace().unwrap_or_default();
    let name = resource.name_any();
    with_deadline(
        &format!("update status of GSMSecret {namespace}/{name}"),
        timeout,
        async {
            cluster
                .patch_gsm_secret_status(&namespace, &name, &next)
                .await
                .map_err(Error::from)
        },
    )
    .await?;

    debug!(reason, status = status.as_str(), "Status updated");
    Ok(next)
}
