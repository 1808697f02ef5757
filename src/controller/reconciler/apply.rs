//! # Apply
//!
//! Create, update or adopt the target Secret.
//!
//! - Absent: create it with a controller owner reference to the GSMSecret.
//! - Present: upsert the owner reference (adopting unowned Secrets), then
//!   overwrite `data` and `type` only. Existing labels and annotations stay.
//!
//! A Secret already controlled by a different owner is never taken over.

use crate::controller::kube_client::ClusterClient;
use crate::crd::GsmSecret;
use crate::error::{with_deadline, Error, Result};
use crate::observability::metrics;
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::{Resource, ResourceExt};
use std::time::Duration;
use tracing::{debug, info};

/// What the apply step did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Created,
    Updated,
    /// Already matched, no write issued
    Unchanged,
}

impl ApplyOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyOutcome::Created => "created",
            ApplyOutcome::Updated => "updated",
            ApplyOutcome::Unchanged => "unchanged",
        }
    }
}

/// Insert `owner` into `meta.ownerReferences`, replacing any entry with the same UID.
///
/// # Errors
///
/// [`Error::Configuration`] if a different controller already owns the object.
pub fn upsert_owner_reference(meta: &mut ObjectMeta, owner: OwnerReference) -> Result<()> {
    let refs = meta.owner_references.get_or_insert_with(Vec::new);

    if let Some(other) = refs
        .iter()
        .find(|r| r.controller == Some(true) && r.uid != owner.uid)
    {
        return Err(Error::Configuration(format!(
            "Secret {} is already controlled by {} {}",
            meta.name.as_deref().unwrap_or_default(),
            other.kind,
            other.name
        )));
    }

    match refs.iter_mut().find(|r| r.uid == owner.uid) {
        Some(existing) => *existing = owner,
        None => refs.push(owner),
    }
    Ok(())
}

/// Idempotently write `desired` (built by the builder) for `owner`.
///
/// # Errors
///
/// Kubernetes API failures, deadline expiry, a missing owner UID or a Secret
/// controlled by someone else.
pub async fn apply_secret(
    cluster: &dyn ClusterClient,
    owner: &GsmSecret,
    mut desired: Secret,
    timeout: Duration,
) -> Result<ApplyOutcome> {
    let namespace = desired.metadata.namespace.clone().unwrap_or_default();
    let name = desired.name_any();
    let owner_ref = owner.controller_owner_ref(&()).ok_or_else(|| {
        Error::Configuration(format!(
            "GSMSecret {} has no uid; cannot own Secret {name}",
            owner.name_any()
        ))
    })?;

    let existing = with_deadline(&format!("get Secret {namespace}/{name}"), timeout, async {
        cluster
            .get_secret(&namespace, &name)
            .await
            .map_err(Error::from)
    })
    .await?;

    let Some(mut current) = existing else {
        upsert_owner_reference(&mut desired.metadata, owner_ref)?;
        with_deadline(&format!("create Secret {namespace}/{name}"), timeout, async {
            cluster
                .create_secret(&namespace, &desired)
                .await
                .map_err(Error::from)
        })
        .await?;
        metrics::increment_target_writes("create");
        info!(secret = %name, "Created Secret");
        return Ok(ApplyOutcome::Created);
    };

    let before = current.clone();
    upsert_owner_reference(&mut current.metadata, owner_ref)?;
    current.data = desired.data;
    current.type_ = desired.type_;
    current.string_data = None;

    if current == before {
        debug!(secret = %name, "Secret already up to date");
        return Ok(ApplyOutcome::Unchanged);
    }

    with_deadline(&format!("update Secret {namespace}/{name}"), timeout, async {
        cluster
            .replace_secret(&namespace, &current)
            .await
            .map_err(Error::from)
    })
    .await?;
    metrics::increment_target_writes("update");
    info!(secret = %name, "Updated Secret");
    Ok(ApplyOutcome::Updated)
}
