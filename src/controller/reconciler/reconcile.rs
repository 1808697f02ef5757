//! # Reconcile
//!
//! One pass of the GSMSecret state machine:
//!
//! 1. Re-read the GSMSecret; a deleted resource ends the pass (owner references
//!    garbage-collect the Secret)
//! 2. Mint a credential and resolve every entry (`FetchFailed`)
//! 3. Build the desired Secret (`BuildFailed`)
//! 4. Create, update or adopt it (`ApplyFailed`)
//! 5. Report `Ready=True/Synced` and requeue after the resync interval
//!
//! Every failure writes `Ready=False` with the phase reason before the error is
//! returned to the error policy. A failed status write on a failure path is
//! logged; the phase error is what gets returned.

use super::apply::apply_secret;
use super::status::update_ready_condition;
use super::types::{Reconciler, ReconcilerError};
use crate::controller::builder::build_secret;
use crate::controller::resolver::{resolve_entries, KeyedPayload};
use crate::crd::{
    ConditionStatus, GsmSecret, REASON_APPLY_FAILED, REASON_BUILD_FAILED, REASON_FETCH_FAILED,
    REASON_SYNCED,
};
use crate::error::{with_deadline, Error, Result};
use crate::observability::metrics;
use anyhow::Context as _;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};

/// Reconcile one GSMSecret.
///
/// # Errors
///
/// A [`ReconcilerError`] naming the failed phase; the error policy decides
/// when to retry.
pub async fn reconcile(
    resource: Arc<GsmSecret>,
    ctx: Arc<Reconciler>,
) -> Result<Action, ReconcilerError> {
    let name = resource.name_any();
    let namespace = resource.namespace().unwrap_or_default();
    let span = info_span!(
        "reconcile",
        resource.name = %name,
        resource.namespace = %namespace,
        resource.generation = resource.metadata.generation.unwrap_or(0),
    );

    async move {
        metrics::increment_reconciliations();
        let start = Instant::now();

        let result = run(&ctx, &namespace, &name).await;

        metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());
        if result.is_ok() {
            ctx.reset_backoff(&format!("{namespace}/{name}"));
        }
        result
    }
    .instrument(span)
    .await
}

async fn run(ctx: &Reconciler, namespace: &str, name: &str) -> Result<Action, ReconcilerError> {
    let timeout = ctx.config.http_timeout;

    let current = with_deadline(
        &format!("get GSMSecret {namespace}/{name}"),
        timeout,
        async {
            ctx.cluster
                .get_gsm_secret(namespace, name)
                .await
                .map_err(Error::from)
        },
    )
    .await
    .with_context(|| format!("Failed to load GSMSecret {namespace}/{name}"))?;

    let Some(resource) = current else {
        debug!("GSMSecret no longer exists, nothing to do");
        return Ok(Action::await_change());
    };

    let payloads = match fetch(ctx, &resource).await {
        Ok(payloads) => payloads,
        Err(err) => {
            report_failure(ctx, &resource, REASON_FETCH_FAILED, &err).await;
            return Err(ReconcilerError::FetchFailed(err));
        }
    };

    let desired = match build_secret(&resource.spec.target_ref, namespace, payloads) {
        Ok(secret) => secret,
        Err(err) => {
            report_failure(ctx, &resource, REASON_BUILD_FAILED, &err).await;
            return Err(ReconcilerError::BuildFailed(err));
        }
    };

    let outcome = match apply_secret(ctx.cluster.as_ref(), &resource, desired, timeout).await {
        Ok(outcome) => outcome,
        Err(err) => {
            report_failure(ctx, &resource, REASON_APPLY_FAILED, &err).await;
            return Err(ReconcilerError::ApplyFailed(err));
        }
    };

    let target = resource.spec.target_name();
    update_ready_condition(
        ctx.cluster.as_ref(),
        &resource,
        ConditionStatus::True,
        REASON_SYNCED,
        format!("Secret {target} is in sync"),
        timeout,
    )
    .await
    .map_err(ReconcilerError::StatusUpdateFailed)?;

    info!(
        target = %target,
        outcome = outcome.as_str(),
        resync_secs = ctx.config.resync_interval.as_secs(),
        "Reconciled"
    );
    Ok(Action::requeue(ctx.config.resync_interval))
}

/// Broker, then resolver, with a credential that lives for this call only
async fn fetch(ctx: &Reconciler, resource: &GsmSecret) -> Result<Vec<KeyedPayload>> {
    let credential = ctx.broker.authenticate(resource).await?;
    debug!(strategy = credential.strategy(), "Credential obtained");
    let store = ctx.connector.connect(credential);
    resolve_entries(store.as_ref(), &resource.spec.entries).await
}

async fn report_failure(ctx: &Reconciler, resource: &GsmSecret, reason: &str, err: &Error) {
    warn!(reason, error_kind = err.kind(), error = %err, "Reconcile phase failed");
    if let Err(status_err) = update_ready_condition(
        ctx.cluster.as_ref(),
        resource,
        ConditionStatus::False,
        reason,
        err.to_string(),
        ctx.config.http_timeout,
    )
    .await
    {
        warn!(reason, error = %status_err, "Failed to record failure in status");
    }
}
