//! # Error Policy
//!
//! Decides when a failed reconcile runs again.
//!
//! Configuration and validation failures will not heal by themselves, so they
//! wait for the next resync (or an edit to the resource, which the watch picks
//! up immediately). Everything else retries on a per-resource Fibonacci
//! backoff that resets after the next success.

use crate::controller::reconciler::{Reconciler, ReconcilerError};
use crate::crd::GsmSecret;
use crate::observability::metrics;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Handle a reconciliation error with per-resource Fibonacci backoff
pub fn error_policy(obj: Arc<GsmSecret>, error: &ReconcilerError, ctx: Arc<Reconciler>) -> Action {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_default();

    let error_span = tracing::span!(
        tracing::Level::ERROR,
        "controller.watch.reconciliation_error",
        resource.name = %name,
        resource.namespace = %namespace,
        reason = error.reason(),
        error = %error
    );
    let _error_guard = error_span.enter();

    metrics::increment_reconciliation_errors(error.reason());

    if error.is_terminal() {
        warn!(
            "Reconciliation of {}/{} failed permanently: {} (retrying at next resync in {}s)",
            namespace,
            name,
            error,
            ctx.config.resync_interval.as_secs()
        );
        metrics::increment_requeues_total("terminal");
        return Action::requeue(ctx.config.resync_interval);
    }

    error!("Reconciliation error for {}/{}: {}", namespace, name, error);

    let (delay, error_count) = ctx.next_backoff(&format!("{namespace}/{name}"));
    let next_trigger_time = chrono::Utc::now()
        + chrono::Duration::from_std(delay).unwrap_or_else(|_| chrono::Duration::zero());

    info!(
        "Retrying with Fibonacci backoff: {}s (error count: {}, next attempt at {})",
        delay.as_secs(),
        error_count,
        next_trigger_time.to_rfc3339()
    );

    metrics::increment_requeues_total("error-backoff");
    Action::requeue(delay)
}
