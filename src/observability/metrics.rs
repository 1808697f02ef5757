//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `gsm_secret_controller_reconciliations_total` - Total number of reconciliations
//! - `gsm_secret_controller_reconciliation_errors_total` - Reconcile failures by Ready reason
//! - `gsm_secret_controller_reconciliation_duration_seconds` - Duration of reconciliation operations
//! - `gsm_secret_controller_credential_exchanges_total` - Broker outcomes by strategy
//! - `gsm_secret_controller_secret_fetches_total` - Secret Manager version reads by outcome
//! - `gsm_secret_controller_secret_fetch_duration_seconds` - Duration of Secret Manager reads
//! - `gsm_secret_controller_target_writes_total` - Secret creates and updates
//! - `gsm_secret_controller_requeues_total` - Requeues by reason

use anyhow::Result;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};
use std::sync::LazyLock;

// Metrics
pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "gsm_secret_controller_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "gsm_secret_controller_reconciliation_errors_total",
            "Total number of reconciliation errors by Ready reason",
        ),
        &["reason"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "gsm_secret_controller_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static CREDENTIAL_EXCHANGES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "gsm_secret_controller_credential_exchanges_total",
            "Total number of credential exchanges by strategy and outcome",
        ),
        &["strategy", "outcome"],
    )
    .expect("Failed to create CREDENTIAL_EXCHANGES_TOTAL metric - this should never happen")
});

static SECRET_FETCHES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "gsm_secret_controller_secret_fetches_total",
            "Total number of Secret Manager version reads by outcome",
        ),
        &["outcome"],
    )
    .expect("Failed to create SECRET_FETCHES_TOTAL metric - this should never happen")
});

static SECRET_FETCH_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "gsm_secret_controller_secret_fetch_duration_seconds",
            "Duration of Secret Manager version reads in seconds",
        )
        .buckets(vec![0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
    )
    .expect("Failed to create SECRET_FETCH_DURATION metric - this should never happen")
});

static TARGET_WRITES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "gsm_secret_controller_target_writes_total",
            "Total number of Kubernetes Secret writes by operation",
        ),
        &["operation"],
    )
    .expect("Failed to create TARGET_WRITES_TOTAL metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "gsm_secret_controller_requeues_total",
            "Total number of requeues by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

#[allow(
    clippy::missing_errors_doc,
    reason = "Fails only if a metric is registered twice"
)]
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(CREDENTIAL_EXCHANGES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SECRET_FETCHES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(SECRET_FETCH_DURATION.clone()))?;
    REGISTRY.register(Box::new(TARGET_WRITES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(REQUEUES_TOTAL.clone()))?;
    Ok(())
}

pub fn increment_reconciliations() {
    RECONCILIATIONS_TOTAL.inc();
}

pub fn increment_reconciliation_errors(reason: &str) {
    RECONCILIATION_ERRORS_TOTAL.with_label_values(&[reason]).inc();
}

pub fn observe_reconciliation_duration(duration: f64) {
    RECONCILIATION_DURATION.observe(duration);
}

/// Record one broker run; `strategy` is the credential variant label
pub fn record_credential_exchange(strategy: &str, success: bool) {
    let outcome = if success { "success" } else { "error" };
    CREDENTIAL_EXCHANGES_TOTAL
        .with_label_values(&[strategy, outcome])
        .inc();
}

pub fn record_secret_fetch(outcome: &str, duration: f64) {
    SECRET_FETCHES_TOTAL.with_label_values(&[outcome]).inc();
    SECRET_FETCH_DURATION.observe(duration);
}

/// `operation` is `create` or `update`
pub fn increment_target_writes(operation: &str) {
    TARGET_WRITES_TOTAL.with_label_values(&[operation]).inc();
}

pub fn increment_requeues_total(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}
