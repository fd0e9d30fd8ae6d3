//! # Metrics
//!
//! Prometheus metrics for monitoring the controller.
//!
//! ## Metrics Exposed
//!
//! - `infra_dependency_reconciliations_total` - Total number of reconciliation passes
//! - `infra_dependency_reconciliation_errors_total` - Failed passes by error reason
//! - `infra_dependency_reconciliation_duration_seconds` - Duration of reconciliation passes
//! - `infra_dependency_readiness_total` - Readiness verdicts by backing kind and state
//! - `infra_dependency_backing_resources_created_total` - Backing resources created by kind
//! - `infra_dependency_status_writes_total` - Status writes issued
//! - `infra_dependency_status_writes_skipped_total` - Passes whose status was already current
//! - `infra_dependency_status_conflicts_total` - Status writes that lost a concurrency race
//! - `infra_dependency_requeues_total` - Requeues by reason

use anyhow::Result;
use prometheus::{Histogram, IntCounter, IntCounterVec, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "infra_dependency_reconciliations_total",
        "Total number of reconciliations",
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "infra_dependency_reconciliation_errors_total",
            "Total number of reconciliation errors by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        prometheus::HistogramOpts::new(
            "infra_dependency_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0]),
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static READINESS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "infra_dependency_readiness_total",
            "Readiness verdicts by backing resource kind and state",
        ),
        &["kind", "state"],
    )
    .expect("Failed to create READINESS_TOTAL metric - this should never happen")
});

static BACKING_RESOURCES_CREATED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "infra_dependency_backing_resources_created_total",
            "Total number of backing resources created by kind",
        ),
        &["kind"],
    )
    .expect("Failed to create BACKING_RESOURCES_CREATED_TOTAL metric - this should never happen")
});

static STATUS_WRITES_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "infra_dependency_status_writes_total",
        "Total number of status writes",
    )
    .expect("Failed to create STATUS_WRITES_TOTAL metric - this should never happen")
});

static STATUS_WRITES_SKIPPED_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "infra_dependency_status_writes_skipped_total",
        "Total number of passes whose computed status was already current",
    )
    .expect("Failed to create STATUS_WRITES_SKIPPED_TOTAL metric - this should never happen")
});

static STATUS_CONFLICTS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "infra_dependency_status_conflicts_total",
        "Total number of status writes rejected with a conflict",
    )
    .expect("Failed to create STATUS_CONFLICTS_TOTAL metric - this should never happen")
});

static REQUEUES_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "infra_dependency_requeues_total",
            "Total number of requeues by reason",
        ),
        &["reason"],
    )
    .expect("Failed to create REQUEUES_TOTAL metric - this should never happen")
});

/// Register every metric with the registry served on `/metrics`
///
/// # Errors
///
/// Fails when called twice, as the metrics are already registered.
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(READINESS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(BACKING_RESOURCES_CREATED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(STATUS_WRITES_TOTAL.clone()))?;
    REGISTRY.register(Box::new(STATUS_WRITES_SKIPPED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(STATUS_CONFLICTS_TOTAL.clone()))?;
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

pub fn record_readiness(kind: &str, state: &str) {
    READINESS_TOTAL.with_label_values(&[kind, state]).inc();
}

pub fn increment_backing_resources_created(kind: &str) {
    BACKING_RESOURCES_CREATED_TOTAL.with_label_values(&[kind]).inc();
}

pub fn increment_status_writes() {
    STATUS_WRITES_TOTAL.inc();
}

pub fn increment_status_writes_skipped() {
    STATUS_WRITES_SKIPPED_TOTAL.inc();
}

pub fn increment_status_conflicts() {
    STATUS_CONFLICTS_TOTAL.inc();
}

pub fn increment_requeues(reason: &str) {
    REQUEUES_TOTAL.with_label_values(&[reason]).inc();
}

/// Text exposition of every registered metric
///
/// # Errors
///
/// Fails if encoding the metric families fails.
pub fn gather_text() -> Result<String> {
    use prometheus::Encoder;

    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&REGISTRY.gather(), &mut buffer)?;
    Ok(String::from_utf8(buffer)?)
}
