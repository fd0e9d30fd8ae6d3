//! # Error Policy
//!
//! Retry scheduling for failed reconciliation passes.
//!
//! Each declaration keeps its own Fibonacci backoff, so one failing
//! declaration never delays retries of the others. The backoff is reset after
//! the next successful pass.

use crate::controller::backoff::FibonacciBackoff;
use crate::crd::InfraDependency;
use crate::error::InfraError;
use crate::observability::metrics;
use crate::runtime::Context;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use tracing::{info, warn};

/// Backoff state for a specific declaration
#[derive(Debug, Clone)]
pub struct BackoffState {
    pub backoff: FibonacciBackoff,
    pub error_count: u32,
}

impl BackoffState {
    #[must_use]
    pub fn new(min_minutes: u64, max_minutes: u64) -> Self {
        Self {
            backoff: FibonacciBackoff::new(min_minutes, max_minutes),
            error_count: 0,
        }
    }

    pub fn increment_error(&mut self) {
        self.error_count += 1;
    }
}

/// Key identifying a declaration in the backoff table
#[must_use]
pub fn resource_key(dependency: &InfraDependency) -> String {
    backoff_key(Some(&dependency.namespace_or_default()), &dependency.name_any())
}

/// Backoff table key for a namespace and name, as carried by object references
#[must_use]
pub fn backoff_key(namespace: Option<&str>, name: &str) -> String {
    format!("{}/{}", namespace.unwrap_or("default"), name)
}

/// Schedule the retry of a failed pass
pub fn error_policy(obj: Arc<InfraDependency>, error: &InfraError, ctx: Arc<Context>) -> Action {
    let key = resource_key(&obj);
    let config = ctx.reconciler.config();

    let (delay_secs, error_count) = {
        let mut states = ctx
            .backoff_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let state = states.entry(key.clone()).or_insert_with(|| {
            BackoffState::new(config.backoff_min_minutes, config.backoff_max_minutes)
        });
        state.increment_error();
        (state.backoff.next_backoff_seconds(), state.error_count)
    };

    if error.is_transient() {
        info!("{}: {}, retrying in {}s", key, error, delay_secs);
    } else {
        warn!(
            "Reconciliation of {} failed ({} consecutive errors): {}, retrying in {}s",
            key, error_count, error, delay_secs
        );
    }

    metrics::increment_requeues("error-backoff");
    Action::requeue(Duration::from_secs(delay_secs))
}
