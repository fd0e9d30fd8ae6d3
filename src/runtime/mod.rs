//! # Runtime
//!
//! Wires the reconciler into a kube-runtime controller.
//!
//! - `error_policy`: Per-declaration Fibonacci backoff for failed passes
//! - `initialization`: Tracing, metrics, probe server and client setup
//! - `watch_loop`: Controller watch over `InfraDependency` in all namespaces

pub mod error_policy;
pub mod initialization;
pub mod watch_loop;

use crate::controller::reconciler::InfraReconciler;
use crate::crd::InfraDependency;
use crate::error::InfraError;
use error_policy::{resource_key, BackoffState};
use kube_runtime::controller::Action;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Shared context handed to every reconciliation
#[derive(Debug)]
pub struct Context {
    pub reconciler: InfraReconciler,
    /// Backoff state per declaration (identified by namespace/name)
    pub backoff_states: Mutex<HashMap<String, BackoffState>>,
}

impl Context {
    #[must_use]
    pub fn new(reconciler: InfraReconciler) -> Self {
        Self {
            reconciler,
            backoff_states: Mutex::new(HashMap::new()),
        }
    }

    /// Forget the failure history of a declaration
    pub fn reset_backoff(&self, key: &str) {
        self.backoff_states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

/// Controller entry point for one declaration
///
/// Not-ready dependencies come back after the short not-ready delay. Settled
/// dependencies are re-checked after the resync interval, so a backing
/// resource that degrades later is reflected in the status.
///
/// # Errors
///
/// Propagates pass failures to [`error_policy::error_policy`].
pub async fn reconcile(obj: Arc<InfraDependency>, ctx: Arc<Context>) -> Result<Action, InfraError> {
    let outcome = ctx.reconciler.reconcile(&obj).await?;
    ctx.reset_backoff(&resource_key(&obj));

    if outcome.declaration_deleted {
        return Ok(Action::await_change());
    }
    let delay = outcome
        .requeue_after
        .unwrap_or_else(|| ctx.reconciler.config().resync_interval());
    Ok(Action::requeue(delay))
}
