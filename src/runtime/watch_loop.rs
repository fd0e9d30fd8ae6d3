//! # Watch Loop
//!
//! Controller watch loop over `InfraDependency` resources in all namespaces.
//!
//! kube-runtime guarantees at most one active pass per declaration; passes
//! for different declarations run concurrently up to the configured limit.
//! A retry scheduled for a declaration that has since been deleted surfaces
//! as `ObjectNotFound`, which drops the declaration's backoff state.

use crate::controller::server::ServerState;
use crate::crd::InfraDependency;
use crate::runtime::error_policy::{backoff_key, error_policy};
use crate::runtime::{reconcile, Context};
use futures::StreamExt;
use kube::api::Api;
use kube_runtime::{controller, watcher, Controller};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Run the controller until a shutdown signal is received
///
/// # Errors
///
/// Returns an error if the controller cannot be started.
pub async fn run_watch_loop(
    dependencies: Api<InfraDependency>,
    context: Arc<Context>,
    server_state: Arc<ServerState>,
    max_concurrent_reconciliations: u16,
) -> Result<(), anyhow::Error> {
    info!(
        "Starting controller watch loop (concurrency {})...",
        max_concurrent_reconciliations
    );
    server_state.set_ready(true);

    let pruning = Arc::clone(&context);
    Controller::new(dependencies, watcher::Config::default().any_semantic())
        .with_config(controller::Config::default().concurrency(max_concurrent_reconciliations))
        .shutdown_on_signal()
        .run(reconcile, error_policy, context)
        .for_each(|result| {
            let pruning = Arc::clone(&pruning);
            async move {
                match result {
                    Ok((object, _)) => debug!(
                        "Reconciled {}/{}",
                        object.namespace.unwrap_or_default(),
                        object.name
                    ),
                    Err(controller::Error::ReconcilerFailed(_, object)) => debug!(
                        "Pass for {}/{} failed, retry scheduled",
                        object.namespace.unwrap_or_default(),
                        object.name
                    ),
                    Err(controller::Error::ObjectNotFound(object)) => {
                        debug!(
                            "{}/{} no longer exists, dropping its backoff",
                            object.namespace.as_deref().unwrap_or_default(),
                            object.name
                        );
                        pruning.reset_backoff(&backoff_key(
                            object.namespace.as_deref(),
                            &object.name,
                        ));
                    }
                    Err(e) => warn!("Controller error: {}", e),
                }
            }
        })
        .await;

    server_state.set_ready(false);
    info!("Controller stopped gracefully");
    Ok(())
}
