//! # Reconciliation Pass
//!
//! One level-triggered pass over a single `InfraDependency`.
//!
//! ```text
//! ensure backing resource -> read readiness
//!   not ready / unknown -> write status (not ready) -> requeue after delay
//!   ready -> resolve endpoint -> provision secrets -> project bindings
//!         -> write status (ready) -> settled
//! ```
//!
//! Transient absence of an endpoint or secret ends the pass as not ready with
//! a requeue. Any other error aborts the pass before the status write and is
//! left to the scheduler's backoff.

use crate::adapter::{BackingResource, Endpoint, InfraAdapter};
use crate::client::{self, ClientError};
use crate::controller::projection::{project, Projection};
use crate::controller::provision::provision;
use crate::controller::reconciler::status::{build_status, stamp_transitions, Evaluation};
use crate::controller::reconciler::types::{InfraReconciler, ReconcileOutcome};
use crate::crd::{InfraDependency, InfraDependencyStatus};
use crate::error::InfraError;
use crate::observability::metrics;
use kube::ResourceExt;
use std::time::Instant;
use tracing::{debug, error, info, warn, Instrument};

/// How a status write ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StatusWrite {
    Written,
    Unchanged,
    /// The declaration was deleted while the pass ran
    Gone,
}

impl InfraReconciler {
    /// Run one reconciliation pass
    ///
    /// # Errors
    ///
    /// Returns an error for failures that should be retried with backoff:
    /// unsupported kinds, rejected creations, malformed backing resources,
    /// repeated status conflicts and API failures. Transient absence of
    /// dependent objects is not an error; it yields a not-ready status and a
    /// requeue.
    pub async fn reconcile(
        &self,
        dependency: &InfraDependency,
    ) -> Result<ReconcileOutcome, InfraError> {
        let start = Instant::now();
        metrics::increment_reconciliations();

        let name = dependency.name_any();
        let namespace = dependency.namespace_or_default();
        let span = tracing::span!(
            tracing::Level::INFO,
            "reconcile",
            resource.name = name.as_str(),
            resource.namespace = namespace.as_str(),
            resource.kind = dependency.spec.resource_kind.as_str()
        );
        let result = self.run(dependency).instrument(span).await;
        metrics::observe_reconciliation_duration(start.elapsed().as_secs_f64());

        if let Err(e) = &result {
            metrics::increment_reconciliation_errors(e.reason());
            error!("Reconciliation of {}/{} failed: {}", namespace, name, e);
        }
        result
    }

    async fn run(&self, dependency: &InfraDependency) -> Result<ReconcileOutcome, InfraError> {
        let resources = self.client.as_ref();

        if !client::fetch(resources, dependency).await? {
            debug!("Declaration no longer exists, nothing to do");
            return Ok(ReconcileOutcome::deleted(InfraDependencyStatus::default()));
        }

        let adapter = self.registry.for_dependency(dependency)?;
        let backing = adapter.ensure(resources, dependency).await?;
        let verdict = adapter.readiness(&backing)?;
        metrics::record_readiness(adapter.kind(), verdict.state.as_str());
        debug!("{} readiness: {:?} ({})", backing.target, verdict.state, verdict.reason);

        let mut endpoint = None;
        let mut projection = None;
        let mut problem = None;
        if verdict.is_ready() {
            match self.connect(adapter.as_ref(), &backing, dependency).await {
                Ok((resolved, projected)) => {
                    endpoint = Some(resolved);
                    projection = Some(projected);
                }
                Err((resolved, e)) if e.is_transient() => {
                    warn!("{} is ready but cannot be consumed yet: {}", backing.target, e);
                    endpoint = resolved;
                    problem = Some(e);
                }
                Err((_, e)) => return Err(e),
            }
        }

        let evaluation = Evaluation {
            backing: &backing,
            verdict: &verdict,
            endpoint: endpoint.as_ref(),
            projection: projection.as_ref(),
            problem: problem.as_ref(),
        };
        let now = chrono::Utc::now().to_rfc3339();
        let status = build_status(dependency, &evaluation, &now);

        let write = self.write_status(dependency, &status, &now).await?;
        if write == StatusWrite::Gone {
            info!("Declaration was deleted during the pass, skipping status update");
            return Ok(ReconcileOutcome::deleted(status));
        }
        let status_written = write == StatusWrite::Written;

        if evaluation.is_ready() {
            info!("{} is ready", backing.target);
            Ok(ReconcileOutcome::settled(status, status_written))
        } else {
            let reason = evaluation.requeue_reason();
            metrics::increment_requeues(reason);
            let delay = self.config.not_ready_requeue_duration();
            debug!("{} not ready ({}), requeue in {:?}", backing.target, reason, delay);
            Ok(ReconcileOutcome {
                requeue_after: Some(delay),
                status,
                status_written,
                declaration_deleted: false,
            })
        }
    }

    /// Resolve the endpoint, confirm secrets and project bindings
    ///
    /// On failure the endpoint is returned alongside the error when it was
    /// already resolved, so the status can still report it.
    async fn connect(
        &self,
        adapter: &dyn InfraAdapter,
        backing: &BackingResource,
        dependency: &InfraDependency,
    ) -> Result<(Endpoint, Projection), (Option<Endpoint>, InfraError)> {
        let service_name = adapter.service_name(backing);
        let service = self
            .client
            .get_service(backing.namespace(), &service_name)
            .await
            .map_err(|e| (None, InfraError::from(e)))?;
        let endpoint = adapter
            .endpoint(backing, service.as_ref())
            .map_err(|e| (None, e))?;

        match provision(
            self.client.as_ref(),
            adapter,
            backing,
            dependency,
            &self.config.trust_mount_root,
        )
        .await
        {
            Ok(provisioned) => {
                let projection = project(adapter, &endpoint, &provisioned);
                Ok((endpoint, projection))
            }
            Err(e) => Err((Some(endpoint), e)),
        }
    }

    /// Write the status if it differs from the current one
    ///
    /// A conflict is retried once against a freshly fetched declaration.
    async fn write_status(
        &self,
        dependency: &InfraDependency,
        status: &InfraDependencyStatus,
        now: &str,
    ) -> Result<StatusWrite, InfraError> {
        if dependency.status.as_ref() == Some(status) {
            debug!("Status unchanged, skipping write");
            metrics::increment_status_writes_skipped();
            return Ok(StatusWrite::Unchanged);
        }

        let mut updated = dependency.clone();
        updated.status = Some(status.clone());
        match self.client.replace_dependency_status(&updated).await {
            Ok(_) => {
                metrics::increment_status_writes();
                return Ok(StatusWrite::Written);
            }
            Err(ClientError::NotFound(_)) => return Ok(StatusWrite::Gone),
            Err(ClientError::Conflict(message)) => {
                metrics::increment_status_conflicts();
                debug!("Status write conflicted ({}), retrying once", message);
            }
            Err(e) => return Err(e.into()),
        }

        let name = dependency.name_any();
        let namespace = dependency.namespace_or_default();
        let Some(mut latest) = self.client.get_dependency(&namespace, &name).await? else {
            return Ok(StatusWrite::Gone);
        };

        let mut status = status.clone();
        stamp_transitions(&mut status, latest.status.as_ref(), now);
        if latest.status.as_ref() == Some(&status) {
            metrics::increment_status_writes_skipped();
            return Ok(StatusWrite::Unchanged);
        }
        latest.status = Some(status);

        match self.client.replace_dependency_status(&latest).await {
            Ok(_) => {
                metrics::increment_status_writes();
                Ok(StatusWrite::Written)
            }
            Err(ClientError::NotFound(_)) => Ok(StatusWrite::Gone),
            Err(ClientError::Conflict(_)) => {
                metrics::increment_status_conflicts();
                Err(InfraError::StatusWriteConflict { namespace, name })
            }
            Err(e) => Err(e.into()),
        }
    }
}
