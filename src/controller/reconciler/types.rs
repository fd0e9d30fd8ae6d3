//! # Reconciler Types
//!
//! The reconciler handle and the result of a single pass.

use crate::adapter::AdapterRegistry;
use crate::client::ResourceClient;
use crate::config::ControllerConfig;
use crate::crd::InfraDependencyStatus;
use std::sync::Arc;
use std::time::Duration;

/// Drives `InfraDependency` declarations toward a ready state
///
/// Holds no per-declaration state: every pass starts from what the cluster
/// reports, so one instance can serve all declarations concurrently.
#[derive(Clone)]
pub struct InfraReconciler {
    pub(crate) client: Arc<dyn ResourceClient>,
    pub(crate) registry: AdapterRegistry,
    pub(crate) config: ControllerConfig,
}

impl std::fmt::Debug for InfraReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfraReconciler")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl InfraReconciler {
    /// Reconciler with every built-in adapter
    #[must_use]
    pub fn new(client: Arc<dyn ResourceClient>, config: ControllerConfig) -> Self {
        Self::with_registry(client, AdapterRegistry::with_defaults(), config)
    }

    #[must_use]
    pub fn with_registry(
        client: Arc<dyn ResourceClient>,
        registry: AdapterRegistry,
        config: ControllerConfig,
    ) -> Self {
        Self {
            client,
            registry,
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    #[must_use]
    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }
}

/// Result of one reconciliation pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Delay before the next pass, `None` when the dependency is settled
    pub requeue_after: Option<Duration>,
    /// Status computed by the pass
    pub status: InfraDependencyStatus,
    /// Whether the pass wrote the status (false when it was already current)
    pub status_written: bool,
    /// The declaration was deleted before or during the pass
    pub declaration_deleted: bool,
}

impl ReconcileOutcome {
    /// Whether another pass is needed before the dependency settles
    #[must_use]
    pub fn requeue(&self) -> bool {
        self.requeue_after.is_some()
    }

    pub(crate) fn settled(status: InfraDependencyStatus, status_written: bool) -> Self {
        Self {
            requeue_after: None,
            status,
            status_written,
            declaration_deleted: false,
        }
    }

    pub(crate) fn deleted(status: InfraDependencyStatus) -> Self {
        Self {
            requeue_after: None,
            status,
            status_written: false,
            declaration_deleted: true,
        }
    }
}
