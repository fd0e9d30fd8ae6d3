//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// API group of the `InfraDependency` custom resource
pub const API_GROUP: &str = "infra.octopilot.io";

/// Field manager name used for writes issued by the controller
pub const FIELD_MANAGER: &str = "infra-dependency-controller";

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default requeue interval while a dependency is not ready (seconds)
pub const DEFAULT_NOT_READY_REQUEUE_SECS: u64 = 30;

/// Default delay before a settled dependency is checked again (seconds)
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 300;

/// Default Fibonacci backoff floor for failed passes (minutes)
pub const DEFAULT_BACKOFF_MIN_MINUTES: u64 = 1;

/// Default Fibonacci backoff ceiling for failed passes (minutes)
pub const DEFAULT_BACKOFF_MAX_MINUTES: u64 = 10;

/// Default root directory under which trust material is mounted
pub const DEFAULT_TRUST_MOUNT_ROOT: &str = "/etc/trust";

/// Default maximum number of concurrent reconciliations
pub const DEFAULT_MAX_CONCURRENT_RECONCILIATIONS: u16 = 10;

/// Suffix of the credential secret name when no custom name is declared
pub const CREDENTIAL_SECRET_SUFFIX: &str = "-credential";

/// Condition type reporting overall dependency readiness
pub const CONDITION_READY: &str = "Ready";

/// Condition type reporting inconsistent trust material
pub const CONDITION_TRUST_MATERIAL: &str = "TrustMaterialAvailable";
