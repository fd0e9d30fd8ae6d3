//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.

use crate::constants::{
    DEFAULT_BACKOFF_MAX_MINUTES, DEFAULT_BACKOFF_MIN_MINUTES,
    DEFAULT_MAX_CONCURRENT_RECONCILIATIONS, DEFAULT_METRICS_PORT, DEFAULT_NOT_READY_REQUEUE_SECS,
    DEFAULT_RESYNC_INTERVAL_SECS, DEFAULT_TRUST_MOUNT_ROOT,
};
use std::time::Duration;
use tracing::warn;

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
/// Environment variables are populated from a ConfigMap using `envFrom` in the deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// How long to wait before the next pass while a dependency is not ready (seconds)
    pub not_ready_requeue_secs: u64,
    /// How long to wait before re-checking a settled dependency (seconds)
    pub resync_interval_secs: u64,
    /// Fibonacci backoff floor after a failed pass (minutes)
    pub backoff_min_minutes: u64,
    /// Fibonacci backoff ceiling after a failed pass (minutes)
    pub backoff_max_minutes: u64,
    /// Port for the metrics and probe server
    pub metrics_port: u16,
    /// Root directory under which trust material volumes are mounted
    pub trust_mount_root: String,
    /// Maximum concurrent reconciliations
    pub max_concurrent_reconciliations: u16,
    /// Global log level (ERROR, WARN, INFO, DEBUG, TRACE)
    pub log_level: String,
    /// Log format (json, text)
    pub log_format: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            not_ready_requeue_secs: DEFAULT_NOT_READY_REQUEUE_SECS,
            resync_interval_secs: DEFAULT_RESYNC_INTERVAL_SECS,
            backoff_min_minutes: DEFAULT_BACKOFF_MIN_MINUTES,
            backoff_max_minutes: DEFAULT_BACKOFF_MAX_MINUTES,
            metrics_port: DEFAULT_METRICS_PORT,
            trust_mount_root: DEFAULT_TRUST_MOUNT_ROOT.to_string(),
            max_concurrent_reconciliations: DEFAULT_MAX_CONCURRENT_RECONCILIATIONS,
            log_level: "INFO".to_string(),
            log_format: "json".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    ///
    /// Values that fail to parse fall back to their default.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let backoff_min_minutes =
            parsed_or_default(&lookup, "BACKOFF_MIN_MINUTES", defaults.backoff_min_minutes).max(1);
        let backoff_max_minutes =
            parsed_or_default(&lookup, "BACKOFF_MAX_MINUTES", defaults.backoff_max_minutes)
                .max(backoff_min_minutes);

        Self {
            not_ready_requeue_secs: parsed_or_default(
                &lookup,
                "NOT_READY_REQUEUE_SECS",
                defaults.not_ready_requeue_secs,
            ),
            resync_interval_secs: parsed_or_default(
                &lookup,
                "RESYNC_INTERVAL_SECS",
                defaults.resync_interval_secs,
            )
            .max(1),
            backoff_min_minutes,
            backoff_max_minutes,
            metrics_port: parsed_or_default(&lookup, "METRICS_PORT", defaults.metrics_port),
            trust_mount_root: lookup("TRUST_MOUNT_ROOT")
                .map(|root| root.trim_end_matches('/').to_string())
                .filter(|root| !root.is_empty())
                .unwrap_or(defaults.trust_mount_root),
            max_concurrent_reconciliations: parsed_or_default(
                &lookup,
                "MAX_CONCURRENT_RECONCILIATIONS",
                defaults.max_concurrent_reconciliations,
            ),
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT").unwrap_or(defaults.log_format),
        }
    }

    /// Requeue delay while a dependency is not ready
    #[must_use]
    pub fn not_ready_requeue_duration(&self) -> Duration {
        Duration::from_secs(self.not_ready_requeue_secs)
    }

    /// Delay before a settled dependency is checked again
    #[must_use]
    pub fn resync_interval(&self) -> Duration {
        Duration::from_secs(self.resync_interval_secs)
    }
}

fn parsed_or_default<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + Copy,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Ignoring invalid value '{}' for {}, using default", raw, key);
            default
        }),
        None => default,
    }
}
