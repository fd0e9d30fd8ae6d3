//! # Endpoint Projector
//!
//! Turns an endpoint plus confirmed secrets into the kind-agnostic bindings a
//! consuming workload applies: environment variables and secret volumes.
//!
//! Variable names are prefixed with the uppercased kind, so a workload can
//! consume several dependencies of different kinds without collisions.

use crate::adapter::{Endpoint, InfraAdapter};
use crate::controller::provision::Provisioned;
use crate::crd::{EnvVarBinding, VolumeBinding};

/// Bindings published in the declaration status
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    pub env_vars: Vec<EnvVarBinding>,
    pub volumes: Vec<VolumeBinding>,
}

/// Environment variable prefix for a kind: uppercase, non-alphanumerics as `_`
#[must_use]
pub fn env_prefix(kind: &str) -> String {
    kind.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}

/// Project connection details into bindings
#[must_use]
pub fn project(
    adapter: &dyn InfraAdapter,
    endpoint: &Endpoint,
    provisioned: &Provisioned,
) -> Projection {
    let prefix = env_prefix(adapter.kind());
    let mut env_vars = vec![
        EnvVarBinding::literal(format!("{prefix}_SERVICE_HOST"), endpoint.host.clone()),
        EnvVarBinding::literal(format!("{prefix}_SERVICE_PORT"), endpoint.port.to_string()),
    ];

    if let Some(credential) = &provisioned.credential {
        env_vars.extend(adapter.credential_keys().iter().map(|key| {
            EnvVarBinding::from_secret(
                format!("{prefix}_{}", key.env_suffix),
                &credential.name,
                key.secret_key,
            )
        }));
    }

    let mut volumes = Vec::new();
    if let Some(trust) = &provisioned.trust {
        volumes.push(VolumeBinding {
            name: format!("{}-trust", adapter.kind().to_lowercase()),
            secret_name: trust.secret.name.clone(),
            mount_path: trust.mount_path.clone(),
        });
        env_vars.push(EnvVarBinding::literal(
            format!("{prefix}_TRUSTSTORE_PATH"),
            trust.file_path(),
        ));
    }

    Projection { env_vars, volumes }
}
