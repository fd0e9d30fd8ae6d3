//! # Credential & Trust Provisioner
//!
//! Confirms the secrets a consuming workload needs exist before their
//! bindings are published.
//!
//! Secrets are only ever read. A missing secret is a normal start-up state
//! (the backing operator creates it asynchronously), so every failure here is
//! reported as a NotReady-class [`InfraError`].
//!
//! Bindings are consumed by workloads in the declaration's namespace, and
//! Kubernetes resolves secret references only within a pod's own namespace.
//! A secret anywhere else is reported instead of published.

use crate::adapter::{BackingResource, InfraAdapter, SecretRef};
use crate::client::ResourceClient;
use crate::crd::InfraDependency;
use crate::error::InfraError;
use k8s_openapi::api::core::v1::Secret;
use tracing::debug;

/// Trust material a consuming workload should mount
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustMaterial {
    pub secret: SecretRef,
    /// Data key inside the secret holding the certificate
    pub key: String,
    pub mount_path: String,
}

impl TrustMaterial {
    /// Full path of the certificate file inside the mount
    #[must_use]
    pub fn file_path(&self) -> String {
        format!("{}/{}", self.mount_path, self.key)
    }
}

/// Secrets confirmed for a backing resource
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Provisioned {
    /// Credential secret, absent when the backing resource needs no authentication
    pub credential: Option<SecretRef>,
    /// Trust material, absent when encryption is disabled
    pub trust: Option<TrustMaterial>,
}

/// Mount path of the trust material for a kind
#[must_use]
pub fn trust_mount_path(root: &str, kind: &str) -> String {
    format!("{}/{}", root.trim_end_matches('/'), kind.to_lowercase())
}

/// Confirm the credential secret and the trust material of a backing resource
///
/// # Errors
///
/// - [`InfraError::SecretOutsideNamespace`] when a required secret lives outside
///   the declaration's namespace
/// - [`InfraError::CredentialSecretNotFound`] when credentials are required but absent
/// - [`InfraError::TrustSecretNotFound`] when encryption is on but the trust secret is absent
/// - [`InfraError::TrustMaterialMissing`] when the trust secret lacks the adapter's key
/// - [`InfraError::Client`] on API failures
pub async fn provision(
    client: &dyn ResourceClient,
    adapter: &dyn InfraAdapter,
    backing: &BackingResource,
    dependency: &InfraDependency,
    trust_mount_root: &str,
) -> Result<Provisioned, InfraError> {
    let consumer_namespace = dependency.namespace_or_default();
    let credential = if adapter.requires_credentials(backing)? {
        let secret_ref = adapter.credential_ref(backing, dependency);
        ensure_reachable(&secret_ref, &consumer_namespace)?;
        if client
            .get_secret(&secret_ref.namespace, &secret_ref.name)
            .await?
            .is_none()
        {
            return Err(InfraError::CredentialSecretNotFound {
                namespace: secret_ref.namespace,
                name: secret_ref.name,
            });
        }
        debug!("Credential secret {} present", secret_ref);
        Some(secret_ref)
    } else {
        debug!("{} does not require credentials", backing.target);
        None
    };

    let trust = match adapter.trust_ref(backing)? {
        Some(secret_ref) => {
            ensure_reachable(&secret_ref, &consumer_namespace)?;
            let secret = client
                .get_secret(&secret_ref.namespace, &secret_ref.name)
                .await?
                .ok_or_else(|| InfraError::TrustSecretNotFound {
                    namespace: secret_ref.namespace.clone(),
                    name: secret_ref.name.clone(),
                })?;

            let key = adapter.trust_key().to_string();
            if !has_key(&secret, &key) {
                return Err(InfraError::TrustMaterialMissing {
                    namespace: secret_ref.namespace,
                    name: secret_ref.name,
                    key,
                });
            }
            Some(TrustMaterial {
                secret: secret_ref,
                key,
                mount_path: trust_mount_path(trust_mount_root, adapter.kind()),
            })
        }
        None => None,
    };

    Ok(Provisioned { credential, trust })
}

fn ensure_reachable(secret_ref: &SecretRef, consumer_namespace: &str) -> Result<(), InfraError> {
    if secret_ref.namespace == consumer_namespace {
        Ok(())
    } else {
        Err(InfraError::SecretOutsideNamespace {
            secret: secret_ref.to_string(),
            namespace: consumer_namespace.to_string(),
        })
    }
}

fn has_key(secret: &Secret, key: &str) -> bool {
    secret
        .data
        .as_ref()
        .and_then(|data| data.get(key))
        .is_some_and(|value| !value.0.is_empty())
        || secret
            .string_data
            .as_ref()
            .and_then(|data| data.get(key))
            .is_some_and(|value| !value.is_empty())
}
