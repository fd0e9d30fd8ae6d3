//! # Resource Client
//!
//! The narrow slice of the Kubernetes API the reconciler needs.
//!
//! Every read and write issued during a pass goes through [`ResourceClient`],
//! so the reconciler can be driven against a live cluster ([`KubeResourceClient`])
//! or an in-memory store ([`FakeResourceClient`]) without changes.
//! Implementations must be safe for concurrent use across declarations.

mod fake;
mod kube_client;

pub use self::fake::{FakeClientBuilder, FakeResourceClient};
pub use self::kube_client::KubeResourceClient;

use crate::crd::InfraDependency;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Secret, Service};
use kube::api::{ApiResource, DynamicObject};
use kube::ResourceExt;
use thiserror::Error;

/// Errors surfaced by a [`ResourceClient`]
#[derive(Debug, Error)]
pub enum ClientError {
    /// Optimistic concurrency conflict (HTTP 409)
    #[error("conflict: {0}")]
    Conflict(String),
    /// The object being updated no longer exists (HTTP 404 on write)
    #[error("not found: {0}")]
    NotFound(String),
    /// The API refused the request (validation, admission, permissions)
    #[error("request rejected ({code}): {message}")]
    Rejected { code: u16, message: String },
    /// The request was malformed before it reached the API
    #[error("invalid request: {0}")]
    Invalid(String),
    #[error("kubernetes API error: {0}")]
    Kube(#[source] kube::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<kube::Error> for ClientError {
    fn from(error: kube::Error) -> Self {
        match error {
            kube::Error::Api(response) => match response.code {
                409 => ClientError::Conflict(response.message),
                404 => ClientError::NotFound(response.message),
                400 | 403 | 422 => ClientError::Rejected {
                    code: response.code,
                    message: response.message,
                },
                _ => ClientError::Kube(kube::Error::Api(response)),
            },
            other => ClientError::Kube(other),
        }
    }
}

/// Typed access to the cluster objects a reconciliation pass reads and writes
#[async_trait]
pub trait ResourceClient: Send + Sync {
    /// Get a custom object of an arbitrary kind. `Ok(None)` when it does not exist.
    async fn get_object(
        &self,
        resource: &ApiResource,
        namespace: &str,
        name: &str,
    ) -> Result<Option<DynamicObject>, ClientError>;

    /// Create a custom object in the namespace set on its metadata
    async fn create_object(
        &self,
        resource: &ApiResource,
        object: &DynamicObject,
    ) -> Result<DynamicObject, ClientError>;

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, ClientError>;

    async fn get_service(&self, namespace: &str, name: &str)
        -> Result<Option<Service>, ClientError>;

    async fn get_dependency(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<InfraDependency>, ClientError>;

    /// Replace the status subresource of a declaration in a single write.
    ///
    /// The declaration's `resourceVersion` is sent along, so a concurrent
    /// modification yields [`ClientError::Conflict`].
    async fn replace_dependency_status(
        &self,
        dependency: &InfraDependency,
    ) -> Result<InfraDependency, ClientError>;
}

/// Check whether a declaration still exists in the cluster
///
/// # Errors
///
/// Propagates any API failure other than absence.
pub async fn fetch(
    client: &dyn ResourceClient,
    dependency: &InfraDependency,
) -> Result<bool, ClientError> {
    let namespace = dependency.namespace_or_default();
    Ok(client
        .get_dependency(&namespace, &dependency.name_any())
        .await?
        .is_some())
}
