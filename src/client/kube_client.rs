//! # Kubernetes Resource Client
//!
//! [`ResourceClient`] backed by a live `kube::Client`.

use super::{ClientError, ResourceClient};
use crate::constants::FIELD_MANAGER;
use crate::crd::InfraDependency;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Secret, Service};
use kube::api::{Api, ApiResource, DynamicObject, PostParams};
use kube::{Client, ResourceExt};
use tracing::debug;

#[derive(Clone)]
pub struct KubeResourceClient {
    client: Client,
}

impl std::fmt::Debug for KubeResourceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeResourceClient").finish_non_exhaustive()
    }
}

impl KubeResourceClient {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn post_params() -> PostParams {
        PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..PostParams::default()
        }
    }
}

#[async_trait]
impl ResourceClient for KubeResourceClient {
    async fn get_object(
        &self,
        resource: &ApiResource,
        namespace: &str,
        name: &str,
    ) -> Result<Option<DynamicObject>, ClientError> {
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), namespace, resource);
        Ok(api.get_opt(name).await?)
    }

    async fn create_object(
        &self,
        resource: &ApiResource,
        object: &DynamicObject,
    ) -> Result<DynamicObject, ClientError> {
        let namespace = object.metadata.namespace.as_deref().ok_or_else(|| {
            ClientError::Invalid(format!("{} {} has no namespace", resource.kind, object.name_any()))
        })?;
        debug!("Creating {} {}/{}", resource.kind, namespace, object.name_any());
        let api: Api<DynamicObject> =
            Api::namespaced_with(self.client.clone(), namespace, resource);
        Ok(api.create(&Self::post_params(), object).await?)
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, ClientError> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn get_service(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Service>, ClientError> {
        let api: Api<Service> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn get_dependency(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<InfraDependency>, ClientError> {
        let api: Api<InfraDependency> = Api::namespaced(self.client.clone(), namespace);
        Ok(api.get_opt(name).await?)
    }

    async fn replace_dependency_status(
        &self,
        dependency: &InfraDependency,
    ) -> Result<InfraDependency, ClientError> {
        let api: Api<InfraDependency> =
            Api::namespaced(self.client.clone(), &dependency.namespace_or_default());
        // The full object carries metadata.resourceVersion, which makes the write conditional
        let body = serde_json::to_vec(dependency)?;
        Ok(api
            .replace_status(&dependency.name_any(), &Self::post_params(), body)
            .await?)
    }
}
