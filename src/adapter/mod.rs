//! # Type Adapters
//!
//! Kind-specific knowledge about backing resources.
//!
//! Each supported kind has its own [`InfraAdapter`] implementation that decodes
//! the dynamic backing object into a typed view of the fields it cares about.
//! The reconciler only ever talks to the trait, and [`AdapterRegistry`]
//! dispatches on the declared `(apiVersion, kind)`.
//!
//! - `infinispan`: Infinispan cache clusters (`infinispan.org/v1`)
//! - `kafka`: Strimzi Kafka clusters (`kafka.strimzi.io/v1beta2`)
//! - `keycloak`: Keycloak identity providers (`k8s.keycloak.org/v2alpha1`)
//! - `mongodb`: MongoDB Community replica sets (`mongodbcommunity.mongodb.com/v1`)

mod infinispan;
mod kafka;
mod keycloak;
mod mongodb;

pub use self::infinispan::InfinispanAdapter;
pub use self::kafka::KafkaAdapter;
pub use self::keycloak::KeycloakAdapter;
pub use self::mongodb::MongoDbAdapter;

use crate::client::ResourceClient;
use crate::constants::CREDENTIAL_SECRET_SUFFIX;
use crate::controller::readiness::{ConditionStatus, ObservedCondition, ReadinessVerdict};
use crate::crd::{InfraDependency, TargetRef};
use crate::error::InfraError;
use crate::observability::metrics;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::api::{ApiResource, DynamicObject, GroupVersionKind};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

/// A backing resource as fetched (or just created) during a pass
#[derive(Debug, Clone)]
pub struct BackingResource {
    pub target: TargetRef,
    pub object: DynamicObject,
    /// Whether this pass created the object
    pub created: bool,
}

impl BackingResource {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.target.name
    }

    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.target.namespace
    }

    /// Decode the object into an adapter's typed view
    ///
    /// # Errors
    ///
    /// Returns [`InfraError::MalformedResource`] if the object does not match the view.
    pub fn view<T: DeserializeOwned>(&self) -> Result<T, InfraError> {
        serde_json::from_value(self.object.data.clone()).map_err(|source| {
            InfraError::MalformedResource {
                target: self.target.to_string(),
                source,
            }
        })
    }
}

/// Reference to a secret
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretRef {
    pub namespace: String,
    pub name: String,
}

impl SecretRef {
    #[must_use]
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for SecretRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Network endpoint of a backing resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: i32,
}

/// Maps an environment variable suffix onto a key of the credential secret
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialKey {
    pub env_suffix: &'static str,
    pub secret_key: &'static str,
}

/// Kind-specific behaviour for one backing resource type
#[async_trait]
pub trait InfraAdapter: Send + Sync + fmt::Debug {
    /// Kind of the backing resource, as declared in `resourceKind`
    fn kind(&self) -> &'static str;

    /// API resource the adapter serves
    fn api_resource(&self) -> ApiResource;

    /// Spec used when the backing resource has to be created
    fn default_spec(&self, target: &TargetRef, dependency: &InfraDependency) -> serde_json::Value;

    /// Get the backing resource, creating it with the default spec when absent
    ///
    /// # Errors
    ///
    /// [`InfraError::ResourceCreation`] when the API rejects the creation.
    async fn ensure(
        &self,
        client: &dyn ResourceClient,
        dependency: &InfraDependency,
    ) -> Result<BackingResource, InfraError> {
        ensure_backing_resource(self, client, dependency).await
    }

    /// Interpret the backing resource's conditions
    ///
    /// # Errors
    ///
    /// [`InfraError::MalformedResource`] when the status cannot be decoded.
    fn readiness(&self, backing: &BackingResource) -> Result<ReadinessVerdict, InfraError>;

    /// Name of the service fronting the backing resource
    fn service_name(&self, backing: &BackingResource) -> String;

    /// Resolve the connection endpoint from the backing resource's service
    ///
    /// # Errors
    ///
    /// [`InfraError::EndpointNotFound`] when the service or its port is missing.
    fn endpoint(
        &self,
        backing: &BackingResource,
        service: Option<&Service>,
    ) -> Result<Endpoint, InfraError>;

    /// Credential secret for the backing resource
    fn credential_ref(&self, backing: &BackingResource, dependency: &InfraDependency) -> SecretRef {
        let name = dependency.custom_credential_secret().map_or_else(
            || format!("{}{CREDENTIAL_SECRET_SUFFIX}", backing.name()),
            str::to_string,
        );
        SecretRef::new(backing.namespace(), name)
    }

    /// Whether clients must authenticate against the backing resource
    ///
    /// # Errors
    ///
    /// [`InfraError::MalformedResource`] when the spec cannot be decoded.
    fn requires_credentials(&self, _backing: &BackingResource) -> Result<bool, InfraError> {
        Ok(true)
    }

    /// Credential secret keys exposed to consuming workloads
    fn credential_keys(&self) -> &'static [CredentialKey];

    /// Trust material secret, present only when encryption is enabled
    ///
    /// # Errors
    ///
    /// [`InfraError::MalformedResource`] when the spec cannot be decoded.
    fn trust_ref(&self, backing: &BackingResource) -> Result<Option<SecretRef>, InfraError>;

    /// Data key holding the trust material inside the trust secret
    fn trust_key(&self) -> &str;
}

/// Shared get-or-create used by [`InfraAdapter::ensure`]
///
/// # Errors
///
/// Propagates read failures; creation failures become [`InfraError::ResourceCreation`].
pub async fn ensure_backing_resource<A: InfraAdapter + ?Sized>(
    adapter: &A,
    client: &dyn ResourceClient,
    dependency: &InfraDependency,
) -> Result<BackingResource, InfraError> {
    let target = dependency.target();
    let resource = adapter.api_resource();

    if let Some(object) = client
        .get_object(&resource, &target.namespace, &target.name)
        .await?
    {
        debug!("Found backing resource {}", target);
        return Ok(BackingResource {
            target,
            object,
            created: false,
        });
    }

    info!("Backing resource {} not found, creating it", target);
    let object = DynamicObject::new(&target.name, &resource)
        .within(&target.namespace)
        .data(serde_json::json!({ "spec": adapter.default_spec(&target, dependency) }));

    match client.create_object(&resource, &object).await {
        Ok(object) => {
            metrics::increment_backing_resources_created(adapter.kind());
            Ok(BackingResource {
                target,
                object,
                created: true,
            })
        }
        Err(source) => Err(InfraError::ResourceCreation {
            target: target.to_string(),
            source,
        }),
    }
}

/// Build an [`ApiResource`] for a kind with a known plural
#[must_use]
pub fn api_resource(group: &str, version: &str, kind: &str, plural: &str) -> ApiResource {
    ApiResource::from_gvk_with_plural(&GroupVersionKind::gvk(group, version, kind), plural)
}

/// A Kubernetes-style condition as reported in a backing resource's status
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCondition {
    #[serde(default, rename = "type")]
    pub condition_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// Convert reported conditions into the form the condition reader evaluates
#[must_use]
pub fn observed(conditions: &[RawCondition]) -> Vec<ObservedCondition> {
    conditions
        .iter()
        .filter(|c| !c.condition_type.is_empty())
        .map(|c| ObservedCondition {
            condition_type: c.condition_type.clone(),
            status: ConditionStatus::parse(&c.status),
            message: c.message.clone(),
        })
        .collect()
}

/// In-cluster DNS name of a service
#[must_use]
pub fn service_host(service: &str, namespace: &str) -> String {
    format!("{service}.{namespace}.svc")
}

/// Resolve an endpoint from a service
///
/// Picks the port named `port_name` when given and present, otherwise the first
/// port. The port number is the `targetPort` when numeric, else `port`.
///
/// # Errors
///
/// [`InfraError::EndpointNotFound`] when the service is absent or has no usable port.
pub fn service_endpoint(
    service: Option<&Service>,
    namespace: &str,
    service_name: &str,
    port_name: Option<&str>,
) -> Result<Endpoint, InfraError> {
    let not_found = |detail: &str| InfraError::EndpointNotFound {
        namespace: namespace.to_string(),
        service: service_name.to_string(),
        detail: detail.to_string(),
    };

    let service = service.ok_or_else(|| not_found("service does not exist yet"))?;
    let ports = service
        .spec
        .as_ref()
        .and_then(|spec| spec.ports.as_ref())
        .filter(|ports| !ports.is_empty())
        .ok_or_else(|| not_found("service exposes no ports"))?;

    let selected = port_name
        .and_then(|wanted| ports.iter().find(|p| p.name.as_deref() == Some(wanted)))
        .or_else(|| ports.first())
        .ok_or_else(|| not_found("service exposes no ports"))?;

    let port = match &selected.target_port {
        Some(IntOrString::Int(target)) if *target > 0 => *target,
        _ => selected.port,
    };
    if port <= 0 {
        return Err(not_found("service port has no usable number"));
    }

    Ok(Endpoint {
        host: service_host(service_name, namespace),
        port,
    })
}

/// Resolves adapters by declared `(apiVersion, kind)`
#[derive(Debug, Clone, Default)]
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn InfraAdapter>>,
}

impl AdapterRegistry {
    /// Empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in adapter at its default settings
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new()
            .register(InfinispanAdapter::default())
            .register(KafkaAdapter::default())
            .register(KeycloakAdapter::default())
            .register(MongoDbAdapter::default())
    }

    /// Add an adapter, replacing any adapter already serving the same kind
    #[must_use]
    pub fn register(mut self, adapter: impl InfraAdapter + 'static) -> Self {
        let resource = adapter.api_resource();
        self.adapters.retain(|existing| {
            let other = existing.api_resource();
            other.api_version != resource.api_version || other.kind != resource.kind
        });
        self.adapters.push(Arc::new(adapter));
        self
    }

    /// Adapter for a declared backing resource, if supported
    #[must_use]
    pub fn resolve(&self, api_version: &str, kind: &str) -> Option<Arc<dyn InfraAdapter>> {
        self.adapters
            .iter()
            .find(|adapter| {
                let resource = adapter.api_resource();
                resource.api_version == api_version && resource.kind == kind
            })
            .cloned()
    }

    /// Adapter for a declaration
    ///
    /// # Errors
    ///
    /// [`InfraError::UnsupportedKind`] when no adapter serves the declared kind.
    pub fn for_dependency(
        &self,
        dependency: &InfraDependency,
    ) -> Result<Arc<dyn InfraAdapter>, InfraError> {
        let spec = &dependency.spec;
        self.resolve(&spec.resource_api_version, &spec.resource_kind)
            .ok_or_else(|| InfraError::UnsupportedKind {
                api_version: spec.resource_api_version.clone(),
                kind: spec.resource_kind.clone(),
            })
    }

    /// `apiVersion/kind` of every supported backing resource
    #[must_use]
    pub fn supported(&self) -> Vec<String> {
        self.adapters
            .iter()
            .map(|adapter| {
                let resource = adapter.api_resource();
                format!("{}/{}", resource.api_version, resource.kind)
            })
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::service;
    use super::*;
    use crate::crd::InfraDependencySpec;

    fn declaration(api_version: &str, kind: &str) -> InfraDependency {
        let mut dep = InfraDependency::new(
            "dep",
            InfraDependencySpec {
                resource_api_version: api_version.to_string(),
                resource_kind: kind.to_string(),
                resource_name: None,
                resource_namespace: None,
                custom_credential_secret_name: None,
            },
        );
        dep.metadata.namespace = Some("apps".to_string());
        dep
    }

    #[test]
    fn test_registry_resolves_built_in_kinds() {
        let registry = AdapterRegistry::with_defaults();
        assert_eq!(
            registry.resolve("infinispan.org/v1", "Infinispan").map(|a| a.kind()),
            Some("Infinispan")
        );
        assert_eq!(
            registry.resolve("kafka.strimzi.io/v1beta2", "Kafka").map(|a| a.kind()),
            Some("Kafka")
        );
        assert_eq!(
            registry.resolve("k8s.keycloak.org/v2alpha1", "Keycloak").map(|a| a.kind()),
            Some("Keycloak")
        );
        assert_eq!(
            registry
                .resolve("mongodbcommunity.mongodb.com/v1", "MongoDBCommunity")
                .map(|a| a.kind()),
            Some("MongoDBCommunity")
        );
        assert_eq!(registry.supported().len(), 4);
    }

    #[test]
    fn test_registry_rejects_unknown_kind() {
        let registry = AdapterRegistry::with_defaults();
        let err = registry
            .for_dependency(&declaration("example.com/v1", "Widget"))
            .unwrap_err();
        assert!(matches!(err, InfraError::UnsupportedKind { ref kind, .. } if kind == "Widget"));
        assert!(!err.is_transient());

        // Wrong version of a known kind is not silently accepted
        assert!(registry.resolve("infinispan.org/v2", "Infinispan").is_none());
    }

    #[test]
    fn test_register_replaces_same_kind() {
        let registry = AdapterRegistry::with_defaults()
            .register(InfinispanAdapter::default().with_trust_key("ca.crt"));
        assert_eq!(registry.supported().len(), 4);
        let adapter = registry.resolve("infinispan.org/v1", "Infinispan").unwrap();
        assert_eq!(adapter.trust_key(), "ca.crt");
    }

    #[test]
    fn test_service_endpoint_prefers_named_port_and_target_port() {
        let svc = service(
            "cache",
            vec![
                (Some("admin"), 9990, None),
                (Some("infinispan"), 80, Some(IntOrString::Int(11222))),
            ],
        );
        let endpoint = service_endpoint(Some(&svc), "apps", "cache", Some("infinispan")).unwrap();
        assert_eq!(endpoint.host, "cache.apps.svc");
        assert_eq!(endpoint.port, 11222);
    }

    #[test]
    fn test_service_endpoint_falls_back_to_first_port() {
        let svc = service(
            "cache",
            vec![(None, 11222, Some(IntOrString::String("hotrod".to_string())))],
        );
        let endpoint = service_endpoint(Some(&svc), "apps", "cache", Some("missing")).unwrap();
        assert_eq!(endpoint.port, 11222);
    }

    #[test]
    fn test_service_endpoint_missing_service_or_ports() {
        let err = service_endpoint(None, "apps", "cache", None).unwrap_err();
        assert!(matches!(err, InfraError::EndpointNotFound { .. }));
        assert!(err.is_transient());

        let empty = service("cache", vec![]);
        assert!(matches!(
            service_endpoint(Some(&empty), "apps", "cache", None),
            Err(InfraError::EndpointNotFound { .. })
        ));
    }

    #[test]
    fn test_observed_skips_untyped_entries() {
        let raw = vec![
            RawCondition {
                condition_type: "Ready".to_string(),
                status: "True".to_string(),
                message: None,
            },
            RawCondition::default(),
        ];
        let conditions = observed(&raw);
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].status, ConditionStatus::True);
    }
}
