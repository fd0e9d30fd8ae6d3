//! Shared fixtures for reconciliation tests
//!
//! Builds declarations, backing resources, services and secrets in the
//! `apps` namespace for an in-memory cluster.

#![allow(dead_code, reason = "each test binary uses a different subset of fixtures")]

use infra_dependency_controller::adapter::{InfinispanAdapter, InfraAdapter};
use infra_dependency_controller::client::FakeResourceClient;
use infra_dependency_controller::config::ControllerConfig;
use infra_dependency_controller::controller::reconciler::InfraReconciler;
use infra_dependency_controller::crd::{InfraDependency, InfraDependencySpec};
use k8s_openapi::api::core::v1::{Secret, Service, ServicePort, ServiceSpec};
use k8s_openapi::ByteString;
use kube::api::{ApiResource, DynamicObject, ObjectMeta};
use kube::Resource;
use std::collections::BTreeMap;
use std::sync::Arc;

pub const NAMESPACE: &str = "apps";

pub fn declaration(name: &str, api_version: &str, kind: &str) -> InfraDependency {
    let mut dep = InfraDependency::new(
        name,
        InfraDependencySpec {
            resource_api_version: api_version.to_string(),
            resource_kind: kind.to_string(),
            resource_name: None,
            resource_namespace: None,
            custom_credential_secret_name: None,
        },
    );
    dep.metadata.namespace = Some(NAMESPACE.to_string());
    dep
}

pub fn infinispan_declaration(name: &str) -> InfraDependency {
    declaration(name, "infinispan.org/v1", "Infinispan")
}

pub fn infinispan_resource() -> ApiResource {
    InfinispanAdapter::default().api_resource()
}

/// An Infinispan cluster as its operator reports it
///
/// `cert_secret` turns on endpoint encryption with that certificate secret.
pub fn infinispan(name: &str, well_formed: bool, cert_secret: Option<&str>) -> DynamicObject {
    let mut security = serde_json::json!({
        "endpointAuthentication": true,
        "endpointSecretName": format!("{name}-credential"),
    });
    if let Some(cert) = cert_secret {
        security["endpointEncryption"] = serde_json::json!({
            "type": "Secret",
            "certSecretName": cert,
        });
    }
    let status = if well_formed { "True" } else { "False" };

    DynamicObject::new(name, &infinispan_resource())
        .within(NAMESPACE)
        .data(serde_json::json!({
            "spec": { "replicas": 1, "security": security },
            "status": { "conditions": [
                { "type": "WellFormed", "status": status },
                { "type": "Stopping", "status": "False" },
                { "type": "GracefulShutdown", "status": "False" },
                { "type": "PrelimChecksPassed", "status": "True" },
                { "type": "Upgrade", "status": "False" },
            ]},
        }))
}

pub fn service(name: &str, port_name: &str, port: i32) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            ports: Some(vec![ServicePort {
                name: Some(port_name.to_string()),
                port,
                ..Default::default()
            }]),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn secret(name: &str, entries: &[(&str, &str)]) -> Secret {
    let data: BTreeMap<String, ByteString> = entries
        .iter()
        .map(|(k, v)| ((*k).to_string(), ByteString(v.as_bytes().to_vec())))
        .collect();
    Secret {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            ..Default::default()
        },
        data: Some(data),
        ..Default::default()
    }
}

pub fn credentials(name: &str) -> Secret {
    secret(name, &[("username", "developer"), ("password", "s3cr3t")])
}

/// Move a fixture into another namespace
pub fn within<K: Resource>(mut object: K, namespace: &str) -> K {
    object.meta_mut().namespace = Some(namespace.to_string());
    object
}

pub fn reconciler(client: &Arc<FakeResourceClient>) -> InfraReconciler {
    InfraReconciler::new(client.clone(), ControllerConfig::default())
}

/// Stored copy of a declaration, as the watch would deliver it
pub fn stored(client: &FakeResourceClient, name: &str) -> InfraDependency {
    client
        .dependency(NAMESPACE, name)
        .expect("declaration should be stored")
}
