//! # Infinispan Adapter
//!
//! Infinispan cache clusters managed by the Infinispan operator.
//!
//! The operator reports `WellFormed` once every pod has joined the cluster.
//! Encryption is configured through `spec.security.endpointEncryption`; the
//! certificate secret it names doubles as trust material for clients.

use super::{
    api_resource, observed, service_endpoint, BackingResource, CredentialKey, Endpoint,
    InfraAdapter, RawCondition, SecretRef,
};
use crate::constants::CREDENTIAL_SECRET_SUFFIX;
use crate::controller::readiness::{read_conditions, ReadinessPolicy, ReadinessVerdict};
use crate::crd::{InfraDependency, TargetRef};
use crate::error::InfraError;
use k8s_openapi::api::core::v1::Service;
use kube::api::ApiResource;
use serde::Deserialize;

const POLICY: ReadinessPolicy = ReadinessPolicy {
    primary: "WellFormed",
    blocking: &["Stopping", "GracefulShutdown", "Upgrade"],
};

const CREDENTIAL_KEYS: &[CredentialKey] = &[
    CredentialKey {
        env_suffix: "USERNAME",
        secret_key: "username",
    },
    CredentialKey {
        env_suffix: "PASSWORD",
        secret_key: "password",
    },
];

/// Name of the service port serving Hot Rod and REST clients
const SERVICE_PORT_NAME: &str = "infinispan";

#[derive(Debug, Default, Deserialize)]
struct InfinispanView {
    #[serde(default)]
    spec: InfinispanSpec,
    #[serde(default)]
    status: InfinispanStatus,
}

#[derive(Debug, Default, Deserialize)]
struct InfinispanSpec {
    #[serde(default)]
    security: Security,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Security {
    #[serde(default)]
    endpoint_authentication: Option<bool>,
    #[serde(default)]
    endpoint_encryption: Option<EndpointEncryption>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EndpointEncryption {
    #[serde(default, rename = "type")]
    encryption_type: Option<String>,
    #[serde(default)]
    cert_secret_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct InfinispanStatus {
    #[serde(default)]
    conditions: Vec<RawCondition>,
}

#[derive(Debug, Clone)]
pub struct InfinispanAdapter {
    trust_key: String,
}

impl Default for InfinispanAdapter {
    fn default() -> Self {
        Self {
            trust_key: "tls.crt".to_string(),
        }
    }
}

impl InfinispanAdapter {
    /// Read trust material from a different data key of the certificate secret
    #[must_use]
    pub fn with_trust_key(mut self, key: impl Into<String>) -> Self {
        self.trust_key = key.into();
        self
    }
}

impl InfraAdapter for InfinispanAdapter {
    fn kind(&self) -> &'static str {
        "Infinispan"
    }

    fn api_resource(&self) -> ApiResource {
        api_resource("infinispan.org", "v1", "Infinispan", "infinispans")
    }

    fn default_spec(&self, target: &TargetRef, dependency: &InfraDependency) -> serde_json::Value {
        let credential = dependency
            .custom_credential_secret()
            .map_or_else(
                || format!("{}{CREDENTIAL_SECRET_SUFFIX}", target.name),
                str::to_string,
            );
        serde_json::json!({
            "replicas": 1,
            "service": { "type": "DataGrid" },
            "security": {
                "endpointAuthentication": true,
                "endpointSecretName": credential,
            },
        })
    }

    fn readiness(&self, backing: &BackingResource) -> Result<ReadinessVerdict, InfraError> {
        let view: InfinispanView = backing.view()?;
        Ok(read_conditions(&observed(&view.status.conditions), &POLICY))
    }

    fn service_name(&self, backing: &BackingResource) -> String {
        backing.name().to_string()
    }

    fn endpoint(
        &self,
        backing: &BackingResource,
        service: Option<&Service>,
    ) -> Result<Endpoint, InfraError> {
        service_endpoint(
            service,
            backing.namespace(),
            &self.service_name(backing),
            Some(SERVICE_PORT_NAME),
        )
    }

    fn requires_credentials(&self, backing: &BackingResource) -> Result<bool, InfraError> {
        let view: InfinispanView = backing.view()?;
        Ok(view.spec.security.endpoint_authentication.unwrap_or(true))
    }

    fn credential_keys(&self) -> &'static [CredentialKey] {
        CREDENTIAL_KEYS
    }

    fn trust_ref(&self, backing: &BackingResource) -> Result<Option<SecretRef>, InfraError> {
        let view: InfinispanView = backing.view()?;
        let Some(encryption) = view.spec.security.endpoint_encryption else {
            return Ok(None);
        };
        if encryption
            .encryption_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case("none"))
        {
            return Ok(None);
        }
        Ok(encryption
            .cert_secret_name
            .filter(|name| !name.is_empty())
            .map(|name| SecretRef::new(backing.namespace(), name)))
    }

    fn trust_key(&self) -> &str {
        &self.trust_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::test_support::{backing, service};
    use crate::controller::readiness::ReadyState;
    use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;

    fn cache(data: serde_json::Value) -> BackingResource {
        backing(&InfinispanAdapter::default().api_resource(), "kogito-infinispan", data)
    }

    #[test]
    fn test_healthy_cluster_is_ready() {
        let backing = cache(serde_json::json!({
            "spec": {"replicas": 1},
            "status": {"conditions": [
                {"type": "WellFormed", "status": "True"},
                {"type": "Stopping", "status": "False"},
                {"type": "GracefulShutdown", "status": "False"},
                {"type": "PrelimChecksPassed", "status": "True"},
                {"type": "Upgrade", "status": "False"},
            ]}
        }));
        let verdict = InfinispanAdapter::default().readiness(&backing).unwrap();
        assert_eq!(verdict.state, ReadyState::Ready);
    }

    #[test]
    fn test_upgrade_blocks_readiness() {
        let backing = cache(serde_json::json!({
            "status": {"conditions": [
                {"type": "WellFormed", "status": "True"},
                {"type": "Upgrade", "status": "True", "message": "rolling to 14.0"},
            ]}
        }));
        let verdict = InfinispanAdapter::default().readiness(&backing).unwrap();
        assert_eq!(verdict.state, ReadyState::NotReady);
        assert!(verdict.reason.contains("rolling to 14.0"));
    }

    #[test]
    fn test_fresh_resource_is_unknown() {
        let verdict = InfinispanAdapter::default()
            .readiness(&cache(serde_json::json!({"spec": {}})))
            .unwrap();
        assert_eq!(verdict.state, ReadyState::Unknown);
    }

    #[test]
    fn test_malformed_status() {
        let err = InfinispanAdapter::default()
            .readiness(&cache(serde_json::json!({"status": {"conditions": "broken"}})))
            .unwrap_err();
        assert!(matches!(err, InfraError::MalformedResource { .. }));
    }

    #[test]
    fn test_trust_ref_follows_encryption() {
        let adapter = InfinispanAdapter::default();
        let encrypted = cache(serde_json::json!({"spec": {"security": {
            "endpointEncryption": {"type": "Secret", "certSecretName": "cache-tls"}
        }}}));
        assert_eq!(
            adapter.trust_ref(&encrypted).unwrap(),
            Some(SecretRef::new("apps", "cache-tls"))
        );

        let disabled = cache(serde_json::json!({"spec": {"security": {
            "endpointEncryption": {"type": "None", "certSecretName": "cache-tls"}
        }}}));
        assert_eq!(adapter.trust_ref(&disabled).unwrap(), None);

        let plain = cache(serde_json::json!({"spec": {}}));
        assert_eq!(adapter.trust_ref(&plain).unwrap(), None);
    }

    #[test]
    fn test_authentication_defaults_to_required() {
        let adapter = InfinispanAdapter::default();
        assert!(adapter
            .requires_credentials(&cache(serde_json::json!({"spec": {}})))
            .unwrap());
        assert!(!adapter
            .requires_credentials(&cache(serde_json::json!({"spec": {"security": {
                "endpointAuthentication": false
            }}})))
            .unwrap());
    }

    #[test]
    fn test_endpoint_uses_target_port() {
        let backing = cache(serde_json::json!({}));
        let svc = service(
            "kogito-infinispan",
            vec![(None, 80, Some(IntOrString::Int(11222)))],
        );
        let endpoint = InfinispanAdapter::default()
            .endpoint(&backing, Some(&svc))
            .unwrap();
        assert_eq!(endpoint.host, "kogito-infinispan.apps.svc");
        assert_eq!(endpoint.port, 11222);
    }

    #[test]
    fn test_default_spec_names_credential_secret() {
        let adapter = InfinispanAdapter::default();
        let backing = cache(serde_json::json!({}));
        let mut dependency = InfraDependency::new(
            "kogito-infinispan",
            crate::crd::InfraDependencySpec {
                resource_api_version: "infinispan.org/v1".to_string(),
                resource_kind: "Infinispan".to_string(),
                resource_name: None,
                resource_namespace: None,
                custom_credential_secret_name: None,
            },
        );
        let spec = adapter.default_spec(&backing.target, &dependency);
        assert_eq!(
            spec["security"]["endpointSecretName"],
            "kogito-infinispan-credential"
        );

        dependency.spec.custom_credential_secret_name = Some("my-creds".to_string());
        let spec = adapter.default_spec(&backing.target, &dependency);
        assert_eq!(spec["security"]["endpointSecretName"], "my-creds");
        assert_eq!(
            adapter.credential_ref(&backing, &dependency),
            SecretRef::new("apps", "my-creds")
        );
    }
}
