//! # Keycloak Adapter
//!
//! Keycloak instances managed by the Keycloak operator (`k8s.keycloak.org`).

use super::{
    api_resource, observed, service_endpoint, BackingResource, CredentialKey, Endpoint,
    InfraAdapter, RawCondition, SecretRef,
};
use crate::controller::readiness::{read_conditions, ReadinessPolicy, ReadinessVerdict};
use crate::crd::{InfraDependency, TargetRef};
use crate::error::InfraError;
use k8s_openapi::api::core::v1::Service;
use kube::api::ApiResource;
use serde::Deserialize;

const POLICY: ReadinessPolicy = ReadinessPolicy {
    primary: "Ready",
    blocking: &["HasErrors", "RollingUpdate"],
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

#[derive(Debug, Default, Deserialize)]
struct KeycloakView {
    #[serde(default)]
    spec: KeycloakSpec,
    #[serde(default)]
    status: KeycloakStatus,
}

#[derive(Debug, Default, Deserialize)]
struct KeycloakSpec {
    #[serde(default)]
    http: Http,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Http {
    #[serde(default)]
    tls_secret: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct KeycloakStatus {
    #[serde(default)]
    conditions: Vec<RawCondition>,
}

impl KeycloakView {
    fn tls_secret(&self) -> Option<&str> {
        self.spec.http.tls_secret.as_deref().filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct KeycloakAdapter {
    trust_key: String,
}

impl Default for KeycloakAdapter {
    fn default() -> Self {
        Self {
            trust_key: "tls.crt".to_string(),
        }
    }
}

impl KeycloakAdapter {
    #[must_use]
    pub fn with_trust_key(mut self, key: impl Into<String>) -> Self {
        self.trust_key = key.into();
        self
    }
}

impl InfraAdapter for KeycloakAdapter {
    fn kind(&self) -> &'static str {
        "Keycloak"
    }

    fn api_resource(&self) -> ApiResource {
        api_resource("k8s.keycloak.org", "v2alpha1", "Keycloak", "keycloaks")
    }

    fn default_spec(&self, _target: &TargetRef, _dependency: &InfraDependency) -> serde_json::Value {
        serde_json::json!({
            "instances": 1,
            "http": {"httpEnabled": true},
            "hostname": {"strict": false},
        })
    }

    fn readiness(&self, backing: &BackingResource) -> Result<ReadinessVerdict, InfraError> {
        let view: KeycloakView = backing.view()?;
        Ok(read_conditions(&observed(&view.status.conditions), &POLICY))
    }

    fn service_name(&self, backing: &BackingResource) -> String {
        format!("{}-service", backing.name())
    }

    fn endpoint(
        &self,
        backing: &BackingResource,
        service: Option<&Service>,
    ) -> Result<Endpoint, InfraError> {
        let view: KeycloakView = backing.view()?;
        let port_name = if view.tls_secret().is_some() {
            "https"
        } else {
            "http"
        };
        service_endpoint(
            service,
            backing.namespace(),
            &self.service_name(backing),
            Some(port_name),
        )
    }

    fn credential_keys(&self) -> &'static [CredentialKey] {
        CREDENTIAL_KEYS
    }

    fn trust_ref(&self, backing: &BackingResource) -> Result<Option<SecretRef>, InfraError> {
        let view: KeycloakView = backing.view()?;
        Ok(view
            .tls_secret()
            .map(|name| SecretRef::new(backing.namespace(), name)))
    }

    fn trust_key(&self) -> &str {
        &self.trust_key
    }
}
