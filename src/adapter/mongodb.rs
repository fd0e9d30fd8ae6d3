//! # MongoDB Adapter
//!
//! MongoDB Community replica sets managed by the MongoDB Community operator.
//!
//! The operator reports a single `status.phase` rather than conditions, so
//! the adapter synthesizes a condition set from it before evaluation.

use super::{
    api_resource, service_endpoint, BackingResource, CredentialKey, Endpoint, InfraAdapter,
    SecretRef,
};
use crate::constants::CREDENTIAL_SECRET_SUFFIX;
use crate::controller::readiness::{
    read_conditions, ConditionStatus, ObservedCondition, ReadinessPolicy, ReadinessVerdict,
};
use crate::crd::{InfraDependency, TargetRef};
use crate::error::InfraError;
use k8s_openapi::api::core::v1::Service;
use kube::api::ApiResource;
use serde::Deserialize;

const POLICY: ReadinessPolicy = ReadinessPolicy {
    primary: "Running",
    blocking: &["Failed"],
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

const DEFAULT_MONGODB_VERSION: &str = "6.0.5";

#[derive(Debug, Default, Deserialize)]
struct MongoView {
    #[serde(default)]
    spec: MongoSpec,
    #[serde(default)]
    status: MongoStatus,
}

#[derive(Debug, Default, Deserialize)]
struct MongoSpec {
    #[serde(default)]
    security: Security,
}

#[derive(Debug, Default, Deserialize)]
struct Security {
    #[serde(default)]
    tls: Tls,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Tls {
    #[serde(default)]
    enabled: bool,
    #[serde(default)]
    ca_certificate_secret_ref: Option<LocalRef>,
}

#[derive(Debug, Default, Deserialize)]
struct LocalRef {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct MongoStatus {
    #[serde(default)]
    phase: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl MongoStatus {
    fn conditions(&self) -> Vec<ObservedCondition> {
        let Some(phase) = self.phase.as_deref().filter(|p| !p.is_empty()) else {
            return Vec::new();
        };
        let detail = self
            .message
            .clone()
            .unwrap_or_else(|| format!("phase is {phase}"));
        match phase {
            "Running" => vec![ObservedCondition::new("Running", ConditionStatus::True)],
            "Failed" => vec![
                ObservedCondition::new("Running", ConditionStatus::False),
                ObservedCondition::new("Failed", ConditionStatus::True).with_message(detail),
            ],
            _ => vec![ObservedCondition::new("Running", ConditionStatus::False).with_message(detail)],
        }
    }
}

#[derive(Debug, Clone)]
pub struct MongoDbAdapter {
    trust_key: String,
}

impl Default for MongoDbAdapter {
    fn default() -> Self {
        Self {
            trust_key: "ca.crt".to_string(),
        }
    }
}

impl MongoDbAdapter {
    #[must_use]
    pub fn with_trust_key(mut self, key: impl Into<String>) -> Self {
        self.trust_key = key.into();
        self
    }
}

impl InfraAdapter for MongoDbAdapter {
    fn kind(&self) -> &'static str {
        "MongoDBCommunity"
    }

    fn api_resource(&self) -> ApiResource {
        api_resource(
            "mongodbcommunity.mongodb.com",
            "v1",
            "MongoDBCommunity",
            "mongodbcommunity",
        )
    }

    fn default_spec(&self, target: &TargetRef, dependency: &InfraDependency) -> serde_json::Value {
        let credential = dependency
            .custom_credential_secret()
            .map_or_else(
                || format!("{}{CREDENTIAL_SECRET_SUFFIX}", target.name),
                str::to_string,
            );
        serde_json::json!({
            "members": 1,
            "type": "ReplicaSet",
            "version": DEFAULT_MONGODB_VERSION,
            "security": {"authentication": {"modes": ["SCRAM"]}},
            "users": [{
                "name": "app",
                "db": "admin",
                "passwordSecretRef": {"name": credential},
                "roles": [{"name": "readWrite", "db": "app"}],
                "scramCredentialsSecretName": format!("{}-app", target.name),
            }],
        })
    }

    fn readiness(&self, backing: &BackingResource) -> Result<ReadinessVerdict, InfraError> {
        let view: MongoView = backing.view()?;
        Ok(read_conditions(&view.status.conditions(), &POLICY))
    }

    fn service_name(&self, backing: &BackingResource) -> String {
        format!("{}-svc", backing.name())
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
            Some("mongodb"),
        )
    }

    fn credential_keys(&self) -> &'static [CredentialKey] {
        CREDENTIAL_KEYS
    }

    fn trust_ref(&self, backing: &BackingResource) -> Result<Option<SecretRef>, InfraError> {
        let view: MongoView = backing.view()?;
        let tls = view.spec.security.tls;
        if !tls.enabled {
            return Ok(None);
        }
        Ok(tls
            .ca_certificate_secret_ref
            .filter(|r| !r.name.is_empty())
            .map(|r| SecretRef::new(backing.namespace(), r.name)))
    }

    fn trust_key(&self) -> &str {
        &self.trust_key
    }
}
