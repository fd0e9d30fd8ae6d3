//! # Kafka Adapter
//!
//! Kafka clusters managed by the Strimzi operator.
//!
//! Strimzi fronts the brokers with a `<name>-kafka-bootstrap` service whose
//! ports are named `tcp-<listener>`. TLS listeners are signed by the cluster
//! CA, published in `<name>-cluster-ca-cert`.

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
    blocking: &["NotReady"],
};

const CREDENTIAL_KEYS: &[CredentialKey] = &[
    CredentialKey {
        env_suffix: "PASSWORD",
        secret_key: "password",
    },
    CredentialKey {
        env_suffix: "SASL_JAAS_CONFIG",
        secret_key: "sasl.jaas.config",
    },
];

#[derive(Debug, Default, Deserialize)]
struct KafkaView {
    #[serde(default)]
    spec: KafkaSpec,
    #[serde(default)]
    status: KafkaStatus,
}

#[derive(Debug, Default, Deserialize)]
struct KafkaSpec {
    #[serde(default)]
    kafka: BrokerSpec,
}

#[derive(Debug, Default, Deserialize)]
struct BrokerSpec {
    #[serde(default)]
    listeners: Vec<Listener>,
}

#[derive(Debug, Default, Deserialize)]
struct Listener {
    #[serde(default)]
    name: String,
    #[serde(default)]
    tls: bool,
    #[serde(default)]
    authentication: Option<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct KafkaStatus {
    #[serde(default)]
    conditions: Vec<RawCondition>,
}

impl KafkaView {
    /// The listener clients should use: the first TLS listener if any, else the first one
    fn primary_listener(&self) -> Option<&Listener> {
        let listeners = &self.spec.kafka.listeners;
        listeners
            .iter()
            .find(|l| l.tls)
            .or_else(|| listeners.first())
    }
}

#[derive(Debug, Clone)]
pub struct KafkaAdapter {
    trust_key: String,
}

impl Default for KafkaAdapter {
    fn default() -> Self {
        Self {
            trust_key: "ca.crt".to_string(),
        }
    }
}

impl KafkaAdapter {
    /// Read the cluster CA from a different data key (e.g. `ca.p12`)
    #[must_use]
    pub fn with_trust_key(mut self, key: impl Into<String>) -> Self {
        self.trust_key = key.into();
        self
    }
}

impl InfraAdapter for KafkaAdapter {
    fn kind(&self) -> &'static str {
        "Kafka"
    }

    fn api_resource(&self) -> ApiResource {
        api_resource("kafka.strimzi.io", "v1beta2", "Kafka", "kafkas")
    }

    fn default_spec(&self, _target: &TargetRef, _dependency: &InfraDependency) -> serde_json::Value {
        serde_json::json!({
            "kafka": {
                "replicas": 1,
                "listeners": [
                    {"name": "plain", "port": 9092, "type": "internal", "tls": false},
                ],
                "config": {
                    "offsets.topic.replication.factor": 1,
                    "transaction.state.log.replication.factor": 1,
                    "transaction.state.log.min.isr": 1,
                },
                "storage": {"type": "ephemeral"},
            },
            "zookeeper": {
                "replicas": 1,
                "storage": {"type": "ephemeral"},
            },
            "entityOperator": {
                "topicOperator": {},
                "userOperator": {},
            },
        })
    }

    fn readiness(&self, backing: &BackingResource) -> Result<ReadinessVerdict, InfraError> {
        let view: KafkaView = backing.view()?;
        Ok(read_conditions(&observed(&view.status.conditions), &POLICY))
    }

    fn service_name(&self, backing: &BackingResource) -> String {
        format!("{}-kafka-bootstrap", backing.name())
    }

    fn endpoint(
        &self,
        backing: &BackingResource,
        service: Option<&Service>,
    ) -> Result<Endpoint, InfraError> {
        let view: KafkaView = backing.view()?;
        let port_name = view
            .primary_listener()
            .map(|listener| format!("tcp-{}", listener.name));
        service_endpoint(
            service,
            backing.namespace(),
            &self.service_name(backing),
            port_name.as_deref(),
        )
    }

    fn requires_credentials(&self, backing: &BackingResource) -> Result<bool, InfraError> {
        let view: KafkaView = backing.view()?;
        Ok(view
            .spec
            .kafka
            .listeners
            .iter()
            .any(|l| l.authentication.as_ref().is_some_and(|a| !a.is_null())))
    }

    fn credential_keys(&self) -> &'static [CredentialKey] {
        CREDENTIAL_KEYS
    }

    fn trust_ref(&self, backing: &BackingResource) -> Result<Option<SecretRef>, InfraError> {
        let view: KafkaView = backing.view()?;
        if view.spec.kafka.listeners.iter().any(|l| l.tls) {
            Ok(Some(SecretRef::new(
                backing.namespace(),
                format!("{}-cluster-ca-cert", backing.name()),
            )))
        } else {
            Ok(None)
        }
    }

    fn trust_key(&self) -> &str {
        &self.trust_key
    }
}
