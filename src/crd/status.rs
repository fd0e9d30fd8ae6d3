//! # InfraDependency Status
//!
//! Status types published by the controller. The whole status is recomputed
//! on every pass.

use serde::{Deserialize, Serialize};

/// Status of the InfraDependency resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct InfraDependencyStatus {
    /// Whether the dependency can be consumed
    #[serde(default)]
    pub ready: bool,
    /// Conditions represent the latest available observations
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Secret volumes a consuming workload should mount (trust material)
    #[serde(default)]
    pub volumes: Vec<VolumeBinding>,
    /// Environment variables a consuming workload should set
    #[serde(default)]
    pub env_vars: Vec<EnvVarBinding>,
    /// Backing resource the declaration resolved to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backing_resource: Option<BackingResourceStatus>,
    /// Service endpoint of the backing resource, once known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<EndpointStatus>,
    /// Observed generation
    #[serde(default)]
    pub observed_generation: Option<i64>,
}

impl InfraDependencyStatus {
    /// Look up a condition by type
    #[must_use]
    pub fn condition(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.r#type == condition_type)
    }
}

/// Condition represents a status condition for the resource
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: String,
    /// Status of condition (True, False, Unknown)
    pub status: String,
    /// Last transition time
    #[serde(default)]
    pub last_transition_time: Option<String>,
    /// Reason for condition
    #[serde(default)]
    pub reason: Option<String>,
    /// Message describing condition
    #[serde(default)]
    pub message: Option<String>,
}

/// A secret to be mounted into consuming workloads
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VolumeBinding {
    /// Volume name, unique per backing kind
    pub name: String,
    /// Secret to mount
    pub secret_name: String,
    /// Where the secret is mounted
    pub mount_path: String,
}

/// An environment variable for consuming workloads
///
/// Exactly one of `value` and `secretKeyRef` is set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EnvVarBinding {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key_ref: Option<SecretKeyRef>,
}

impl EnvVarBinding {
    #[must_use]
    pub fn literal(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            secret_key_ref: None,
        }
    }

    #[must_use]
    pub fn from_secret(name: impl Into<String>, secret: &str, key: &str) -> Self {
        Self {
            name: name.into(),
            value: None,
            secret_key_ref: Some(SecretKeyRef {
                name: secret.to_string(),
                key: key.to_string(),
            }),
        }
    }
}

/// Reference to a key inside a secret
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeyRef {
    pub name: String,
    pub key: String,
}

/// Identity of the backing resource
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct BackingResourceStatus {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

/// Network endpoint of the backing resource
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndpointStatus {
    pub host: String,
    pub port: i32,
}
