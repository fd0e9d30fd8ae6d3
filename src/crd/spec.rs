//! # InfraDependency Spec
//!
//! The user-authored declaration of an infrastructure dependency.

use crate::crd::InfraDependencyStatus;
use kube::{CustomResource, ResourceExt};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// InfraDependency Custom Resource Definition
///
/// Declares that workloads in a namespace need a piece of infrastructure that is
/// provided by a resource owned by another operator. The controller makes sure the
/// backing resource exists, waits for it to become healthy and publishes the
/// connection details in the status.
///
/// # Example
///
/// ```yaml
/// apiVersion: infra.octopilot.io/v1beta1
/// kind: InfraDependency
/// metadata:
///   name: kogito-infinispan
///   namespace: apps
/// spec:
///   resourceAPIVersion: infinispan.org/v1
///   resourceKind: Infinispan
///   resourceName: kogito-infinispan
/// ```
#[derive(CustomResource, Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "InfraDependency",
    group = "infra.octopilot.io",
    version = "v1beta1",
    namespaced,
    shortname = "infradep",
    status = "InfraDependencyStatus",
    printcolumn = r#"{"name":"Kind", "type":"string", "jsonPath":".spec.resourceKind"}"#,
    printcolumn = r#"{"name":"Ready", "type":"boolean", "jsonPath":".status.ready"}"#,
    printcolumn = r#"{"name":"Reason", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].reason"}"#,
    printcolumn = r#"{"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct InfraDependencySpec {
    /// API version of the backing resource (e.g. "infinispan.org/v1")
    #[serde(rename = "resourceAPIVersion")]
    pub resource_api_version: String,
    /// Kind of the backing resource (e.g. "Infinispan", "Kafka")
    pub resource_kind: String,
    /// Name of the backing resource. Defaults to the name of this declaration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    /// Namespace of the backing resource. Defaults to the namespace of this declaration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_namespace: Option<String>,
    /// Name of a user-supplied credential secret.
    /// When unset, the operator convention `<resource-name>-credential` is used.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_credential_secret_name: Option<String>,
}

/// Fully resolved identity of the backing resource a declaration points at
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TargetRef {
    pub api_version: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl std::fmt::Display for TargetRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}

impl InfraDependency {
    /// Namespace of the declaration itself
    #[must_use]
    pub fn namespace_or_default(&self) -> String {
        self.namespace().unwrap_or_else(|| "default".to_string())
    }

    /// Resolve the backing resource reference, applying name and namespace defaults
    #[must_use]
    pub fn target(&self) -> TargetRef {
        let name = self
            .spec
            .resource_name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.name_any());
        let namespace = self
            .spec
            .resource_namespace
            .clone()
            .filter(|ns| !ns.is_empty())
            .unwrap_or_else(|| self.namespace_or_default());

        TargetRef {
            api_version: self.spec.resource_api_version.clone(),
            kind: self.spec.resource_kind.clone(),
            namespace,
            name,
        }
    }

    /// Custom credential secret name, ignoring empty strings
    #[must_use]
    pub fn custom_credential_secret(&self) -> Option<&str> {
        self.spec
            .custom_credential_secret_name
            .as_deref()
            .filter(|name| !name.is_empty())
    }
}
