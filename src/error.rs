//! # Errors
//!
//! Error taxonomy of a reconciliation pass.
//!
//! Two classes matter to the reconciler:
//! - transient absence of dependent objects (endpoint, secrets, trust data)
//!   and secrets the consuming workloads cannot reach; these end the pass as
//!   NotReady with a requeue
//! - everything else, which aborts the pass and is handed to the scheduler's backoff

use crate::client::ClientError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InfraError {
    /// No adapter is registered for the declared backing resource
    #[error("unsupported backing resource {api_version}/{kind}")]
    UnsupportedKind { api_version: String, kind: String },

    /// The backing resource could not be created
    #[error("failed to create {target}: {source}")]
    ResourceCreation {
        target: String,
        #[source]
        source: ClientError,
    },

    /// The backing resource does not decode into the shape its adapter expects
    #[error("malformed {target}: {source}")]
    MalformedResource {
        target: String,
        #[source]
        source: serde_json::Error,
    },

    /// No service or no matching service port exists yet
    #[error("no endpoint for service {namespace}/{service}: {detail}")]
    EndpointNotFound {
        namespace: String,
        service: String,
        detail: String,
    },

    /// The credential secret has not been created yet
    #[error("credential secret {namespace}/{name} not found")]
    CredentialSecretNotFound { namespace: String, name: String },

    /// Encryption is enabled but the trust secret does not exist yet
    #[error("trust secret {namespace}/{name} not found")]
    TrustSecretNotFound { namespace: String, name: String },

    /// Encryption is enabled but the trust secret lacks the expected key
    #[error("trust secret {namespace}/{name} is missing key {key}")]
    TrustMaterialMissing {
        namespace: String,
        name: String,
        key: String,
    },

    /// A secret the workloads must mount lives outside the declaration's namespace
    #[error("secret {secret} is outside namespace {namespace}, where the consuming workloads run; copy it there or point the declaration at a backing resource in {namespace}")]
    SecretOutsideNamespace { secret: String, namespace: String },

    /// The status write lost an optimistic-concurrency race twice in one pass
    #[error("status update of {namespace}/{name} conflicted with a concurrent writer")]
    StatusWriteConflict { namespace: String, name: String },

    #[error(transparent)]
    Client(#[from] ClientError),
}

impl InfraError {
    /// Whether this error ends the pass as NotReady with a status write and a requeue
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            InfraError::EndpointNotFound { .. }
                | InfraError::CredentialSecretNotFound { .. }
                | InfraError::TrustSecretNotFound { .. }
                | InfraError::TrustMaterialMissing { .. }
                | InfraError::SecretOutsideNamespace { .. }
        )
    }

    /// Short machine-readable reason, used for conditions and metric labels
    #[must_use]
    pub fn reason(&self) -> &'static str {
        match self {
            InfraError::UnsupportedKind { .. } => "UnsupportedKind",
            InfraError::ResourceCreation { .. } => "ResourceCreationFailed",
            InfraError::MalformedResource { .. } => "MalformedResource",
            InfraError::EndpointNotFound { .. } => "EndpointNotFound",
            InfraError::CredentialSecretNotFound { .. } => "CredentialSecretMissing",
            InfraError::TrustSecretNotFound { .. } => "TrustSecretMissing",
            InfraError::TrustMaterialMissing { .. } => "TrustMaterialMissing",
            InfraError::SecretOutsideNamespace { .. } => "SecretNamespaceMismatch",
            InfraError::StatusWriteConflict { .. } => "StatusWriteConflict",
            InfraError::Client(_) => "ApiError",
        }
    }
}
