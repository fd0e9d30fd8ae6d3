//! # Custom Resource Definitions
//!
//! CRD types for the Infra Dependency Controller.
//!
//! ## Module Structure
//!
//! - `spec.rs` - The `InfraDependency` resource and backing-resource resolution
//! - `status.rs` - Status types published by the reconciler

mod spec;
mod status;

pub use spec::{InfraDependency, InfraDependencySpec, TargetRef};
pub use status::{
    BackingResourceStatus, Condition, EndpointStatus, EnvVarBinding, InfraDependencyStatus,
    SecretKeyRef, VolumeBinding,
};
