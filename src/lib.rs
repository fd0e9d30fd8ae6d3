//! # Infra Dependency Controller
//!
//! A Kubernetes controller that provisions infrastructure dependencies
//! through their operators and republishes what applications need to use
//! them.
//!
//! An `InfraDependency` declaration names a backing resource kind
//! (Infinispan, Kafka, Keycloak or MongoDB). For each declaration the
//! controller:
//!
//! 1. **Ensures the backing resource** - creates it with defaults when absent
//! 2. **Reads readiness** - interprets the operator's own status conditions
//! 3. **Discovers the endpoint** - resolves host and port from the service
//! 4. **Provisions secrets** - resolves credential and trust material secrets
//! 5. **Projects bindings** - publishes env vars and volumes in the status
//!
//! Unready dependencies are requeued on a fixed interval; failed passes back
//! off per declaration.

pub mod adapter;
pub mod client;
pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod error;
pub mod observability;
pub mod runtime;
