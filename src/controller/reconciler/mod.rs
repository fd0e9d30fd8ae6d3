//! # Reconciler
//!
//! Core reconciliation logic for `InfraDependency` resources.
//!
//! The reconciler:
//! - Resolves the type adapter for the declared backing resource kind
//! - Creates the backing resource with a default spec when it does not exist
//! - Interprets the backing resource's conditions into a readiness verdict
//! - Confirms credential and trust secrets and projects connection bindings
//! - Writes the normalized status back, at most once per pass
//!
//! ## Reconciliation Flow
//!
//! 1. Ensure the backing resource
//! 2. Read readiness; stop with a requeue when not ready
//! 3. Resolve the service endpoint
//! 4. Provision credentials and trust material
//! 5. Project environment variables and volumes
//! 6. Update status

pub mod reconcile;
pub mod status;
pub mod types;

pub use types::{InfraReconciler, ReconcileOutcome};
