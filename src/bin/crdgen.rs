//! # CRD Generator
//!
//! Prints the `InfraDependency` CustomResourceDefinition as YAML.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --bin crdgen > config/crd/infradependency.yaml
//!
//! cargo run --bin crdgen | kubectl apply -f -
//! ```

use infra_dependency_controller::crd::InfraDependency;
use kube::core::CustomResourceExt;

fn main() -> anyhow::Result<()> {
    let crd = InfraDependency::crd();
    print!("{}", serde_yaml::to_string(&crd)?);
    Ok(())
}
