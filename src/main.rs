//! # Infra Dependency Controller
//!
//! Binary entry point. See the library crate for an overview.

use anyhow::Result;
use infra_dependency_controller::runtime::{initialization::initialize, watch_loop::run_watch_loop};

#[tokio::main]
async fn main() -> Result<()> {
    let init = initialize().await?;

    run_watch_loop(
        init.dependencies,
        init.context,
        init.server_state,
        init.config.max_concurrent_reconciliations,
    )
    .await
}
