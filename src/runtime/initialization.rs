//! # Initialization
//!
//! Controller initialization: rustls setup, tracing, metrics, probe server
//! startup and Kubernetes client setup.

use crate::client::KubeResourceClient;
use crate::config::ControllerConfig;
use crate::controller::reconciler::InfraReconciler;
use crate::controller::server::{start_server, ServerState};
use crate::crd::InfraDependency;
use crate::observability;
use crate::runtime::Context;
use anyhow::{Context as _, Result};
use kube::{api::Api, Client};
use std::sync::Arc;
use tracing::{error, info};

/// Everything the watch loop needs
pub struct InitializationResult {
    /// API for `InfraDependency` across all namespaces
    pub dependencies: Api<InfraDependency>,
    /// Reconciler context
    pub context: Arc<Context>,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
    pub config: ControllerConfig,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.ready())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Install the global tracing subscriber
///
/// `RUST_LOG` takes precedence; otherwise `LOG_LEVEL` sets the crate's level.
/// `LOG_FORMAT=json` selects structured output.
pub fn init_tracing(config: &ControllerConfig) {
    let default_directive = format!(
        "infra_dependency_controller={}",
        config.log_level.to_lowercase()
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));

    let result = if config.log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).try_init()
    };
    if let Err(e) = result {
        eprintln!("Tracing subscriber already initialized: {e}");
    }
}

/// Initialize the controller runtime
///
/// # Errors
///
/// Fails when metrics cannot be registered, the probe server cannot start or
/// no Kubernetes client can be built.
pub async fn initialize() -> Result<InitializationResult> {
    // Required for rustls 0.23+ when no default provider is set via features
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        anyhow::bail!("Failed to install rustls crypto provider");
    }

    let config = ControllerConfig::from_env();
    init_tracing(&config);

    info!("Starting Infra Dependency Controller");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );
    info!("Configuration: {:?}", config);

    observability::metrics::register_metrics().context("Failed to register metrics")?;

    let server_state = Arc::new(ServerState::default());
    let server_port = config.metrics_port;
    let server_state_clone = server_state.clone();
    tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;
    let dependencies: Api<InfraDependency> = Api::all(client.clone());

    let reconciler = InfraReconciler::new(
        Arc::new(KubeResourceClient::new(client)),
        config.clone(),
    );
    info!(
        "Supported backing resources: {}",
        reconciler.registry().supported().join(", ")
    );
    let context = Arc::new(Context::new(reconciler));

    info!("Controller initialized, starting watch loop...");

    Ok(InitializationResult {
        dependencies,
        context,
        server_state,
        config,
    })
}
