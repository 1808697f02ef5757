//! # Initialization
//!
//! Controller startup: rustls setup, tracing, metrics, server startup,
//! Kubernetes client and reconciler wiring.

use crate::config::{ControllerConfig, ServerConfig};
use crate::controller::kube_client::KubeClusterClient;
use crate::controller::reconciler::Reconciler;
use crate::controller::server::{start_server, ServerState};
use crate::crd::GsmSecret;
use crate::identity::GcpIdentityBroker;
use crate::observability;
use crate::provider::gcp::SecretManagerConnector;
use anyhow::{Context, Result};
use kube::api::{Api, ListParams};
use kube::Client;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Everything the watch loop needs
pub struct InitializationResult {
    /// Kubernetes client
    pub client: Client,
    /// Reconciler context
    pub reconciler: Arc<Reconciler>,
    /// Server state for health checks
    pub server_state: Arc<ServerState>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_listening", &self.server_state.listening())
            .field("config", &self.reconciler.config)
            .finish_non_exhaustive()
    }
}

/// Initialize the controller runtime
///
/// This function handles:
/// - Configuration from the environment (read once)
/// - Tracing subscriber setup
/// - rustls crypto provider setup
/// - Metrics registration
/// - HTTP server startup
/// - Kubernetes client creation and a CRD presence check
/// - Identity broker, Secret Manager connector and reconciler setup
pub async fn initialize() -> Result<InitializationResult> {
    let config = Arc::new(ControllerConfig::from_env());
    let server_config = ServerConfig::from_env();

    observability::logging::init_tracing(&config.log_format)?;

    // Required for rustls 0.23+ when no default provider is selected via features.
    // Another component may have installed one already; that one is kept.
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        warn!("rustls crypto provider already installed, keeping the existing one");
    }

    info!("Starting GSM Secret Controller");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );

    observability::metrics::register_metrics()?;

    let server_state = ServerState::new();
    let server_state_clone = server_state.clone();
    let server_port = server_config.metrics_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(server_port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });

    // Probes must answer before the first reconcile starts
    wait_for_server_ready(&server_state, &server_handle, &server_config).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    ensure_crd_installed(&client).await?;

    let cluster = Arc::new(KubeClusterClient::new(client.clone()));
    let http_client = reqwest::Client::builder()
        .connect_timeout(config.http_timeout)
        .build()
        .context("Failed to create HTTP client")?;

    let broker = Arc::new(GcpIdentityBroker::new(
        cluster.clone(),
        config.clone(),
        http_client.clone(),
    ));
    let connector = Arc::new(SecretManagerConnector::new(
        http_client,
        config.endpoints.secret_manager.clone(),
        config.http_timeout,
    ));
    let reconciler = Arc::new(Reconciler::new(cluster, broker, connector, config.clone()));

    info!(
        trusted_subsystem = config.trusted_subsystem,
        default_service_account = config.service_account.as_deref().unwrap_or("default"),
        resync_secs = config.resync_interval.as_secs(),
        "Controller initialized, starting watch loop..."
    );

    Ok(InitializationResult {
        client,
        reconciler,
        server_state,
    })
}

/// Wait for the HTTP server to bind
async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
    server_config: &ServerConfig,
) -> Result<()> {
    let startup_timeout = server_config.startup_timeout();
    let poll_interval = server_config.poll_interval();
    let start_time = std::time::Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if server_state.listening() {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }
}

/// Fail fast with a useful message when the GSMSecret CRD is missing.
async fn ensure_crd_installed(client: &Client) -> Result<()> {
    let api: Api<GsmSecret> = Api::all(client.clone());
    api.list(&ListParams::default().limit(1))
        .await
        .context("GSMSecret CRD is not queryable; install it with `crdgen | kubectl apply -f -`")?;
    info!("GSMSecret CRD is installed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_for_server_ready_returns_once_listening() {
        let state = ServerState::new();
        let flag = state.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(20)).await;
            flag.is_listening
                .store(true, std::sync::atomic::Ordering::Relaxed);
            std::future::pending::<()>().await;
        });

        let result = wait_for_server_ready(&state, &handle, &ServerConfig::default()).await;
        handle.abort();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_wait_for_server_ready_reports_crashed_server() {
        let state = ServerState::new();
        let handle = tokio::spawn(async {});
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let err = wait_for_server_ready(&state, &handle, &ServerConfig::default())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("failed to start"));
    }

    #[tokio::test]
    async fn test_wait_for_server_ready_times_out() {
        let state = ServerState::new();
        let handle = tokio::spawn(std::future::pending::<()>());
        let config = ServerConfig {
            startup_timeout_secs: 0,
            poll_interval_ms: 5,
            ..ServerConfig::default()
        };

        let err = wait_for_server_ready(&state, &handle, &config)
            .await
            .unwrap_err();
        handle.abort();
        assert!(err.to_string().contains("within 0 seconds"));
    }
}
