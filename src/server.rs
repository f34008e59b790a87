//! HTTP server initialization and runtime setup.
//!
//! Handles key material, the database connector, the visit worker and the
//! Axum server lifecycle.

use crate::application::services::{AuthService, LinkService, MasterCredentials};
use crate::config::Config;
use crate::domain::repositories::LinkRepository;
use crate::domain::visit_worker::run_visit_worker;
use crate::infrastructure::database::DatabaseConnector;
use crate::infrastructure::keys::{
    KeyPairStatus, RSA_KEY_BITS, ensure_key_pair, load_signing_keys,
};
use crate::infrastructure::persistence::SqlLinkRepository;
use crate::routes::app_router;
use crate::state::AppState;

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

const WORKER_DRAIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - RSA key pair (generated on first start)
/// - Database connector for the configured backend, running the create
///   script when enabled
/// - Background visit worker
/// - Axum HTTP server
///
/// On SIGINT/SIGTERM the server stops accepting connections, finishes open
/// requests, drains the visit queue and stops the connector.
///
/// # Errors
///
/// Returns an error if:
/// - Key material cannot be created or loaded
/// - The database connector cannot start
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    if config.show_config {
        config.print_summary();
    }

    let cert_path = config.cert_path.clone();
    let status = tokio::task::spawn_blocking(move || ensure_key_pair(&cert_path, RSA_KEY_BITS))
        .await
        .context("Key generation task failed")?
        .context("Failed to prepare RSA key pair")?;

    match status {
        KeyPairStatus::Existing => info!(dir = %config.cert_path.display(), "Using existing key pair"),
        KeyPairStatus::Generated => info!(dir = %config.cert_path.display(), "Generated new key pair"),
        KeyPairStatus::PublicKeyDerived => warn!(
            dir = %config.cert_path.display(),
            "Public key was missing and has been derived from the private key"
        ),
    }

    let keys = load_signing_keys(&config.cert_path).context("Failed to load RSA key pair")?;

    let connector = Arc::new(
        DatabaseConnector::from_settings(config.database.connector_options())
            .context("Invalid database settings")?,
    );
    connector
        .start()
        .await
        .with_context(|| format!("Failed to start {} connector", connector.dialect()))?;
    info!(backend = %connector.dialect(), table = connector.table(), "Connected to database");

    let repository: Arc<dyn LinkRepository> = Arc::new(SqlLinkRepository::new(connector.clone()));

    let (visit_tx, visit_rx) = mpsc::channel(config.visit_queue_capacity);
    let worker = tokio::spawn(run_visit_worker(visit_rx, repository.clone()));

    let link_service = Arc::new(LinkService::new(
        repository,
        config.code_length,
        config.domain.clone(),
    ));
    let auth_service = Arc::new(AuthService::new(
        MasterCredentials {
            user: config.master_user.clone(),
            password: config.master_password.clone(),
            salt: config.salt.clone(),
        },
        keys,
        config.token_expires_in,
    ));

    let state = AppState::new(link_service, auth_service, visit_tx);

    let app = app_router(state)?;

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid listen address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("HTTP server stopped, draining visit queue");

    // the router and every sender are gone, so the worker ends once the queue is empty
    match tokio::time::timeout(WORKER_DRAIN_TIMEOUT, worker).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => error!(error = %e, "Visit worker panicked"),
        Err(_) => warn!("Visit queue not drained in time, pending visits are lost"),
    }

    connector
        .stop(false)
        .await
        .context("Failed to stop database connector")?;
    info!("Shutdown complete");

    Ok(())
}

/// Completes on SIGINT (Ctrl+C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
