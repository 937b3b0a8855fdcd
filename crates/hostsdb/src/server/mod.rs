//! Server module for the hostsdb HTTP service
//!
//! This module wires configuration, logging, the host store and the axum
//! router together and owns the process lifecycle.

pub mod config;
pub mod service;
pub mod tracing_setup;

use std::net::SocketAddr;
use std::path::Path;

use anyhow::Result;
use clap::Parser;
use hostsdb_storage::{create_store, StorageError};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

use crate::server::config::Config;
use crate::server::service::{router, AppState};

/// Config file read when `--config` is not given
pub const DEFAULT_CONFIG_PATH: &str = "/etc/hostsdb/server.toml";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage initialization failed: {0}")]
    Storage(#[from] StorageError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser)]
#[command(name = "hostsdb")]
#[command(about = "HTTP CRUD service for the hosts inventory", long_about = None)]
struct ServerCli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<String>,
}

pub async fn run() -> Result<()> {
    let cli = ServerCli::parse();

    // An explicit path must exist; the default one may be absent.
    let (config, fell_back) = match cli.config.as_deref() {
        Some(path) => (
            Config::from_file(path)
                .map_err(|e| anyhow::anyhow!("Failed to load config {}: {}", path, e))?,
            false,
        ),
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => (
            Config::from_file(DEFAULT_CONFIG_PATH).map_err(|e| {
                anyhow::anyhow!("Failed to load config {}: {}", DEFAULT_CONFIG_PATH, e)
            })?,
            false,
        ),
        None => (Config::default(), true),
    };

    tracing_setup::init(config.logging.format);
    info!("hostsdb server starting");
    if fell_back {
        warn!(
            path = DEFAULT_CONFIG_PATH,
            "Config file not found, using built-in defaults"
        );
    } else {
        info!(
            "Loaded configuration from: {}",
            cli.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH)
        );
    }

    run_server(config)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}

/// Run the HTTP server with the given configuration until a shutdown signal
pub async fn run_server(config: Config) -> Result<(), ServerError> {
    let addr: SocketAddr = config
        .server
        .bind_address
        .parse()
        .map_err(|e| ServerError::Config(format!("Invalid bind address: {}", e)))?;

    let storage_config = config
        .database
        .storage_config()
        .map_err(|e| ServerError::Config(format!("Invalid database config: {}", e)))?;
    let settings = config.database.pool_settings();

    info!(
        backend = ?storage_config.backend,
        max_open = settings.max_open,
        acquire_timeout = ?settings.acquire_timeout,
        "Initializing host store"
    );

    let store = create_store(&storage_config, &settings).await?;
    let stats = store.pool_stats();
    info!(
        open = stats.open_connections,
        idle = stats.idle,
        max_open = stats.max_open_connections,
        "Datastore reachable"
    );

    let state = AppState::new(store.clone(), config.server.error_status);
    let app = router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(
        error_status = ?config.server.error_status,
        "Starting HTTP server on {}",
        listener.local_addr()?
    );

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    store.close().await;
    served?;

    info!("Server shutdown complete");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
///
/// A handler that cannot be installed is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = sigterm => info!("Received SIGTERM, initiating graceful shutdown"),
    }
}
