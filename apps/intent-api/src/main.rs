//! # Tally Intent API
//!
//! Binary entry point: configuration, store, HTTP server.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use tally_db::{DbConfig, MemoryStore, PgStore, Store, TimedStore};
use tally_intent_api::config::{BridgeConfig, StoreBackend};
use tally_intent_api::{http, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    info!("Starting Tally Intent API...");

    // Load configuration
    let config = BridgeConfig::load().context("Failed to load configuration")?;
    info!(
        port = config.http_port,
        store = ?config.store,
        sequence_strategy = ?config.sequence_strategy,
        timeout_ms = config.store_timeout_ms,
        "Configuration loaded"
    );

    // Connect the store
    let store: Arc<dyn Store> = match config.store {
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .clone()
                .context("TALLY_DATABASE_URL is required for the postgres store")?;
            let pg = PgStore::connect(DbConfig::new(url).max_connections(config.db_max_connections))
                .await
                .context("Failed to connect to PostgreSQL")?;
            info!("Connected to PostgreSQL");
            Arc::new(TimedStore::new(pg, config.store_timeout()))
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on shutdown");
            Arc::new(TimedStore::new(MemoryStore::new(), config.store_timeout()))
        }
    };

    if config.service_key_hash.is_none() {
        tracing::warn!("No service key configured; only end-user tokens will be accepted");
    }

    let state = Arc::new(AppState::new(store, &config));
    let app = http::router(state);

    let addr = config.listen_address();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    info!(%addr, "Intent API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
