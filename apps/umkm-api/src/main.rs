//! # UMKM API
//!
//! Binary entry point: configuration, logging, the listener and graceful
//! shutdown.

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use umkm_api::{build_router, ApiConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,umkm_api=debug")),
        )
        .with_target(true)
        .init();

    info!("Starting UMKM API server...");

    // Load configuration
    let config = ApiConfig::load().context("Invalid configuration")?;
    let bind_addr = config.bind_address();
    info!(
        addr = %bind_addr,
        database = %config.database_url,
        data_dir = %config.data_dir.display(),
        enforce_permissions = config.enforce_permissions,
        "Configuration loaded"
    );

    let state = AppState::new(config).context("Failed to build application state")?;

    // Migrate and seed the default database up front so a bad URL fails fast
    state
        .databases
        .initialize(state.databases.default_url())
        .await
        .context("Failed to open the default database")?;

    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    info!(addr = %bind_addr, "Listening");

    axum::serve(listener, build_router(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    state.databases.close_all().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
