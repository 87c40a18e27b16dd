//! Reelstore - a byte-budgeted, namespaced in-memory document store
//!
//! Server binary: wires configuration, logging, the store, the capacity
//! monitor and the HTTP router.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use reelstore::api::create_router;
use reelstore::{spawn_capacity_monitor, AppState, Config};

/// Main entry point for the document store server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the byte store and the shared default namespace
/// 4. Start the background capacity monitor
/// 5. Create Axum router with all endpoints
/// 6. Start HTTP server on configured port
/// 7. Handle graceful shutdown on SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reelstore=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Reelstore");

    let config = Config::from_env();
    info!(
        "Configuration loaded: budget={} bytes, port={}, monitor_interval={}s, warn_at={}%",
        config.budget_bytes,
        config.server_port,
        config.monitor_interval,
        config.capacity_warn_percent
    );

    let state = AppState::from_config(&config).context("initializing document store")?;
    info!(
        identity = %state.documents.identity(),
        remaining_mib = state.store.remaining_mib(),
        "Document store initialized"
    );

    let monitor_handle = spawn_capacity_monitor(
        state.store.clone(),
        config.monitor_interval,
        config.capacity_warn_percent,
    );
    info!("Capacity monitor started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(monitor_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the monitor task and allows graceful shutdown.
async fn shutdown_signal(monitor_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    monitor_handle.abort();
    warn!("Capacity monitor aborted");
}
