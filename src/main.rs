//! Privacy Audit - page privacy scoring service
//!
//! Binary entry point: restores state from durable storage and serves the
//! HTTP API until SIGINT/SIGTERM.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use privacy_audit::api::create_router;
use privacy_audit::storage::{spawn_storage_writer, JsonFileStore, KvStore};
use privacy_audit::{spawn_cleanup_task, AppState, Config};

/// Time allowed for pending storage writes after the server stops.
const STORAGE_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open durable storage and start its writer task
/// 4. Restore caches, policy and benchmarks; load geolocation
/// 5. Start background expiry sweep
/// 6. Serve HTTP until a shutdown signal, then flush storage
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "privacy_audit=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Privacy Audit Service");

    let config = Config::from_env();
    info!(
        port = config.server_port,
        cleanup_interval = config.cleanup_interval,
        storage = %config.storage_path.display(),
        "Configuration loaded"
    );

    let store = JsonFileStore::open(&config.storage_path)
        .with_context(|| format!("opening storage at {}", config.storage_path.display()))?;
    let persisted = store.load_all().context("reading storage")?;
    info!(
        path = %store.path().display(),
        entries = persisted.len(),
        "Storage opened"
    );
    let (mirror, writer_handle) = spawn_storage_writer(store);

    let state = AppState::bootstrap(&config, &persisted, mirror)
        .await
        .context("restoring state")?;
    drop(persisted);

    let cleanup_handle = spawn_cleanup_task(state.trackers.clone(), config.cleanup_interval);
    info!("Background expiry sweep started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("serving HTTP")?;

    // Every mirror is gone once the router is dropped; the writer drains and exits.
    if tokio::time::timeout(STORAGE_FLUSH_TIMEOUT, writer_handle).await.is_err() {
        warn!("Storage writer did not finish in time, latest updates may be lost");
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM), then aborts the sweep task.
async fn shutdown_signal(cleanup_handle: JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
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

    cleanup_handle.abort();
    warn!("Expiry sweep task aborted");
}
