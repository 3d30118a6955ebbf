//! Canto Search Service binary
//!
//! Loads the configured corpora once at startup and serves
//! `POST /api/search` until shutdown.

use canto_common::{config::AppConfig, metrics, CorpusRegistry, VERSION};
use canto_search::{create_router, AppState};
use std::net::SocketAddr;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;

    // Initialize tracing
    let filter = EnvFilter::try_new(&config.observability.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    if config.observability.json_logging {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init();
    }

    info!(
        service = %config.observability.service_name,
        "Starting Canto Search Service v{}", VERSION
    );

    // Initialize metrics
    metrics::register_metrics();
    if config.observability.metrics_port != 0 {
        metrics::install_exporter(config.observability.metrics_port)?;
    }

    // Load corpora
    let corpora = CorpusRegistry::load(&config.corpora).map_err(|e| {
        tracing::error!(error = %e, "Failed to load corpora");
        e
    })?;
    info!(corpora = corpora.len(), "Corpora ready");

    let host: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::new(host, config.server.port);

    let app = create_router(AppState::new(config, corpora));

    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Search service shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
