//! SensorThings API server.
//!
//! Serves the OGC SensorThings API over HTTP.

use clap::Parser;
use sensorthings_rest::{ServerConfig, create_app_with_config, init_logging};
use tracing::info;

#[cfg(feature = "memory")]
use sensorthings_persistence::backends::memory::InMemoryBackend;

/// Starts the Axum HTTP server and runs until shutdown is requested.
async fn serve(app: axum::Router, config: &ServerConfig) -> anyhow::Result<()> {
    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "Server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "Failed to listen for Ctrl-C");
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
                tracing::warn!(error = %e, "Failed to listen for SIGTERM");
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

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();
    init_logging(&config.log_level);

    if let Err(errors) = config.validate() {
        for error in &errors {
            eprintln!("Configuration error: {}", error);
        }
        std::process::exit(1);
    }

    info!(
        port = config.port,
        host = %config.host,
        external_url = %config.external_url(),
        publisher = ?config.publisher,
        "Starting SensorThings server"
    );

    start_memory(config).await
}

/// Starts the server with the in-memory backend.
#[cfg(feature = "memory")]
async fn start_memory(config: ServerConfig) -> anyhow::Result<()> {
    info!("Initializing in-memory backend");
    let app = create_app_with_config(InMemoryBackend::new(), config.clone());
    serve(app, &config).await
}

#[cfg(not(feature = "memory"))]
async fn start_memory(_config: ServerConfig) -> anyhow::Result<()> {
    anyhow::bail!(
        "No storage backend enabled. \
         Build with: cargo build -p sensorthings-server --features memory"
    )
}
