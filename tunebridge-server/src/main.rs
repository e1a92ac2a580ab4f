//! tunebridge-server - Main entry point
//!
//! Session-authenticated proxy between a browser frontend and the
//! streaming provider's API, with the recommendation pipeline layered on
//! top.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tunebridge_server::{build_router, config, AppState};

/// Command-line arguments for tunebridge-server
#[derive(Parser, Debug)]
#[command(name = "tunebridge-server")]
#[command(about = "Session-authenticated music recommendation proxy")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides env and config file)
    #[arg(short, long)]
    port: Option<u16>,

    /// Path to a TOML config file
    #[arg(short, long, env = "TUNEBRIDGE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tunebridge_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    let config = config::resolve(args.port, args.config.as_ref())
        .context("Failed to resolve configuration")?;

    info!(
        "Starting tunebridge-server v{} on port {}",
        env!("CARGO_PKG_VERSION"),
        config.port
    );
    info!("Frontend origins: {}", config.frontend_origins.join(", "));
    info!("Catalog API: {}", config.catalog_base_url);

    let port = config.port;
    let state = AppState::new(config).context("Failed to initialize application state")?;
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
