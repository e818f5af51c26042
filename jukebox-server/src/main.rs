//! jukebox-server - Sound library host and token relay
//!
//! Serves the sound manifest and files, and relays tokens between every
//! client connected to the stream endpoint.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jukebox_server::config::{Args, ServerConfig};
use jukebox_server::library::load_library;
use jukebox_server::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = ServerConfig::load(&args).context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!(
                "{},tower_http=info",
                config.logging.default_directive("jukebox_server")
            )
            .into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting jukebox-server v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let library = load_library(&config.library_path).context("Failed to load sound library")?;
    let addr = config.socket_addr().context("Invalid configuration")?;

    if !config.sounds_dir.is_dir() {
        error!("Sounds directory {} does not exist", config.sounds_dir.display());
    }

    let state = AppState::new(library, config.broadcast_capacity);
    let app = build_router(state, &config.sounds_dir);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("jukebox-server listening on http://{}", addr);
    info!("Manifest: http://{}/play/", addr);

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
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
