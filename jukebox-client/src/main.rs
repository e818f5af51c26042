//! Jukebox client - main entry point
//!
//! Fetches the sound manifest, joins the token stream and plays every
//! token it hears, one at a time. Lines typed on stdin activate tokens
//! locally and are shared with everyone else on the stream.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jukebox_client::audio::{AudioOutput, AudioPlayer};
use jukebox_client::config::{Args, ClientConfig, StreamTarget};
use jukebox_client::events::{self, CloseReason, SessionEvent};
use jukebox_client::transcript::Transcript;
use jukebox_client::{input, net, Session};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is needed before tracing to pick the log level
    let config = ClientConfig::load(&args).context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.default_directive("jukebox_client").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "Starting jukebox v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    if args.list_devices {
        for name in AudioOutput::list_devices().context("Failed to list audio devices")? {
            println!("{}", name);
        }
        return Ok(());
    }

    let settings = config.into_settings().context("Invalid configuration")?;
    info!("Server: {}", settings.server_url);

    let (events_tx, events_rx) = events::channel();
    let http = reqwest::Client::new();

    let player = AudioPlayer::open(&settings.audio, http.clone(), events_tx.clone())
        .context("Failed to open audio output")?;

    tokio::spawn(net::load_manifest(
        http,
        settings.server_url.clone(),
        events_tx.clone(),
    ));

    let outbound = match &settings.stream {
        StreamTarget::Connect(url) => {
            let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
            tokio::spawn(net::run_connection(url.clone(), events_tx.clone(), outbound_rx));
            Some(outbound_tx)
        }
        StreamTarget::Unsupported(reason) => {
            // Logged by the dispatcher when the close is handled
            let _ = events_tx.send(SessionEvent::ConnectionClosed(CloseReason::Unsupported(
                reason.clone(),
            )));
            None
        }
    };

    tokio::spawn(input::read_stdin(events_tx));

    let session = Session::new(
        settings.session_config(),
        player,
        outbound,
        Transcript::echoing(),
    );

    tokio::select! {
        summary = session.run(events_rx) => {
            info!(
                "Played {} sound(s); {} unknown, {} failed, {} left unplayed",
                summary.played, summary.dropped, summary.failed, summary.discarded
            );
        }
        _ = shutdown_signal() => {}
    }

    info!("Jukebox stopped");

    // A blocking stdin read cannot be cancelled and would hold up runtime shutdown
    std::process::exit(0)
}

/// Resolves on Ctrl+C or SIGTERM
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
