//! Music Shell player - main entry point
//!
//! Serves playlist playback and transport controls over HTTP.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use musicshell_player::api::{self, AppContext};
use musicshell_player::audio::CpalDeviceFactory;
use musicshell_player::config::{CliOverrides, Config};
use musicshell_player::playback::PlaybackController;
use musicshell_player::provider::{build_provider, ProviderKind};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for musicshell-player
#[derive(Parser, Debug)]
#[command(name = "musicshell-player")]
#[command(about = "Music playlist player with HTTP transport controls")]
#[command(version)]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "MUSICSHELL_PORT")]
    port: Option<u16>,

    /// Folder containing music files
    #[arg(short, long, env = "MUSICSHELL_MUSIC_FOLDER")]
    music_folder: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, env = "MUSICSHELL_CONFIG")]
    config: Option<PathBuf>,

    /// Playlist source: Local, Spotify or Pandora
    #[arg(long, env = "MUSICSHELL_PROVIDER")]
    provider: Option<ProviderKind>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load(CliOverrides {
        port: args.port,
        music_folder: args.music_folder,
        provider: args.provider,
        config_path: args.config,
    })
    .context("Failed to load configuration")?;

    // RUST_LOG wins over the configured level
    let level = &config.log_level;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "musicshell_player={level},musicshell_common={level},tower_http={level}"
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting Music Shell player v{} ({}) on port {}",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        config.port
    );
    info!("Playlist source: {}", config.provider);
    info!("Music folder: {}", config.music_folder.display());

    let provider = build_provider(&config);
    let device_factory = Arc::new(CpalDeviceFactory::new(config.device_name.clone()));
    let controller = Arc::new(PlaybackController::new(
        provider,
        device_factory,
        config.timings,
    ));
    controller.start();

    let ctx = AppContext {
        controller: Arc::clone(&controller),
    };
    let served = api::run(config.port, ctx, shutdown_signal()).await;

    controller.dispose().await;
    served.context("HTTP server failed")?;

    info!("Shutdown complete");
    Ok(())
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
                error!("Failed to install SIGTERM handler: {}", e);
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
