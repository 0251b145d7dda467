//! Transcoder Daemon
//!
//! Serves the UDP control protocol until interrupted.
//!
//! Usage: `ambed [config.toml]`

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ambed::{
    config::AppConfig,
    stream::{UdpStreamFactory, VocoderPool},
    Controller,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = AppConfig::load_or_default(config_path.as_deref())
        .context("Failed to load configuration")?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.log.filter.clone()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting ambed");
    if let Some(path) = &config_path {
        tracing::info!("Configuration loaded from {}", path.display());
    }

    let pool = VocoderPool::new(config.vocoder.channels);
    tracing::info!("Vocoder pool ready with {} channels", pool.capacity());

    let factory = UdpStreamFactory::new(
        config.controller.bind_address,
        pool,
        config.vocoder.activity_timeout(),
    );

    let mut controller = Controller::start(&config.controller, factory)
        .context("Failed to start controller")?;

    tracing::info!("Ready - press Ctrl+C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    tracing::info!("Shutting down");
    let closed = tokio::task::spawn_blocking(move || controller.shutdown()).await?;
    tracing::info!("Stopped, {} streams closed at teardown", closed);

    Ok(())
}
