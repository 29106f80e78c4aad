//! services/client/src/bin/newscheck.rs

use clap::Parser;
use client_lib::{cli::Cli, config::Config, error::ClientError, state::AppState};
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ClientError> {
    let cli = Cli::parse();

    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    debug!("Configuration loaded: {}", config.api_base_url);

    // --- 2. Wire the Adapters and Run the Command ---
    let state = AppState::new(config)?;
    client_lib::cli::run(cli, &state).await
}
