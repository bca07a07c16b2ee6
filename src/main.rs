//! warden - connect to a network and moderate the configured channels.

use anyhow::Context;
use slirc_warden::config::{Config, LogFormat, validate};
use slirc_warden::db::Database;
use slirc_warden::network::Client;
use slirc_warden::session::Session;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "warden.toml".to_string());

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.general.log_format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .init(),
    }

    if let Err(errors) = validate(&config) {
        for e in &errors {
            error!(error = %e, "Invalid configuration");
        }
        return Err(anyhow::anyhow!(
            "{} configuration error(s) in {}",
            errors.len(),
            config_path
        ));
    }

    info!(
        nick = %config.nickname(),
        host = %config.network.host,
        port = config.network.port,
        channels = config.network.channels.len(),
        "Starting slirc-warden"
    );

    // Initialize database
    let db = Database::new(&config.database_path()).await?;

    let (directives, directive_rx) = mpsc::channel(config.general.outbound_queue);
    let session = Arc::new(Session::new(config, db, directives));
    let client = Client::new(session, directive_rx);

    tokio::select! {
        _ = client.run() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("failed to listen for shutdown signal")?;
            info!("Interrupted, shutting down");
        }
    }

    Ok(())
}
