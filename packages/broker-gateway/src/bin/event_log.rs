// Connects to the fleet broker and logs every inbound event until Ctrl-C.

use std::sync::Arc;

use anyhow::{Context, Result};
use broker_gateway::{BrokerSession, GatewayConfig, SessionState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = GatewayConfig::from_env().context("Failed to load configuration")?;
    let session = Arc::new(SessionState::new());

    let broker = BrokerSession::connect(config, session)
        .await
        .context("Could not connect to the broker")?;
    tracing::info!("Connected, logging event messages (Ctrl-C to stop)");

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;

    tracing::info!("Stopping...");
    broker.disconnect().await?;
    Ok(())
}
