// Dumps the archived broker messages, oldest first, one line per
// message. Set FLEET_TOPIC_CONTAINS to filter by topic fragment.

use anyhow::{Context, Result};
use fleet_query::{FleetClient, MessageFilter, MessageOrder, QueryConfig};
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

    let config = QueryConfig::from_env().context("Failed to load configuration")?;
    let client = FleetClient::new(config.endpoint.clone());

    let filter = config
        .topic_contains
        .clone()
        .map(MessageFilter::topic_contains);

    let batch = client
        .messages(filter, Some(MessageOrder::TimestampAsc), None)
        .await
        .context("Messages query failed")?;

    println!("Total messages found: {}", batch.total_count);
    for message in &batch.messages {
        println!(
            "{} | {} | {}",
            message.timestamp, message.topic, message.payload_as_string
        );
    }
    Ok(())
}
