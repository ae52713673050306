//! Gateway configuration.

use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use dotenvy::dotenv;

use crate::events::SessionPattern;

/// Configuration for the broker gateway.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Broker IP address or host name.
    pub host: String,
    /// Broker port.
    pub port: u16,
    /// How long `connect` waits for the broker acknowledgment.
    pub connect_timeout: Duration,
    /// Topic filter subscribed on every (re)connect. `#` observes all
    /// event messages.
    pub topic_filter: String,
    /// Recognition rule for session-defining topics.
    pub session_pattern: SessionPattern,
    /// Prefix of the generated client id.
    pub client_id_prefix: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            connect_timeout: Duration::from_secs(60),
            topic_filter: "#".to_string(),
            session_pattern: SessionPattern::default(),
            client_id_prefix: "gateway".to_string(),
        }
    }
}

impl GatewayConfig {
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_topic_filter(mut self, filter: impl Into<String>) -> Self {
        self.topic_filter = filter.into();
        self
    }

    pub fn with_session_pattern(mut self, pattern: SessionPattern) -> Self {
        self.session_pattern = pattern;
        self
    }

    pub fn with_client_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.client_id_prefix = prefix.into();
        self
    }

    /// Load configuration from environment variables, falling back to
    /// defaults (localhost broker on the standard port).
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let mut config = Self::default();
        if let Ok(host) = env::var("GATEWAY_MQTT_HOST") {
            config.host = host;
        }
        if let Ok(port) = env::var("GATEWAY_MQTT_PORT") {
            config.port = port
                .parse()
                .context("GATEWAY_MQTT_PORT must be a valid port number")?;
        }
        if let Ok(filter) = env::var("GATEWAY_TOPIC_FILTER") {
            config.topic_filter = filter;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_local_broker() {
        let config = GatewayConfig::default();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 1883);
        assert_eq!(config.topic_filter, "#");
    }

    #[test]
    fn builders_override_fields() {
        let config = GatewayConfig::default()
            .with_host("10.0.0.5")
            .with_port(8883)
            .with_topic_filter("ah700/operations/#")
            .with_client_id_prefix("ops");
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 8883);
        assert_eq!(config.topic_filter, "ah700/operations/#");
        assert_eq!(config.client_id_prefix, "ops");
    }
}
