//! Query client configuration.

use std::env;

use anyhow::Result;
use dotenvy::dotenv;

/// Configuration for the fleet query client.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// GraphQL endpoint of the fleet service.
    pub endpoint: String,
    /// Optional topic fragment used to filter the messages query.
    pub topic_contains: Option<String>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:5001/graphql".to_string(),
            topic_contains: None,
        }
    }
}

impl QueryConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_topic_contains(mut self, fragment: impl Into<String>) -> Self {
        self.topic_contains = Some(fragment.into());
        self
    }

    /// Load configuration from environment variables, falling back to
    /// the local fleet service.
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let mut config = Self::default();
        if let Ok(endpoint) = env::var("FLEET_GRAPHQL_URL") {
            config.endpoint = endpoint;
        }
        config.topic_contains = env::var("FLEET_TOPIC_CONTAINS").ok();
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_target_local_service() {
        let config = QueryConfig::default();
        assert_eq!(config.endpoint, "http://localhost:5001/graphql");
        assert!(config.topic_contains.is_none());
    }

    #[test]
    fn builders_override_fields() {
        let config = QueryConfig::default()
            .with_endpoint("http://fleet:5001/graphql")
            .with_topic_contains("programmingcomplete");
        assert_eq!(config.endpoint, "http://fleet:5001/graphql");
        assert_eq!(
            config.topic_contains.as_deref(),
            Some("programmingcomplete")
        );
    }
}
