//! GraphQL transport boundary.
//!
//! [`GraphqlTransport`] is the seam between the typed client and the
//! wire: the live implementation POSTs to the server, tests script
//! responses.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::QueryError;

/// Executes GraphQL documents against the fleet API.
#[async_trait]
pub trait GraphqlTransport: Send + Sync {
    /// Run one query and return its `data` object.
    async fn execute(&self, query: &str, variables: Value) -> Result<Value, QueryError>;
}

/// HTTP POST transport for a GraphQL endpoint.
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl GraphqlTransport for HttpTransport {
    async fn execute(&self, query: &str, variables: Value) -> Result<Value, QueryError> {
        let resp = self
            .http
            .post(&self.endpoint)
            .json(&json!({ "query": query, "variables": variables }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(QueryError::Api {
                message: format!("HTTP {}: {}", status.as_u16(), body),
            });
        }

        let body: GraphqlResponse = resp.json().await?;
        unwrap_data(body)
    }
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse {
    data: Option<Value>,
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Debug, Deserialize)]
struct GraphqlError {
    message: String,
}

fn unwrap_data(body: GraphqlResponse) -> Result<Value, QueryError> {
    if let Some(first) = body.errors.as_ref().and_then(|errors| errors.first()) {
        return Err(QueryError::Api {
            message: first.message.clone(),
        });
    }
    body.data.ok_or_else(|| QueryError::Api {
        message: "response carried no data".to_string(),
    })
}
