//! Typed errors for the fleet query client.
//!
//! The distinction between [`QueryError::Api`] and the transport/decode
//! variants matters: optional enrichment lookups absorb `Api` failures
//! (the server had nothing for that one item) while everything else
//! propagates.

use thiserror::Error;

/// Errors that can occur while querying the fleet API.
#[derive(Debug, Error)]
pub enum QueryError {
    /// HTTP transport failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status or GraphQL errors
    #[error("query API error: {message}")]
    Api { message: String },

    /// Response JSON did not match the expected shape
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}
