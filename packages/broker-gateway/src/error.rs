//! Typed errors for the broker gateway.
//!
//! Uses `thiserror` for library errors (not `anyhow`) so callers can
//! pattern-match on what went wrong.

use thiserror::Error;

/// Errors surfaced by the broker gateway.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Broker did not acknowledge the connection within the configured window
    #[error("connect timed out after {seconds}s")]
    ConnectTimeout { seconds: u64 },

    /// The event loop ended while the connection was still being established
    #[error("broker connection closed")]
    ConnectionClosed,

    /// A single publish write failed
    #[error("publish to '{topic}' failed: {reason}")]
    Publish { topic: String, reason: String },
}
