//! Session-correlated command gateway over the fleet MQTT broker.
//!
//! # Overview
//!
//! The automation fleet publishes its events over MQTT. One of those
//! events defines the running session: the handler's lifecycle-start
//! topic carries the session identifier that later commands must be
//! scoped to. This crate owns that correlation:
//!
//! - [`BrokerSession`] drives the connection lifecycle (connect,
//!   automatic reconnect, resubscribe, disconnect) on a background task.
//! - [`SessionState`] is the shared cell holding the learned session
//!   identifier and the connection status.
//! - [`EventProcessor`] consumes inbound events in arrival order,
//!   logging each one and updating [`SessionState`] when a
//!   session-defining event arrives.
//! - [`CommandDispatcher`] gates scoped commands on the identifier and
//!   publishes them, rejecting any scoped command before a session is
//!   known.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use broker_gateway::{
//!     BrokerSession, Command, CommandDispatcher, GatewayConfig, SessionState,
//! };
//!
//! let session = Arc::new(SessionState::new());
//! let broker = BrokerSession::connect(GatewayConfig::default(), Arc::clone(&session)).await?;
//!
//! let commands = CommandDispatcher::new(session, Arc::new(broker.publish_handle()));
//!
//! // Rejected until a session-defining event has been observed.
//! let outcome = commands.dispatch(&Command::pause_job()).await;
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod events;
pub mod session;
pub mod transport;

pub use config::GatewayConfig;
pub use dispatch::{
    Command, CommandDispatcher, CommandScope, CommandTransport, DispatchOutcome,
    SESSION_PLACEHOLDER,
};
pub use error::GatewayError;
pub use events::{EventProcessor, InboundEvent, SessionPattern};
pub use session::{ConnectionStatus, SessionState};
pub use transport::{BrokerSession, PublishHandle};
