//! Paged GraphQL client for the fleet query API.
//!
//! The fleet service archives every broker message and tracks the
//! machine inventory (handlers, programmers, socket adapters). Its
//! message archive is served in bounded pages; [`FleetClient::messages`]
//! drives the offset cursor until the server reports the last page and
//! hands the caller one ordered batch.
//!
//! # Example
//!
//! ```ignore
//! use fleet_query::{FleetClient, MessageFilter, MessageOrder};
//!
//! let client = FleetClient::new("http://localhost:5001/graphql");
//!
//! let batch = client
//!     .messages(
//!         Some(MessageFilter::topic_contains("programmingcomplete")),
//!         Some(MessageOrder::TimestampAsc),
//!         None,
//!     )
//!     .await?;
//! println!("{} messages", batch.total_count);
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod transport;
pub mod types;

pub use client::FleetClient;
pub use config::QueryConfig;
pub use error::QueryError;
pub use transport::{GraphqlTransport, HttpTransport};
pub use types::{
    AdapterRecord, AdapterStatistics, AdapterWithStatistics, Entity, HandlerRecord, HandlerRef,
    MessageBatch, MessageFilter, MessageOrder, MessageRecord, Page, PageCursor, PageInfo,
    ProgrammerRecord, ProgrammerRef, PAGE_SIZE,
};
