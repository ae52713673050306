//! Wire types for the fleet GraphQL API.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

/// Items requested per page. The API caps pages at this size.
pub const PAGE_SIZE: i64 = 50;

/// Offset cursor driving a paged query. Fresh per run; `skip` grows by
/// `page_size` per request, so the sequence of offsets is
/// `0, P, 2P, ...` until the server reports the last page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageCursor {
    pub page_size: i64,
    pub skip: i64,
    /// Total reported by the server, captured from the first response.
    pub total_count: Option<i64>,
    pub has_next: bool,
}

impl PageCursor {
    pub fn new(page_size: i64) -> Self {
        Self {
            page_size,
            skip: 0,
            total_count: None,
            has_next: true,
        }
    }

    /// Record a received page and move the offset to the next one.
    pub fn advance<T>(&mut self, page: &Page<T>) {
        self.total_count.get_or_insert(page.total_count);
        self.has_next = page.page_info.has_next_page;
        self.skip += self.page_size;
    }
}

impl Default for PageCursor {
    fn default() -> Self {
        Self::new(PAGE_SIZE)
    }
}

/// One page of a paged query.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total_count: i64,
    pub items: Vec<T>,
    pub page_info: PageInfo,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub has_next_page: bool,
}

/// An archived broker message.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRecord {
    pub topic: String,
    pub timestamp: DateTime<Utc>,
    pub payload_as_string: String,
}

/// Server-side filter for the messages query, passed as GraphQL
/// variables rather than interpolated into the query text.
#[derive(Debug, Clone, Default)]
pub struct MessageFilter {
    pub topic_contains: Option<String>,
}

impl MessageFilter {
    /// Keep only messages whose topic contains `fragment`.
    pub fn topic_contains(fragment: impl Into<String>) -> Self {
        Self {
            topic_contains: Some(fragment.into()),
        }
    }

    pub(crate) fn to_variable(&self) -> Option<Value> {
        self.topic_contains
            .as_ref()
            .map(|fragment| json!({ "topic": { "contains": fragment } }))
    }
}

/// Server-side sort order for the messages query. The API guarantees
/// stable ordering across pages for a fixed sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOrder {
    TimestampAsc,
    TimestampDesc,
}

impl MessageOrder {
    pub(crate) fn to_variable(self) -> Value {
        match self {
            Self::TimestampAsc => json!([{ "timestamp": "ASC" }]),
            Self::TimestampDesc => json!([{ "timestamp": "DESC" }]),
        }
    }
}

/// Aggregated result of a full paged messages run.
#[derive(Debug, Clone)]
pub struct MessageBatch {
    /// Total the server reported on the first page.
    pub total_count: i64,
    /// All fetched messages, in server order.
    pub messages: Vec<MessageRecord>,
    /// True when the run stopped at the caller's page bound before the
    /// server reported the last page.
    pub truncated: bool,
}

/// Name and identifier pair attached to fleet entities.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub entity_name: Option<String>,
    pub entity_identifier: Option<String>,
}

/// A machine handler known to the fleet service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandlerRecord {
    pub handler_id: i64,
    pub entity: Entity,
    pub handler_type: String,
    pub ip_address: Option<String>,
    pub host_name: Option<String>,
    pub machine_factory: Option<String>,
}

/// A device programmer and the handler it is attached to, if any.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgrammerRecord {
    pub programmer_id: i64,
    pub entity: Entity,
    pub programmer_type: String,
    pub ip_address: Option<String>,
    pub handler: Option<HandlerRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HandlerRef {
    pub entity: Entity,
}

/// A socket adapter and the programmer it sits on, if any.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterRecord {
    pub adapter_key: i64,
    pub adapter_id: String,
    pub entity: Entity,
    pub programmer: Option<ProgrammerRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProgrammerRef {
    pub entity: Entity,
}

/// Latest metric entries for one adapter.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdapterStatistics {
    pub adapter_id: String,
    pub clean_count: i64,
    pub lifetime_actuation_count: i64,
    pub lifetime_continuity_fail_count: i64,
    pub lifetime_fail_count: i64,
    pub lifetime_pass_count: i64,
    pub socket_index: i64,
    pub adapter_state: String,
}

/// An adapter joined with its latest statistics, when available.
#[derive(Debug, Clone)]
pub struct AdapterWithStatistics {
    pub adapter: AdapterRecord,
    /// `None` when the adapter has no usable identifier, no recorded
    /// statistics, or the statistics lookup failed at the API level.
    pub statistics: Option<AdapterStatistics>,
}
