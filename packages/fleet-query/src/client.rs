//! Fleet query client: inventory queries and the paged message
//! consumer.

use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::error::QueryError;
use crate::transport::{GraphqlTransport, HttpTransport};
use crate::types::{
    AdapterRecord, AdapterStatistics, AdapterWithStatistics, HandlerRecord, MessageBatch,
    MessageFilter, MessageOrder, MessageRecord, Page, PageCursor, ProgrammerRecord,
};

const MESSAGES_QUERY: &str = r#"
query Messages($take: Int!, $skip: Int!, $where: MessageFilterInput, $order: [MessageSortInput!]) {
  messages(take: $take, skip: $skip, where: $where, order: $order) {
    totalCount
    items {
      topic
      timestamp
      payloadAsString
    }
    pageInfo {
      hasNextPage
    }
  }
}"#;

const HANDLERS_QUERY: &str = r#"
query Handlers {
  systems {
    handlerId
    entity {
      entityIdentifier
      entityName
    }
    handlerType
    ipAddress
    hostName
    machineFactory
  }
}"#;

const PROGRAMMERS_QUERY: &str = r#"
query Programmers {
  programmers {
    programmerId
    entity {
      entityName
      entityIdentifier
    }
    programmerType
    ipAddress
    handler {
      entity {
        entityName
      }
    }
  }
}"#;

const ADAPTERS_QUERY: &str = r#"
query Adapters {
  adapters {
    adapterKey
    adapterId
    entity {
      entityIdentifier
    }
    programmer {
      entity {
        entityName
      }
    }
  }
}"#;

const ADAPTER_STATISTICS_QUERY: &str = r#"
query AdapterStatistics($entityIdentifier: String!) {
  latestAdapterStatistics(entityIdentifier: $entityIdentifier) {
    adapterId
    cleanCount
    lifetimeActuationCount
    lifetimeContinuityFailCount
    lifetimeFailCount
    lifetimePassCount
    socketIndex
    adapterState
  }
}"#;

/// Typed client over the fleet GraphQL API.
pub struct FleetClient<T = HttpTransport> {
    transport: T,
}

impl FleetClient<HttpTransport> {
    /// Client for the given GraphQL endpoint.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            transport: HttpTransport::new(endpoint),
        }
    }
}

impl<T: GraphqlTransport> FleetClient<T> {
    /// Client over a custom transport.
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    async fn query_field<R: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
        field: &str,
    ) -> Result<R, QueryError> {
        let mut data = self.transport.execute(query, variables).await?;
        let value = data.get_mut(field).map(Value::take).unwrap_or(Value::Null);
        Ok(serde_json::from_value(value)?)
    }

    /// All handlers known to the fleet service.
    pub async fn handlers(&self) -> Result<Vec<HandlerRecord>, QueryError> {
        self.query_field(HANDLERS_QUERY, Value::Null, "systems").await
    }

    /// All programmers known to the fleet service.
    pub async fn programmers(&self) -> Result<Vec<ProgrammerRecord>, QueryError> {
        self.query_field(PROGRAMMERS_QUERY, Value::Null, "programmers")
            .await
    }

    /// All adapters known to the fleet service.
    pub async fn adapters(&self) -> Result<Vec<AdapterRecord>, QueryError> {
        self.query_field(ADAPTERS_QUERY, Value::Null, "adapters").await
    }

    /// Latest statistics for one adapter, `None` when the server has
    /// none recorded.
    pub async fn latest_adapter_statistics(
        &self,
        entity_identifier: &str,
    ) -> Result<Option<AdapterStatistics>, QueryError> {
        self.query_field(
            ADAPTER_STATISTICS_QUERY,
            json!({ "entityIdentifier": entity_identifier }),
            "latestAdapterStatistics",
        )
        .await
    }

    /// Adapters joined with their latest statistics.
    ///
    /// A statistics lookup that fails at the API level leaves that one
    /// adapter's statistics absent and the run continues; transport and
    /// decode failures end the run.
    pub async fn adapters_with_statistics(
        &self,
    ) -> Result<Vec<AdapterWithStatistics>, QueryError> {
        let adapters = self.adapters().await?;
        let mut out = Vec::with_capacity(adapters.len());
        for adapter in adapters {
            let statistics = match adapter.entity.entity_identifier.as_deref() {
                Some(identifier) => match self.latest_adapter_statistics(identifier).await {
                    Ok(statistics) => statistics,
                    Err(QueryError::Api { message }) => {
                        tracing::warn!(
                            identifier,
                            error = %message,
                            "statistics lookup failed, leaving absent"
                        );
                        None
                    }
                    Err(other) => return Err(other),
                },
                None => None,
            };
            out.push(AdapterWithStatistics {
                adapter,
                statistics,
            });
        }
        Ok(out)
    }

    /// Fetch archived messages page by page until the server reports the
    /// last page, returning them in server order.
    ///
    /// `max_pages` bounds the run against a server that never reports a
    /// last page; `None` keeps reading until exhaustion. Stopping at the
    /// bound is reported via [`MessageBatch::truncated`], not as an
    /// error. Any page fetch failure aborts the whole run.
    pub async fn messages(
        &self,
        filter: Option<MessageFilter>,
        order: Option<MessageOrder>,
        max_pages: Option<usize>,
    ) -> Result<MessageBatch, QueryError> {
        let mut cursor = PageCursor::default();
        let mut messages = Vec::new();
        let mut pages = 0usize;
        let mut truncated = false;

        loop {
            let variables = json!({
                "take": cursor.page_size,
                "skip": cursor.skip,
                "where": filter.as_ref().and_then(MessageFilter::to_variable),
                "order": order.map(MessageOrder::to_variable),
            });
            let page: Page<MessageRecord> = self
                .query_field(MESSAGES_QUERY, variables, "messages")
                .await?;

            if cursor.skip == 0 {
                tracing::info!(total = page.total_count, "messages query started");
            }
            cursor.advance(&page);
            messages.extend(page.items);
            pages += 1;

            if !cursor.has_next {
                break;
            }
            if let Some(bound) = max_pages {
                if pages >= bound {
                    tracing::warn!(
                        pages,
                        "page bound reached before the server reported the last page"
                    );
                    truncated = true;
                    break;
                }
            }
        }

        Ok(MessageBatch {
            total_count: cursor.total_count.unwrap_or(0),
            messages,
            truncated,
        })
    }
}
