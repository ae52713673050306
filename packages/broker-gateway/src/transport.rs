//! Broker session lifecycle over MQTT.
//!
//! [`BrokerSession::connect`] establishes the connection, subscribes to
//! the configured topic filter, and spawns a background task that drives
//! the MQTT event loop. The task feeds every inbound message through the
//! [`EventProcessor`] in arrival order and re-broadcasts it for
//! application observers.
//!
//! Reconnection is automatic: the event loop re-dials on error, and the
//! subscription is renewed on every connection acknowledgment since
//! broker-side subscriptions do not survive a dropped connection. The
//! session reads Connected only after the renewed subscription is
//! acknowledged.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::GatewayConfig;
use crate::dispatch::CommandTransport;
use crate::error::GatewayError;
use crate::events::{EventProcessor, InboundEvent};
use crate::session::{ConnectionStatus, SessionState};

/// MQTT keep-alive interval.
const KEEP_ALIVE: Duration = Duration::from_secs(60);

/// Delay before re-polling the event loop after a connection error.
const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Capacity of the client request queue and the event fan-out channel.
const CHANNEL_CAPACITY: usize = 256;

/// An active session with the broker. Owns the connection handle and the
/// background event-loop task; no other component touches the connection
/// directly.
pub struct BrokerSession {
    client: AsyncClient,
    session: Arc<SessionState>,
    events: broadcast::Sender<InboundEvent>,
    stop: Arc<AtomicBool>,
    driver: JoinHandle<()>,
}

impl BrokerSession {
    /// Connect to the broker and start event delivery.
    ///
    /// Blocks until the broker acknowledges the connection and the topic
    /// subscription is in place, or until `config.connect_timeout`
    /// passes. On timeout the pending connection is torn down and the
    /// status returns to Disconnected.
    pub async fn connect(
        config: GatewayConfig,
        session: Arc<SessionState>,
    ) -> Result<Self, GatewayError> {
        let client_id = format!("{}-{}", config.client_id_prefix, Uuid::new_v4().simple());
        let mut options = MqttOptions::new(client_id.clone(), config.host.clone(), config.port);
        options.set_keep_alive(KEEP_ALIVE);

        let (client, event_loop) = AsyncClient::new(options, CHANNEL_CAPACITY);
        let (events, _) = broadcast::channel(CHANNEL_CAPACITY);
        let stop = Arc::new(AtomicBool::new(false));
        let processor = EventProcessor::new(Arc::clone(&session), config.session_pattern.clone());

        session.set_status(ConnectionStatus::Connecting);
        tracing::info!(
            host = %config.host,
            port = config.port,
            client_id = %client_id,
            "connecting to broker"
        );

        let mut status = session.subscribe_status();
        let driver = tokio::spawn(drive(
            event_loop,
            client.clone(),
            Arc::clone(&session),
            processor,
            events.clone(),
            Arc::clone(&stop),
            config.topic_filter.clone(),
        ));

        let wait = status.wait_for(|current| *current == ConnectionStatus::Connected);
        let result = match tokio::time::timeout(config.connect_timeout, wait).await {
            Ok(Ok(_)) => Ok(Self {
                client,
                session,
                events,
                stop,
                driver,
            }),
            Ok(Err(_)) => Err(GatewayError::ConnectionClosed),
            Err(_) => {
                stop.store(true, Ordering::SeqCst);
                let _ = client.disconnect().await;
                driver.abort();
                session.set_status(ConnectionStatus::Disconnected);
                Err(GatewayError::ConnectTimeout {
                    seconds: config.connect_timeout.as_secs(),
                })
            }
        };
        result
    }

    /// Publish a single message. Failure is returned to the caller,
    /// never escalated.
    pub async fn publish(&self, topic: &str, payload: &str) -> Result<(), GatewayError> {
        self.client
            .publish(topic.to_owned(), QoS::AtLeastOnce, false, payload.to_owned())
            .await
            .map_err(|err| GatewayError::Publish {
                topic: topic.to_owned(),
                reason: err.to_string(),
            })
    }

    /// Receiver for all inbound events. Subscribers joining late miss
    /// earlier events; slow subscribers may lag.
    pub fn subscribe_events(&self) -> broadcast::Receiver<InboundEvent> {
        self.events.subscribe()
    }

    /// Cloneable publish-only handle, suitable for handing to a
    /// [`crate::dispatch::CommandDispatcher`].
    pub fn publish_handle(&self) -> PublishHandle {
        PublishHandle {
            client: self.client.clone(),
        }
    }

    /// The shared session state this connection reports into.
    pub fn session(&self) -> Arc<SessionState> {
        Arc::clone(&self.session)
    }

    /// Disconnect and stop event delivery deterministically: when this
    /// returns, the event-loop task has exited and no further events
    /// reach the processor or subscribers.
    pub async fn disconnect(self) -> Result<(), GatewayError> {
        self.stop.store(true, Ordering::SeqCst);
        let _ = self.client.disconnect().await;
        let _ = self.driver.await;
        Ok(())
    }
}

/// Cloneable write-only handle to the broker connection.
#[derive(Clone)]
pub struct PublishHandle {
    client: AsyncClient,
}

#[async_trait]
impl CommandTransport for PublishHandle {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), GatewayError> {
        self.client
            .publish(topic.to_owned(), QoS::AtLeastOnce, false, payload.to_owned())
            .await
            .map_err(|err| GatewayError::Publish {
                topic: topic.to_owned(),
                reason: err.to_string(),
            })
    }
}

/// Background task: polls the MQTT event loop until stopped.
///
/// Connection errors flip the status to Connecting and re-poll after a
/// short delay (polling again is what triggers the client's automatic
/// reconnect). The subscription is renewed on every successful
/// acknowledgment, and Connected is reported once the broker confirms
/// it.
async fn drive(
    mut event_loop: EventLoop,
    client: AsyncClient,
    session: Arc<SessionState>,
    processor: EventProcessor,
    events: broadcast::Sender<InboundEvent>,
    stop: Arc<AtomicBool>,
    topic_filter: String,
) {
    loop {
        if stop.load(Ordering::SeqCst) {
            break;
        }
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                if ack.code == ConnectReturnCode::Success {
                    if let Err(err) = client.subscribe(topic_filter.clone(), QoS::AtMostOnce).await
                    {
                        tracing::warn!(error = %err, "subscribe request failed");
                    }
                } else {
                    tracing::warn!(code = ?ack.code, "broker refused connection");
                }
            }
            Ok(Event::Incoming(Packet::SubAck(_))) => {
                session.set_status(ConnectionStatus::Connected);
                if topic_filter == "#" {
                    tracing::info!("subscribed to all event messages");
                } else {
                    tracing::info!(filter = %topic_filter, "subscribed to event messages");
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let event = InboundEvent::new(publish.topic, publish.payload.to_vec());
                processor.process(&event);
                let _ = events.send(event);
            }
            Ok(_) => {}
            Err(err) => {
                if stop.load(Ordering::SeqCst) {
                    break;
                }
                session.set_status(ConnectionStatus::Connecting);
                tracing::warn!(error = %err, "broker connection lost, retrying");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
    session.set_status(ConnectionStatus::Disconnected);
    tracing::info!("broker event loop stopped");
}
