//! Inbound event processing.
//!
//! Every event coming off the broker is forwarded to the log verbatim.
//! Events whose topic matches the configured session-defining pattern
//! additionally teach the gateway the active session identifier, which
//! scoped commands substitute into their destination topics later (see
//! [`crate::dispatch`]).

use std::borrow::Cow;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::session::SessionState;

/// Topic segment separator used by the broker.
const TOPIC_SEPARATOR: char = '/';

/// An event received from the broker. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct InboundEvent {
    pub topic: String,
    pub payload: Vec<u8>,
    pub received_at: DateTime<Utc>,
}

impl InboundEvent {
    pub fn new(topic: impl Into<String>, payload: Vec<u8>) -> Self {
        Self {
            topic: topic.into(),
            payload,
            received_at: Utc::now(),
        }
    }

    /// Payload as UTF-8 text, with invalid bytes replaced.
    pub fn payload_text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.payload)
    }
}

/// Recognition rule for session-defining topics.
///
/// A topic is session-defining when one of its segments equals `marker`;
/// the session identifier then sits at the zero-indexed `segment`
/// position. The default matches handler lifecycle-start topics of the
/// form `ah700/operations/startup/<session>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPattern {
    pub marker: String,
    pub segment: usize,
}

impl SessionPattern {
    pub fn new(marker: impl Into<String>, segment: usize) -> Self {
        Self {
            marker: marker.into(),
            segment,
        }
    }
}

impl Default for SessionPattern {
    fn default() -> Self {
        Self::new("startup", 3)
    }
}

/// Consumes inbound events in arrival order: logs each one and updates
/// the shared [`SessionState`] when a session-defining event arrives.
///
/// Driven by the transport's event-loop task, one event at a time.
pub struct EventProcessor {
    session: Arc<SessionState>,
    pattern: SessionPattern,
}

impl EventProcessor {
    pub fn new(session: Arc<SessionState>, pattern: SessionPattern) -> Self {
        Self { session, pattern }
    }

    /// Handle one inbound event.
    ///
    /// A session-defining topic that is too short to carry the identifier
    /// segment is logged as a warning and otherwise ignored; it never
    /// interrupts event delivery.
    pub fn process(&self, event: &InboundEvent) {
        tracing::info!(topic = %event.topic, payload = %event.payload_text(), "event");

        let segments: Vec<&str> = event.topic.split(TOPIC_SEPARATOR).collect();
        if !segments.iter().any(|segment| *segment == self.pattern.marker) {
            return;
        }

        match segments.get(self.pattern.segment) {
            Some(identifier) => {
                self.session.set_identifier(*identifier);
                tracing::info!(identifier = *identifier, "session identifier updated");
            }
            None => {
                tracing::warn!(
                    topic = %event.topic,
                    expected_segment = self.pattern.segment,
                    "session-defining topic too short, identifier not updated"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processor(session: &Arc<SessionState>) -> EventProcessor {
        EventProcessor::new(Arc::clone(session), SessionPattern::default())
    }

    #[test]
    fn startup_topic_sets_identifier() {
        let session = Arc::new(SessionState::new());
        let events = processor(&session);

        events.process(&InboundEvent::new(
            "ah700/operations/startup/SESSION-42",
            b"{}".to_vec(),
        ));

        assert_eq!(session.identifier().as_deref(), Some("SESSION-42"));
    }

    #[test]
    fn later_event_overrides_identifier() {
        let session = Arc::new(SessionState::new());
        let events = processor(&session);

        events.process(&InboundEvent::new(
            "ah700/operations/startup/SESSION-1",
            Vec::new(),
        ));
        events.process(&InboundEvent::new(
            "ah700/operations/startup/SESSION-2",
            Vec::new(),
        ));

        assert_eq!(session.identifier().as_deref(), Some("SESSION-2"));
    }

    #[test]
    fn unrelated_topic_leaves_identifier_alone() {
        let session = Arc::new(SessionState::new());
        let events = processor(&session);

        events.process(&InboundEvent::new(
            "ah700/operations/startup/SESSION-42",
            Vec::new(),
        ));
        events.process(&InboundEvent::new(
            "ah700/operations/pick/SOCKET-3",
            Vec::new(),
        ));

        assert_eq!(session.identifier().as_deref(), Some("SESSION-42"));
    }

    #[test]
    fn short_session_topic_is_skipped() {
        let session = Arc::new(SessionState::new());
        let events = processor(&session);

        // Marker present but no fourth segment to extract.
        events.process(&InboundEvent::new("ah700/startup", Vec::new()));

        assert_eq!(session.identifier(), None);
    }

    #[test]
    fn custom_pattern_extracts_from_configured_segment() {
        let session = Arc::new(SessionState::new());
        let events = EventProcessor::new(
            Arc::clone(&session),
            SessionPattern::new("jobstart", 2),
        );

        events.process(&InboundEvent::new("fleet/jobstart/RUN-7/extra", Vec::new()));

        assert_eq!(session.identifier().as_deref(), Some("RUN-7"));
    }

    #[test]
    fn binary_payload_is_logged_lossily() {
        let event = InboundEvent::new("topic", vec![0xff, 0xfe, b'o', b'k']);
        assert!(event.payload_text().contains("ok"));
    }
}
