//! End-to-end flow over a recorded transport: events teach the session
//! identifier, the dispatcher gates on it.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use broker_gateway::{
    Command, CommandDispatcher, CommandTransport, DispatchOutcome, EventProcessor, GatewayError,
    InboundEvent, SessionPattern, SessionState,
};

#[derive(Default)]
struct RecordingTransport {
    published: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl CommandTransport for RecordingTransport {
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), GatewayError> {
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload.to_string()));
        Ok(())
    }
}

#[tokio::test]
async fn handler_session_flow() {
    let session = Arc::new(SessionState::new());
    let events = EventProcessor::new(Arc::clone(&session), SessionPattern::default());
    let transport = Arc::new(RecordingTransport::default());
    let commands = CommandDispatcher::new(
        Arc::clone(&session),
        Arc::clone(&transport) as Arc<dyn CommandTransport>,
    );

    // Before any session-defining event, a handler command is refused.
    let outcome = commands.dispatch(&Command::pause_job()).await;
    assert_eq!(
        outcome,
        DispatchOutcome::Rejected {
            reason: "session not yet established".to_string(),
        }
    );

    // Ordinary traffic passes through without touching the session.
    events.process(&InboundEvent::new(
        "ah700/lightowerchanged/dell004",
        br#"{"Color":"green"}"#.to_vec(),
    ));
    assert_eq!(session.identifier(), None);

    // The lifecycle-start event carries the identifier in its fourth
    // segment.
    events.process(&InboundEvent::new(
        "ah700/operations/startup/SESSION-42",
        b"{}".to_vec(),
    ));
    assert_eq!(session.identifier().as_deref(), Some("SESSION-42"));

    // The same dispatch now succeeds, scoped to the learned session.
    let outcome = commands.dispatch(&Command::pause_job()).await;
    assert_eq!(
        outcome,
        DispatchOutcome::Published {
            topic: "command/ah700/pausejob/SESSION-42".to_string(),
        }
    );

    // Machine-manager commands were never gated.
    let outcome = commands
        .dispatch(&Command::launch_task("dell004", "TEST", 10))
        .await;
    assert!(matches!(outcome, DispatchOutcome::Published { .. }));

    let published = transport.published.lock().unwrap().clone();
    assert_eq!(published.len(), 2);
    assert_eq!(published[0].0, "command/ah700/pausejob/SESSION-42");
    assert_eq!(published[1].0, "command/tasklink/launchtasklink/dell004");
}

#[tokio::test]
async fn restarted_session_redirects_scoped_commands() {
    let session = Arc::new(SessionState::new());
    let events = EventProcessor::new(Arc::clone(&session), SessionPattern::default());
    let transport = Arc::new(RecordingTransport::default());
    let commands = CommandDispatcher::new(
        Arc::clone(&session),
        Arc::clone(&transport) as Arc<dyn CommandTransport>,
    );

    events.process(&InboundEvent::new(
        "ah700/operations/startup/SESSION-1",
        b"{}".to_vec(),
    ));
    commands.dispatch(&Command::abort_job()).await;

    // A later lifecycle-start replaces the identifier; the template is
    // re-rendered at dispatch time, never cached.
    events.process(&InboundEvent::new(
        "ah700/operations/startup/SESSION-2",
        b"{}".to_vec(),
    ));
    commands.dispatch(&Command::abort_job()).await;

    let published = transport.published.lock().unwrap().clone();
    assert_eq!(published[0].0, "command/ah700/abortjob/SESSION-1");
    assert_eq!(published[1].0, "command/ah700/abortjob/SESSION-2");
}
