//! Command dispatch with session gating.
//!
//! Commands come in two scopes. **Unscoped** commands go to a fixed
//! topic. **Scoped** commands address the job currently running on the
//! automated handler, so their topic must carry the session identifier
//! learned from the broker; a scoped command with no identifier in hand
//! is rejected before anything touches the network.
//!
//! The gate reads the identifier exactly once per dispatch and
//! substitutes that same value into the topic, so the value that passed
//! the gate is always the value that reaches the wire.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::error::GatewayError;
use crate::session::SessionState;

/// Placeholder in a scoped topic template, replaced by the active
/// session identifier at publish time. The identifier is never baked
/// into the [`Command`] itself, so a stale value cannot be reused.
pub const SESSION_PLACEHOLDER: &str = "{id}";

/// Whether a command's destination topic depends on the active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandScope {
    Unscoped,
    Scoped,
}

/// An outbound command: a topic (template) and a payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub scope: CommandScope,
    pub topic_template: String,
    pub payload: String,
}

impl Command {
    /// A command with a fixed destination topic.
    pub fn unscoped(topic: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            scope: CommandScope::Unscoped,
            topic_template: topic.into(),
            payload: payload.into(),
        }
    }

    /// A command whose topic template carries [`SESSION_PLACEHOLDER`].
    pub fn scoped(topic_template: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            scope: CommandScope::Scoped,
            topic_template: topic_template.into(),
            payload: payload.into(),
        }
    }

    /// Machine-manager command: launch the device programming UI on
    /// `machine` and start `job_name` for `quantity` devices.
    pub fn launch_job(machine: &str, job_name: &str, quantity: u32) -> Self {
        Self::unscoped(
            format!("command/dms/launchdms/{machine}"),
            json!({ "JobName": job_name, "Quantity": quantity }).to_string(),
        )
    }

    /// Machine-manager command: launch the task runner on `machine` in
    /// unattended batch mode.
    pub fn launch_task(machine: &str, task_name: &str, quantity: u32) -> Self {
        Self::unscoped(
            format!("command/tasklink/launchtasklink/{machine}"),
            json!({
                "TaskName": task_name,
                "AdministratorMode": true,
                "BatchMode": true,
                "Quantity": quantity,
            })
            .to_string(),
        )
    }

    /// Handler command: pause the job of the active session.
    pub fn pause_job() -> Self {
        Self::scoped(format!("command/ah700/pausejob/{SESSION_PLACEHOLDER}"), "{}")
    }

    /// Handler command: abort the job of the active session.
    pub fn abort_job() -> Self {
        Self::scoped(format!("command/ah700/abortjob/{SESSION_PLACEHOLDER}"), "{}")
    }
}

/// What became of one dispatch call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The command was written to the broker.
    Published { topic: String },
    /// The gate refused the command; nothing was published.
    Rejected { reason: String },
    /// The transport write failed.
    PublishFailed { topic: String, reason: String },
}

/// Write half of the broker connection, as seen by the dispatcher.
#[async_trait]
pub trait CommandTransport: Send + Sync {
    /// Write one message to the broker.
    async fn publish(&self, topic: &str, payload: &str) -> Result<(), GatewayError>;
}

/// Validates readiness against the shared [`SessionState`] and publishes
/// commands. Holds no per-call state: any number of triggers may
/// dispatch concurrently.
pub struct CommandDispatcher {
    session: Arc<SessionState>,
    transport: Arc<dyn CommandTransport>,
}

impl CommandDispatcher {
    pub fn new(session: Arc<SessionState>, transport: Arc<dyn CommandTransport>) -> Self {
        Self { session, transport }
    }

    /// Dispatch one command.
    ///
    /// A rejection is an expected outcome, reported to the caller and
    /// logged at info level rather than as an error. A publish failure
    /// is reported but not retried; retrying is the trigger's decision.
    pub async fn dispatch(&self, command: &Command) -> DispatchOutcome {
        let topic = match command.scope {
            CommandScope::Scoped => {
                // Single read; the same value is substituted below.
                let Some(identifier) = self.session.identifier() else {
                    tracing::info!(
                        template = %command.topic_template,
                        "scoped command rejected, session not yet established"
                    );
                    return DispatchOutcome::Rejected {
                        reason: "session not yet established".to_string(),
                    };
                };
                command.topic_template.replace(SESSION_PLACEHOLDER, &identifier)
            }
            CommandScope::Unscoped => command.topic_template.clone(),
        };

        match self.transport.publish(&topic, &command.payload).await {
            Ok(()) => {
                tracing::info!(topic = %topic, payload = %command.payload, "command published");
                DispatchOutcome::Published { topic }
            }
            Err(err) => {
                tracing::warn!(topic = %topic, error = %err, "command publish failed");
                DispatchOutcome::PublishFailed {
                    topic,
                    reason: err.to_string(),
                }
            }
        }
    }
}
