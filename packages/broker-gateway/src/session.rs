//! Shared session state: the learned session identifier and the broker
//! connection status.
//!
//! # Guarantees
//!
//! - **Last-writer-wins**: `set_identifier` overwrites unconditionally;
//!   a later session-defining event always replaces an earlier one.
//! - **Single-field linearizability**: each field is individually safe to
//!   read and write from any thread. No compound atomicity across the
//!   identifier and the status is provided;
//!   [`crate::dispatch::CommandDispatcher`] reads the identifier exactly
//!   once per dispatch and needs nothing stronger.
//! - The identifier is an application-level value and survives
//!   Connected→Disconnected→Connected transitions. Only a new
//!   session-defining event (or [`SessionState::clear_identifier`])
//!   replaces it.

use std::sync::RwLock;

use tokio::sync::watch;

/// Connection status of the broker session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Connecting,
    Connected,
}

/// Thread-safe holder of the active session identifier and the
/// connection status. Shared as `Arc<SessionState>` between the
/// transport's event-loop task and command triggers.
pub struct SessionState {
    identifier: RwLock<Option<String>>,
    status: watch::Sender<ConnectionStatus>,
}

impl SessionState {
    /// Fresh state: no identifier, disconnected.
    pub fn new() -> Self {
        let (status, _) = watch::channel(ConnectionStatus::Disconnected);
        Self {
            identifier: RwLock::new(None),
            status,
        }
    }

    /// Adopt a new session identifier, replacing any previous one.
    pub fn set_identifier(&self, identifier: impl Into<String>) {
        let mut guard = self
            .identifier
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(identifier.into());
    }

    /// The current session identifier, if one has been learned.
    pub fn identifier(&self) -> Option<String> {
        self.identifier
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Forget the current session identifier.
    pub fn clear_identifier(&self) {
        let mut guard = self
            .identifier
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = None;
    }

    /// Record a connection status transition.
    pub fn set_status(&self, status: ConnectionStatus) {
        self.status.send_replace(status);
    }

    /// The current connection status.
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Watch receiver for status transitions. Used by the transport to
    /// await the initial Connected acknowledgment.
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("identifier", &self.identifier())
            .field("status", &self.status())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn identifier_starts_absent() {
        let state = SessionState::new();
        assert_eq!(state.identifier(), None);
        assert_eq!(state.status(), ConnectionStatus::Disconnected);
    }

    #[test]
    fn last_writer_wins() {
        let state = SessionState::new();
        state.set_identifier("SESSION-1");
        state.set_identifier("SESSION-2");
        assert_eq!(state.identifier().as_deref(), Some("SESSION-2"));
    }

    #[test]
    fn identifier_survives_reconnect() {
        let state = SessionState::new();
        state.set_identifier("SESSION-42");

        state.set_status(ConnectionStatus::Connected);
        state.set_status(ConnectionStatus::Disconnected);
        state.set_status(ConnectionStatus::Connecting);
        state.set_status(ConnectionStatus::Connected);

        assert_eq!(state.identifier().as_deref(), Some("SESSION-42"));
    }

    #[test]
    fn clear_identifier_resets() {
        let state = SessionState::new();
        state.set_identifier("SESSION-42");
        state.clear_identifier();
        assert_eq!(state.identifier(), None);
    }

    #[test]
    fn concurrent_writers_and_readers() {
        let state = Arc::new(SessionState::new());

        let writers: Vec<_> = (0..4)
            .map(|w| {
                let state = Arc::clone(&state);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        state.set_identifier(format!("SESSION-{w}-{i}"));
                    }
                })
            })
            .collect();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let state = Arc::clone(&state);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        // Reads observe either nothing or a complete value.
                        if let Some(id) = state.identifier() {
                            assert!(id.starts_with("SESSION-"));
                        }
                    }
                })
            })
            .collect();

        for handle in writers.into_iter().chain(readers) {
            handle.join().unwrap();
        }
        assert!(state.identifier().is_some());
    }

    #[tokio::test]
    async fn status_watch_observes_transition() {
        let state = Arc::new(SessionState::new());
        let mut rx = state.subscribe_status();

        let setter = {
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                state.set_status(ConnectionStatus::Connecting);
                state.set_status(ConnectionStatus::Connected);
            })
        };

        let connected = rx
            .wait_for(|status| *status == ConnectionStatus::Connected)
            .await;
        assert!(connected.is_ok());
        setter.await.unwrap();
    }
}
