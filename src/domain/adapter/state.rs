//! Per-adapter state snapshot.

use serde::Serialize;

use crate::domain::foundation::{AdapterId, StateMachine, Timestamp, ValidationError};

use super::AdapterStatus;

/// Adapter-specific session data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AdapterSession {
    #[default]
    None,
    /// Chat connection identity.
    Chat { nickname: String, channel: String },
    /// Event-subscription session identifier.
    Subscription { session_id: String },
    /// Control-tool protocol versions negotiated on identify.
    ControlTool {
        server_version: Option<String>,
        rpc_version: u32,
    },
    /// Poll loop bookkeeping.
    Poll {
        last_success: Option<Timestamp>,
        interval_ms: u64,
    },
}

/// Status of one adapter as seen by status reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdapterState {
    adapter: AdapterId,
    status: AdapterStatus,
    session: AdapterSession,
    last_error: Option<String>,
    updated_at: Timestamp,
}

impl AdapterState {
    /// Initial state for a freshly configured adapter.
    pub fn new(adapter: AdapterId) -> Self {
        Self {
            adapter,
            status: AdapterStatus::Disconnected,
            session: AdapterSession::None,
            last_error: None,
            updated_at: Timestamp::now(),
        }
    }

    pub fn adapter(&self) -> &AdapterId {
        &self.adapter
    }

    pub fn status(&self) -> AdapterStatus {
        self.status
    }

    pub fn session(&self) -> &AdapterSession {
        &self.session
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn updated_at(&self) -> Timestamp {
        self.updated_at
    }

    /// Moves to `target`, validating against the status state machine.
    ///
    /// Reaching `Connected` clears the recorded error. A same-status
    /// request is a no-op.
    pub fn transition(&mut self, target: AdapterStatus) -> Result<(), ValidationError> {
        if self.status == target {
            return Ok(());
        }
        self.status.advance(target)?;
        if target == AdapterStatus::Connected {
            self.last_error = None;
        }
        self.updated_at = Timestamp::now();
        Ok(())
    }

    /// Records the most recent failure without changing status.
    pub fn record_error(&mut self, error: impl Into<String>) {
        self.last_error = Some(error.into());
        self.updated_at = Timestamp::now();
    }

    /// Replaces the adapter-specific session data wholesale.
    pub fn set_session(&mut self, session: AdapterSession) {
        self.session = session;
        self.updated_at = Timestamp::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_disconnected_without_session() {
        let state = AdapterState::new(AdapterId::agent());
        assert_eq!(state.status(), AdapterStatus::Disconnected);
        assert_eq!(state.session(), &AdapterSession::None);
        assert!(state.last_error().is_none());
    }

    #[test]
    fn transition_rejects_invalid_moves() {
        let mut state = AdapterState::new(AdapterId::obs());
        assert!(state.transition(AdapterStatus::Connected).is_err());
        assert_eq!(state.status(), AdapterStatus::Disconnected);
    }

    #[test]
    fn same_status_transition_is_noop() {
        let mut state = AdapterState::new(AdapterId::obs());
        assert!(state.transition(AdapterStatus::Disconnected).is_ok());
    }

    #[test]
    fn reaching_connected_clears_recorded_error() {
        let mut state = AdapterState::new(AdapterId::twitch_chat());
        state.transition(AdapterStatus::Connecting).unwrap();
        state.record_error("login failed");
        state.transition(AdapterStatus::Degraded).unwrap();
        assert_eq!(state.last_error(), Some("login failed"));

        state.transition(AdapterStatus::Connecting).unwrap();
        state.transition(AdapterStatus::Connected).unwrap();
        assert!(state.last_error().is_none());
    }

    #[test]
    fn session_serializes_with_kind_tag() {
        let session = AdapterSession::Chat {
            nickname: "portal".to_string(),
            channel: "portal".to_string(),
        };
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["kind"], "chat");
        assert_eq!(json["channel"], "portal");
    }
}
