//! Normalized message exchanged between adapters, the hub and consumers.

use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;
use thiserror::Error;

use crate::domain::foundation::{AdapterId, Timestamp};

/// Platform a chat message was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatSource {
    Twitch,
    YouTube,
}

/// Platform a subscription event was delivered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventSource {
    Twitch,
}

/// Closed set of message kinds.
///
/// Unknown upstream events never become a `MessageKind`; adapters drop
/// them before constructing a [`HubMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    AgentStatus,
    ControlToolEvent,
    ChatMessage(ChatSource),
    SubscriptionEvent(EventSource),
    Ping,
    Pong,
}

impl MessageKind {
    /// The `type` tag written into the outbound envelope.
    pub fn wire_tag(&self) -> &'static str {
        match self {
            MessageKind::AgentStatus => "agent_status",
            MessageKind::ControlToolEvent => "obs_event",
            MessageKind::ChatMessage(ChatSource::Twitch) => "twitch_chat",
            MessageKind::ChatMessage(ChatSource::YouTube) => "youtube_chat",
            MessageKind::SubscriptionEvent(EventSource::Twitch) => "twitch_event",
            MessageKind::Ping => "ping",
            MessageKind::Pong => "pong",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_tag())
    }
}

/// Errors raised while building or encoding a [`HubMessage`].
#[derive(Debug, Error)]
pub enum HubMessageError {
    #[error("payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Immutable, tagged event unit.
///
/// Fields are private; once built a message is only ever read, cloned
/// behind an `Arc`, or encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct HubMessage {
    kind: MessageKind,
    payload: Value,
    origin: AdapterId,
    captured_at: Timestamp,
}

#[derive(Serialize)]
struct Envelope<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    data: &'a Value,
}

impl HubMessage {
    /// Builds a message from any serializable payload.
    ///
    /// # Arguments
    ///
    /// * `kind` - The message kind, fixed for the lifetime of the message
    /// * `origin` - Adapter that produced the message
    /// * `payload` - Source-specific data, encoded to JSON once here
    pub fn new<T: Serialize>(
        kind: MessageKind,
        origin: AdapterId,
        payload: &T,
    ) -> Result<Self, HubMessageError> {
        Ok(Self::from_value(kind, origin, serde_json::to_value(payload)?))
    }

    /// Builds a message from an already-encoded JSON payload.
    pub fn from_value(kind: MessageKind, origin: AdapterId, payload: Value) -> Self {
        Self {
            kind,
            payload,
            origin,
            captured_at: Timestamp::now(),
        }
    }

    /// Liveness probe broadcast by the hub itself.
    pub fn ping() -> Self {
        Self::liveness(MessageKind::Ping)
    }

    /// Reply to a consumer's ping, delivered to that consumer only.
    pub fn pong() -> Self {
        Self::liveness(MessageKind::Pong)
    }

    fn liveness(kind: MessageKind) -> Self {
        let captured_at = Timestamp::now();
        Self {
            kind,
            payload: json!({ "timestamp": captured_at.to_rfc3339() }),
            origin: AdapterId::builtin("hub"),
            captured_at,
        }
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn origin(&self) -> &AdapterId {
        &self.origin
    }

    pub fn captured_at(&self) -> Timestamp {
        self.captured_at
    }

    /// Encodes the outbound `{ "type": ..., "data": ... }` envelope.
    ///
    /// Encoding is deterministic: the same message always yields the
    /// same bytes.
    pub fn to_envelope_json(&self) -> Result<String, HubMessageError> {
        let envelope = Envelope {
            kind: self.kind.wire_tag(),
            data: &self.payload,
        };
        Ok(serde_json::to_string(&envelope)?)
    }
}
