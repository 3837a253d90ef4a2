//! Inbound frames sent by viewers.
//!
//! Outbound frames are [`HubMessage`] envelopes; see
//! [`HubMessage::to_envelope_json`].
//!
//! [`HubMessage`]: crate::domain::hub::HubMessage
//! [`HubMessage::to_envelope_json`]: crate::domain::hub::HubMessage::to_envelope_json

use serde::Deserialize;

/// Messages a viewer may send over its websocket.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Liveness probe, answered with a `pong` to this viewer only.
    Ping,
    /// Reply to the hub's periodic `ping`.
    Pong,
}

impl ClientMessage {
    /// Parses a text frame; unknown or malformed frames yield `None`.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }
}
