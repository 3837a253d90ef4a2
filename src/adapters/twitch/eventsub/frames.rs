//! Inbound EventSub frames.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::foundation::Timestamp;
use crate::domain::subscription::SubscriptionSession;

/// One decoded frame, keyed by `metadata.message_type`.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Welcome(SubscriptionSession),
    Keepalive,
    Notification {
        subscription_type: String,
        event: Value,
    },
    Reconnect(SubscriptionSession),
    Revocation {
        subscription_type: String,
        status: String,
    },
    /// A message type this client does not know.
    Unknown(String),
}

#[derive(Deserialize)]
struct RawFrame {
    metadata: Metadata,
    #[serde(default)]
    payload: Value,
}

#[derive(Deserialize)]
struct Metadata {
    message_type: String,
    #[serde(default)]
    subscription_type: Option<String>,
}

#[derive(Deserialize)]
struct SessionPayload {
    session: WireSession,
}

#[derive(Deserialize)]
struct WireSession {
    id: String,
    #[serde(default)]
    status: String,
    #[serde(default)]
    keepalive_timeout_seconds: Option<u64>,
    #[serde(default)]
    reconnect_url: Option<String>,
    #[serde(default)]
    connected_at: Option<String>,
}

impl From<WireSession> for SubscriptionSession {
    fn from(wire: WireSession) -> Self {
        SubscriptionSession {
            session_id: wire.id,
            status: wire.status,
            keepalive_timeout_seconds: wire.keepalive_timeout_seconds,
            reconnect_url: wire.reconnect_url.filter(|url| !url.is_empty()),
            connected_at: wire.connected_at.as_deref().and_then(Timestamp::parse_rfc3339),
        }
    }
}

#[derive(Deserialize)]
struct SubscriptionPayload {
    subscription: WireSubscription,
    #[serde(default)]
    event: Value,
}

#[derive(Deserialize)]
struct WireSubscription {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    status: String,
}

impl Frame {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        let raw: RawFrame = serde_json::from_str(text)?;

        let frame = match raw.metadata.message_type.as_str() {
            "session_welcome" => {
                let payload: SessionPayload = serde_json::from_value(raw.payload)?;
                Frame::Welcome(payload.session.into())
            }
            "session_keepalive" => Frame::Keepalive,
            "session_reconnect" => {
                let payload: SessionPayload = serde_json::from_value(raw.payload)?;
                Frame::Reconnect(payload.session.into())
            }
            "notification" => {
                let payload: SubscriptionPayload = serde_json::from_value(raw.payload)?;
                Frame::Notification {
                    subscription_type: raw
                        .metadata
                        .subscription_type
                        .unwrap_or(payload.subscription.kind),
                    event: payload.event,
                }
            }
            "revocation" => {
                let payload: SubscriptionPayload = serde_json::from_value(raw.payload)?;
                Frame::Revocation {
                    subscription_type: payload.subscription.kind,
                    status: payload.subscription.status,
                }
            }
            other => Frame::Unknown(other.to_string()),
        };

        Ok(frame)
    }
}
