//! Subscription types the portal can request.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Channel events the portal subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionType {
    Follow,
    Subscribe,
    Raid,
}

impl SubscriptionType {
    pub const ALL: [SubscriptionType; 3] = [
        SubscriptionType::Follow,
        SubscriptionType::Subscribe,
        SubscriptionType::Raid,
    ];

    /// Name used on the wire, e.g. `channel.follow`.
    pub fn wire_name(&self) -> &'static str {
        match self {
            SubscriptionType::Follow => "channel.follow",
            SubscriptionType::Subscribe => "channel.subscribe",
            SubscriptionType::Raid => "channel.raid",
        }
    }

    pub fn version(&self) -> &'static str {
        match self {
            SubscriptionType::Follow => "2",
            SubscriptionType::Subscribe | SubscriptionType::Raid => "1",
        }
    }

    /// Short tag carried in normalized events, e.g. `follow`.
    pub fn event_tag(&self) -> &'static str {
        match self {
            SubscriptionType::Follow => "follow",
            SubscriptionType::Subscribe => "subscribe",
            SubscriptionType::Raid => "raid",
        }
    }

    /// Looks up a type from its wire name; unknown names yield `None`.
    pub fn from_wire(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.wire_name() == name)
    }

    /// Condition payload binding the subscription to `broadcaster_id`.
    ///
    /// Raids are watched in the incoming direction. Follows require the
    /// moderator field to carry the same identity as the broadcaster.
    pub fn condition(&self, broadcaster_id: &str) -> Value {
        match self {
            SubscriptionType::Raid => json!({ "to_broadcaster_user_id": broadcaster_id }),
            SubscriptionType::Follow => json!({
                "broadcaster_user_id": broadcaster_id,
                "moderator_user_id": broadcaster_id,
            }),
            SubscriptionType::Subscribe => json!({ "broadcaster_user_id": broadcaster_id }),
        }
    }
}

impl fmt::Display for SubscriptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

impl FromStr for SubscriptionType {
    type Err = ValidationError;

    /// Accepts either the short tag (`raid`) or the wire name (`channel.raid`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.event_tag() == name || t.wire_name() == name)
            .ok_or_else(|| ValidationError::UnknownSubscriptionType(name.to_string()))
    }
}
