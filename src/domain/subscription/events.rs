//! Normalized subscription event payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::Timestamp;

use super::SubscriptionType;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowEvent {
    pub user_id: String,
    pub user_login: String,
    pub user_name: String,
    pub followed_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeEvent {
    pub user_id: String,
    pub user_login: String,
    pub user_name: String,
    pub tier: String,
    #[serde(default)]
    pub is_gift: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaidEvent {
    #[serde(rename(serialize = "from_user_id", deserialize = "from_broadcaster_user_id"))]
    pub from_user_id: String,
    #[serde(rename(serialize = "from_user_login", deserialize = "from_broadcaster_user_login"))]
    pub from_user_login: String,
    #[serde(rename(serialize = "from_user_name", deserialize = "from_broadcaster_user_name"))]
    pub from_user_name: String,
    pub viewers: u64,
}

/// Type-specific event body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SubscriptionEventData {
    Follow(FollowEvent),
    Subscribe(SubscribeEvent),
    Raid(RaidEvent),
}

/// A decoded notification, tagged with its type and capture time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionEvent {
    #[serde(rename = "type")]
    pub kind: SubscriptionType,
    pub data: SubscriptionEventData,
    pub timestamp: Timestamp,
}

impl SubscriptionEvent {
    /// Decodes the `event` object of a notification for `kind`.
    pub fn decode(kind: SubscriptionType, event: &Value) -> Result<Self, serde_json::Error> {
        let data = match kind {
            SubscriptionType::Follow => {
                SubscriptionEventData::Follow(serde_json::from_value(event.clone())?)
            }
            SubscriptionType::Subscribe => {
                SubscriptionEventData::Subscribe(serde_json::from_value(event.clone())?)
            }
            SubscriptionType::Raid => {
                SubscriptionEventData::Raid(serde_json::from_value(event.clone())?)
            }
        };
        Ok(Self {
            kind,
            data,
            timestamp: Timestamp::now(),
        })
    }
}
