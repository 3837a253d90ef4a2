//! Normalized chat payloads.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// One Twitch chat line after tag parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwitchChatMessage {
    pub username: String,
    pub display_name: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub channel: String,
    pub timestamp: Timestamp,
    pub is_moderator: bool,
    pub is_subscriber: bool,
    pub badges: Vec<String>,
}

/// One YouTube live chat text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YouTubeChatMessage {
    pub id: String,
    pub author_name: String,
    pub author_channel_id: String,
    pub message: String,
    pub timestamp: Timestamp,
    pub is_moderator: bool,
    pub is_sponsor: bool,
    pub is_owner: bool,
}
