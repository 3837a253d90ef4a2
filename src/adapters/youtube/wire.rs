//! YouTube Data API v3 response shapes.

use serde::Deserialize;

use crate::domain::chat::YouTubeChatMessage;
use crate::domain::foundation::Timestamp;

#[derive(Debug, Deserialize)]
pub(super) struct BroadcastList {
    #[serde(default)]
    pub items: Vec<Broadcast>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Broadcast {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub snippet: BroadcastSnippet,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct BroadcastSnippet {
    #[serde(default)]
    pub live_chat_id: Option<String>,
}

impl BroadcastList {
    /// First broadcast that carries a live chat.
    pub fn live_chat_id(&self) -> Option<&str> {
        self.items
            .iter()
            .filter_map(|b| b.snippet.live_chat_id.as_deref())
            .find(|id| !id.is_empty())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChatPage {
    #[serde(default)]
    pub next_page_token: Option<String>,
    #[serde(default)]
    pub polling_interval_millis: Option<u64>,
    #[serde(default)]
    pub items: Vec<ChatItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChatItem {
    #[serde(default)]
    pub id: String,
    /// Absent on some moderation items; such items are skipped.
    #[serde(default)]
    pub snippet: Option<ChatSnippet>,
    #[serde(default)]
    pub author_details: AuthorDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ChatSnippet {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub display_message: String,
    #[serde(default)]
    pub text_message_details: Option<TextMessageDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct TextMessageDetails {
    pub message_text: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AuthorDetails {
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub is_chat_owner: bool,
    #[serde(default)]
    pub is_chat_moderator: bool,
    #[serde(default)]
    pub is_chat_sponsor: bool,
}

const TEXT_MESSAGE: &str = "textMessageEvent";

impl ChatItem {
    /// Normalizes a text message; every other item type yields `None`.
    pub fn into_message(self) -> Option<YouTubeChatMessage> {
        let snippet = self.snippet?;
        if snippet.kind != TEXT_MESSAGE {
            return None;
        }

        let message = match snippet.text_message_details {
            Some(details) => details.message_text,
            None => snippet.display_message,
        };
        let timestamp = snippet
            .published_at
            .as_deref()
            .and_then(Timestamp::parse_rfc3339)
            .unwrap_or_else(Timestamp::now);

        Some(YouTubeChatMessage {
            id: self.id,
            author_name: self.author_details.display_name,
            author_channel_id: self.author_details.channel_id,
            message,
            timestamp,
            is_moderator: self.author_details.is_chat_moderator,
            is_sponsor: self.author_details.is_chat_sponsor,
            is_owner: self.author_details.is_chat_owner,
        })
    }
}
