//! Chat domain types shared by the Twitch and YouTube sources.

mod message;
mod tags;

pub use message::{TwitchChatMessage, YouTubeChatMessage};
pub use tags::ChatTags;
