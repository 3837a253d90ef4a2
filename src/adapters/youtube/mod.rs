//! YouTube live chat source.
//!
//! Resolves the live chat of the channel's active broadcast on connect,
//! then pages through `liveChat/messages` at the interval the API asks for.

mod chat;
mod wire;

pub use chat::{YouTubeChatConfig, YouTubeChatSource};
