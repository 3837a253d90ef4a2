//! Twitch adapters.
//!
//! - [`TwitchChatAdapter`] - IRC-over-websocket chat with its own
//!   handshake and keepalive sub-protocol
//! - [`EventSubAdapter`] - session-based event subscriptions
//! - [`HelixClient`] - the REST control channel EventSub subscriptions
//!   are created through

mod chat;
pub mod eventsub;
mod helix;
pub mod irc;

pub use chat::{ChatState, TwitchChatAdapter, TwitchChatConfig};
pub use eventsub::{EventSubAdapter, EventSubConfig};
pub use helix::{HelixClient, HelixConfig};
