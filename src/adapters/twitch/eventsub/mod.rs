//! EventSub - Twitch's session-based event subscription websocket.
//!
//! ```text
//!   connect                welcome                 reconnect frame
//! Connecting ─▶ AwaitingWelcome ─▶ SessionActive ──────────────▶ Reconnecting
//!                                   │  ▲  keepalive/notification      │
//!                                   │  └──────────────────────────────┘
//!                                   │            new welcome
//!                                   └─ revocation ─▶ Disconnected
//! ```
//!
//! The server never expects an outbound handshake. Subscriptions are created
//! through the Helix control channel once a fresh session is welcomed.

mod adapter;
mod frames;
mod machine;

pub use adapter::{EventSubAdapter, EventSubConfig};
pub use frames::Frame;
pub use machine::{Action, SubscriptionMachine};
