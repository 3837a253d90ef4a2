//! Event-subscription protocol domain.
//!
//! ```text
//!   Connecting ──► AwaitingWelcome ──welcome──► SessionActive ◄─┐
//!                                                  │  │         │ keepalive /
//!                                                  │  └─────────┘ notification
//!                                         reconnect│
//!                                                  ▼
//!                                             Reconnecting ──welcome──► SessionActive
//!
//!   any state ──revocation / close──► Disconnected
//! ```

mod events;
mod phase;
mod session;
mod types;

pub use events::{FollowEvent, RaidEvent, SubscribeEvent, SubscriptionEvent, SubscriptionEventData};
pub use phase::SubscriptionPhase;
pub use session::SubscriptionSession;
pub use types::SubscriptionType;
