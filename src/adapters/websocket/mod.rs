//! WebSocket fan-out to viewers.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Adapters (agent, obs, twitch-chat, twitch-eventsub, youtube-chat)  │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │ emit (HubIntake, never blocks)
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                         HubDispatcher                               │
//! │   - Drains the bounded intake                                       │
//! │   - Sends a periodic liveness ping                                  │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                     │ broadcast
//!                                     ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                           EventHub                                   │
//! │   session A [queue] ─► delivery task ─► transport                    │
//! │   session B [queue] ─► delivery task ─► transport                    │
//! │   session C [full ] ─► dropped                                       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Components
//!
//! - [`hub`] - Consumer registry and broadcast
//! - [`session`] - Per-consumer queue and delivery task
//! - [`intake`] - Emit handle and dispatcher task
//! - [`messages`] - Frames viewers may send
//! - [`handler`] - Axum WebSocket upgrade handler

pub mod handler;
pub mod hub;
pub mod intake;
pub mod messages;
pub mod session;

pub use handler::{websocket_router, ws_handler, WebSocketState, WebSocketTransport};
pub use hub::{BroadcastReport, EventHub, EventHubConfig, HubError, DEFAULT_QUEUE_CAPACITY};
pub use intake::{intake_channel, HubDispatcher, HubIntake};
pub use messages::ClientMessage;
pub use session::SessionHandle;
