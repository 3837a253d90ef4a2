//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the hub to external systems:
//! - `websocket` - Event hub, viewer sessions and the upgrade handler
//! - `http` - Status routes and the assembled router
//! - `stream` / `http_client` - Shared upstream connection helpers
//! - `poll` - Generic poll-driven producer
//! - `agent`, `youtube` - Poll sources
//! - `obs`, `twitch` - Streamed producers
//! - `in_memory` - Sinks and transports for tests

pub mod agent;
pub mod http;
pub mod http_client;
pub mod in_memory;
pub mod obs;
pub mod poll;
pub mod stream;
pub mod twitch;
pub mod websocket;
pub mod youtube;
