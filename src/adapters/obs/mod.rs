//! OBS control channel (obs-websocket v5).
//!
//! The streamed adapter shape: one persistent socket, one message per
//! recognised inbound event, and a keepalive sub-task sending websocket
//! pings for as long as the socket is up.

mod adapter;
pub mod protocol;

pub use adapter::{ObsAdapter, ObsConfig};
