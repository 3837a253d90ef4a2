//! MessageSink port - the `emit` seam between adapters and the hub.
//!
//! Adapters never hold the hub. They are handed a `MessageSink` at wiring
//! time, which keeps every adapter testable against an in-memory sink.

use crate::domain::hub::HubMessage;

/// Destination for normalized messages produced by an adapter.
///
/// `emit` must not block: implementations either enqueue without waiting
/// or drop the message.
pub trait MessageSink: Send + Sync {
    fn emit(&self, message: HubMessage);
}
