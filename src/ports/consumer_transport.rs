//! ConsumerTransport port - outbound half of one viewer connection.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("transport closed")]
    Closed,

    #[error("transport write failed: {0}")]
    Io(String),
}

/// Where a consumer session's delivery task writes encoded envelopes.
#[async_trait]
pub trait ConsumerTransport: Send {
    async fn send(&mut self, frame: &str) -> Result<(), TransportError>;

    /// Best-effort close; called exactly once when the session ends.
    async fn close(&mut self);
}
