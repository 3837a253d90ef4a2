//! Shared write half of an upstream websocket.

use std::sync::Arc;

use async_trait::async_trait;
use futures::SinkExt;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;

use crate::ports::AdapterError;

use super::{map_ws_error, WsSink};

/// Anything a text-line protocol can be written to.
#[async_trait]
pub trait TextWriter: Send + Sync {
    async fn send_text(&self, text: String) -> Result<(), AdapterError>;
}

/// Clonable handle to one connection's write half.
#[derive(Clone)]
pub struct SharedWriter {
    inner: Arc<Mutex<Option<WsSink>>>,
}

impl SharedWriter {
    pub fn new(sink: WsSink) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(sink))),
        }
    }

    pub async fn send(&self, message: Message) -> Result<(), AdapterError> {
        let mut guard = self.inner.lock().await;
        let sink = guard.as_mut().ok_or(AdapterError::NotConnected)?;
        sink.send(message).await.map_err(map_ws_error)
    }

    /// Sends a close frame and releases the write half. Later calls are
    /// no-ops.
    pub async fn close(&self) {
        let sink = self.inner.lock().await.take();
        if let Some(mut sink) = sink {
            if let Err(e) = sink.close().await {
                tracing::trace!("Closing finished websocket: {}", e);
            }
        }
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.is_none()
    }
}

#[async_trait]
impl TextWriter for SharedWriter {
    async fn send_text(&self, text: String) -> Result<(), AdapterError> {
        self.send(Message::Text(text)).await
    }
}
