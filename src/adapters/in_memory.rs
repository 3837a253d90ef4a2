//! In-memory adapters for tests and local wiring.
//!
//! - [`CollectingSink`] records every emitted message.
//! - [`ChannelTransport`] is a consumer transport backed by an unbounded
//!   channel, observed through its [`ViewerFeed`].

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::{mpsc, Notify};

use crate::domain::hub::{HubMessage, MessageKind};
use crate::ports::{ConsumerTransport, MessageSink, TransportError};

/// Sink that keeps every message it is given.
#[derive(Default)]
pub struct CollectingSink {
    messages: Mutex<Vec<HubMessage>>,
    notify: Notify,
}

impl CollectingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<HubMessage> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn of_kind(&self, kind: MessageKind) -> Vec<HubMessage> {
        self.lock()
            .iter()
            .filter(|m| m.kind() == kind)
            .cloned()
            .collect()
    }

    /// Waits until at least `count` messages have been collected.
    pub async fn wait_for(&self, count: usize) {
        loop {
            let notified = self.notify.notified();
            if self.len() >= count {
                return;
            }
            notified.await;
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<HubMessage>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MessageSink for CollectingSink {
    fn emit(&self, message: HubMessage) {
        self.lock().push(message);
        self.notify.notify_waiters();
    }
}

/// Consumer transport writing frames into a channel.
pub struct ChannelTransport {
    frames: Option<mpsc::UnboundedSender<String>>,
    closed: Arc<AtomicBool>,
    stalled: bool,
}

/// Observer side of a [`ChannelTransport`].
pub struct ViewerFeed {
    frames: mpsc::UnboundedReceiver<String>,
    closed: Arc<AtomicBool>,
}

impl ChannelTransport {
    pub fn new() -> (Self, ViewerFeed) {
        Self::build(false)
    }

    /// A transport whose writes never complete, simulating a consumer that
    /// stopped reading.
    pub fn stalled() -> (Self, ViewerFeed) {
        Self::build(true)
    }

    fn build(stalled: bool) -> (Self, ViewerFeed) {
        let (tx, rx) = mpsc::unbounded_channel();
        let closed = Arc::new(AtomicBool::new(false));
        (
            Self {
                frames: Some(tx),
                closed: Arc::clone(&closed),
                stalled,
            },
            ViewerFeed { frames: rx, closed },
        )
    }
}

#[async_trait]
impl ConsumerTransport for ChannelTransport {
    async fn send(&mut self, frame: &str) -> Result<(), TransportError> {
        if self.stalled {
            std::future::pending::<()>().await;
        }
        let frames = self.frames.as_ref().ok_or(TransportError::Closed)?;
        frames
            .send(frame.to_string())
            .map_err(|_| TransportError::Closed)
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::Release);
        self.frames = None;
    }
}

impl ViewerFeed {
    pub async fn recv(&mut self) -> Option<String> {
        self.frames.recv().await
    }

    pub fn try_recv(&mut self) -> Option<String> {
        self.frames.try_recv().ok()
    }

    /// True once the delivery task closed the transport.
    pub fn was_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::AdapterId;
    use serde_json::json;

    #[tokio::test]
    async fn collecting_sink_records_in_order() {
        let sink = CollectingSink::new();
        for n in 0..3 {
            sink.emit(HubMessage::from_value(
                MessageKind::AgentStatus,
                AdapterId::agent(),
                json!(n),
            ));
        }
        sink.wait_for(3).await;
        let payloads: Vec<_> = sink.messages().iter().map(|m| m.payload().clone()).collect();
        assert_eq!(payloads, vec![json!(0), json!(1), json!(2)]);
    }

    #[tokio::test]
    async fn channel_transport_rejects_writes_after_close() {
        let (mut transport, feed) = ChannelTransport::new();
        transport.close().await;
        assert!(feed.was_closed());
        assert!(matches!(
            transport.send("x").await,
            Err(TransportError::Closed)
        ));
    }
}
