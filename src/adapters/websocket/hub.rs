//! Event hub - process-wide fan-out of [`HubMessage`]s to consumers.
//!
//! # Architecture
//!
//! ```text
//!   broadcast(msg)
//!        │  encode once, try_send the shared frame (never waits)
//!        ├──────────────► [queue cap N] ──► delivery task ──► transport A
//!        ├──────────────► [queue cap N] ──► delivery task ──► transport B
//!        └──────────────► [queue FULL ] ──► session dropped, transport closed
//! ```
//!
//! # Thread Safety
//!
//! The registry is a `std::sync::RwLock`: `broadcast` only needs a read
//! lock and never holds it across an await, so it can be called from any
//! context without blocking on consumer I/O.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use thiserror::Error;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinSet;

use crate::domain::foundation::ConsumerId;
use crate::domain::hub::HubMessage;
use crate::ports::ConsumerTransport;

use super::session::{self, ConsumerSession, SessionHandle};

/// Default per-session outbound queue bound.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HubError {
    #[error("hub is shutting down")]
    ShuttingDown,
}

/// Configuration for the [`EventHub`].
#[derive(Debug, Clone)]
pub struct EventHubConfig {
    /// Messages a consumer may lag behind before it is dropped.
    pub queue_capacity: usize,
}

impl Default for EventHubConfig {
    fn default() -> Self {
        Self {
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

impl EventHubConfig {
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }
}

/// Counts from one [`EventHub::broadcast`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BroadcastReport {
    /// Sessions the message was queued for.
    pub delivered: usize,
    /// Sessions dropped because their queue was full or gone.
    pub dropped: usize,
}

/// Owns the consumer registry and every session's delivery task.
pub struct EventHub {
    sessions: RwLock<HashMap<ConsumerId, ConsumerSession>>,
    delivery_tasks: Mutex<JoinSet<()>>,
    shutting_down: AtomicBool,
    config: EventHubConfig,
}

impl EventHub {
    pub fn new(config: EventHubConfig) -> Arc<Self> {
        Arc::new(Self {
            sessions: RwLock::new(HashMap::new()),
            delivery_tasks: Mutex::new(JoinSet::new()),
            shutting_down: AtomicBool::new(false),
            config,
        })
    }

    /// Registers a consumer and starts its delivery task.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::ShuttingDown`] once [`EventHub::shutdown`] has
    /// begun; the caller should close its transport.
    pub fn register(
        self: &Arc<Self>,
        transport: Box<dyn ConsumerTransport>,
    ) -> Result<SessionHandle, HubError> {
        let mut sessions = self.write_sessions();
        if self.shutting_down.load(Ordering::Acquire) {
            return Err(HubError::ShuttingDown);
        }

        let id = ConsumerId::new();
        let (entry, receiver) = ConsumerSession::open(self.config.queue_capacity);
        let handle = entry.handle(id);

        // Spawned under the registry lock so shutdown cannot miss the task.
        {
            let mut tasks = self.lock_tasks();
            while tasks.try_join_next().is_some() {}
            tasks.spawn(session::deliver(Arc::downgrade(self), id, receiver, transport));
        }
        sessions.insert(id, entry);

        tracing::debug!(session_id = %id, sessions = sessions.len(), "Consumer registered");
        Ok(handle)
    }

    /// Removes a consumer. Calling it again for the same handle is a no-op.
    pub fn unregister(&self, handle: &SessionHandle) {
        self.remove(&handle.id());
    }

    /// Queues `message` for every registered consumer.
    ///
    /// The envelope is encoded once and every consumer receives the same
    /// bytes. Never waits: a consumer whose queue is full is unregistered
    /// and its transport closed, leaving every other consumer untouched.
    pub fn broadcast(&self, message: HubMessage) -> BroadcastReport {
        let Some(frame) = encode(&message) else {
            return BroadcastReport::default();
        };
        let mut stalled = Vec::new();

        let delivered = {
            let sessions = self.read_sessions();
            let mut delivered = 0;
            for (id, session) in sessions.iter() {
                match session.queue.try_send(Arc::clone(&frame)) {
                    Ok(()) => delivered += 1,
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(session_id = %id, "Consumer queue full, dropping session");
                        stalled.push(*id);
                    }
                    Err(TrySendError::Closed(_)) => stalled.push(*id),
                }
            }
            delivered
        };

        for id in &stalled {
            self.remove(id);
        }

        BroadcastReport {
            delivered,
            dropped: stalled.len(),
        }
    }

    /// Queues `message` for one consumer only.
    ///
    /// Returns false if the consumer is gone or had to be dropped.
    pub fn send_to(&self, handle: &SessionHandle, message: HubMessage) -> bool {
        let Some(frame) = encode(&message) else {
            return false;
        };
        let result = {
            let sessions = self.read_sessions();
            match sessions.get(&handle.id()) {
                Some(session) => session.queue.try_send(frame),
                None => return false,
            }
        };

        match result {
            Ok(()) => true,
            Err(_) => {
                self.remove(&handle.id());
                false
            }
        }
    }

    pub fn is_registered(&self, handle: &SessionHandle) -> bool {
        self.read_sessions().contains_key(&handle.id())
    }

    pub fn session_count(&self) -> usize {
        self.read_sessions().len()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::Acquire)
    }

    /// Refuses new registrations, closes every session and waits for all
    /// delivery tasks to exit.
    pub async fn shutdown(&self) {
        let drained = {
            let mut sessions = self.write_sessions();
            self.shutting_down.store(true, Ordering::Release);
            std::mem::take(&mut *sessions)
        };
        let count = drained.len();
        drop(drained);

        let mut tasks = std::mem::take(&mut *self.lock_tasks());
        while let Some(result) = tasks.join_next().await {
            if let Err(e) = result {
                tracing::warn!("Delivery task ended abnormally: {}", e);
            }
        }

        tracing::info!(sessions = count, "Event hub stopped");
    }

    /// Removes a session by id, returning whether it was present.
    pub(super) fn remove(&self, id: &ConsumerId) -> bool {
        let removed = self.write_sessions().remove(id);
        match removed {
            Some(_) => {
                tracing::debug!(session_id = %id, "Consumer unregistered");
                true
            }
            None => false,
        }
    }

    fn read_sessions(&self) -> RwLockReadGuard<'_, HashMap<ConsumerId, ConsumerSession>> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_sessions(&self) -> RwLockWriteGuard<'_, HashMap<ConsumerId, ConsumerSession>> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, JoinSet<()>> {
        self.delivery_tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

fn encode(message: &HubMessage) -> Option<Arc<str>> {
    match message.to_envelope_json() {
        Ok(frame) => Some(Arc::from(frame)),
        Err(e) => {
            tracing::warn!(kind = %message.kind(), origin = %message.origin(), "Dropping unencodable message: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory::ChannelTransport;
    use crate::domain::foundation::AdapterId;
    use crate::domain::hub::MessageKind;
    use serde_json::json;
    use std::time::Duration;

    fn status(n: u32) -> HubMessage {
        HubMessage::from_value(MessageKind::AgentStatus, AdapterId::agent(), json!({ "n": n }))
    }

    #[tokio::test]
    async fn register_adds_session() {
        let hub = EventHub::new(EventHubConfig::default());
        let (transport, _rx) = ChannelTransport::new();

        let handle = hub.register(Box::new(transport)).unwrap();

        assert!(hub.is_registered(&handle));
        assert_eq!(hub.session_count(), 1);
    }

    #[tokio::test]
    async fn unregister_twice_is_same_as_once() {
        let hub = EventHub::new(EventHubConfig::default());
        let (transport, _rx) = ChannelTransport::new();
        let (other, _other_rx) = ChannelTransport::new();
        let handle = hub.register(Box::new(transport)).unwrap();
        let other = hub.register(Box::new(other)).unwrap();

        hub.unregister(&handle);
        let after_once = hub.session_count();
        hub.unregister(&handle);

        assert_eq!(hub.session_count(), after_once);
        assert!(!hub.is_registered(&handle));
        assert!(hub.is_registered(&other));
    }

    #[tokio::test]
    async fn broadcast_preserves_order_per_session() {
        let hub = EventHub::new(EventHubConfig::default());
        let (transport, mut rx) = ChannelTransport::new();
        hub.register(Box::new(transport)).unwrap();

        for n in 0..5 {
            hub.broadcast(status(n));
        }

        for n in 0..5 {
            let frame = tokio::time::timeout(Duration::from_secs(1), rx.recv())
                .await
                .unwrap()
                .unwrap();
            let value: serde_json::Value = serde_json::from_str(&frame).unwrap();
            assert_eq!(value["data"]["n"], n);
        }
    }

    #[tokio::test]
    async fn broadcast_sends_identical_bytes_to_every_session() {
        let hub = EventHub::new(EventHubConfig::default());
        let mut viewers = Vec::new();
        for _ in 0..3 {
            let (transport, rx) = ChannelTransport::new();
            hub.register(Box::new(transport)).unwrap();
            viewers.push(rx);
        }

        let report = hub.broadcast(status(7));
        assert_eq!(report.delivered, 3);

        let mut frames = Vec::new();
        for rx in viewers.iter_mut() {
            let frame = tokio::time::timeout(Duration::from_secs(1), rx.recv())
                .await
                .unwrap()
                .unwrap();
            frames.push(frame);
        }
        assert_eq!(frames[0], r#"{"type":"agent_status","data":{"n":7}}"#);
        assert!(frames.iter().all(|frame| frame == &frames[0]));
    }

    #[tokio::test]
    async fn broadcast_with_no_sessions_reports_nothing() {
        let hub = EventHub::new(EventHubConfig::default());
        assert_eq!(hub.broadcast(status(1)), BroadcastReport::default());
    }

    #[tokio::test]
    async fn send_to_targets_single_session() {
        let hub = EventHub::new(EventHubConfig::default());
        let (a, mut a_rx) = ChannelTransport::new();
        let (b, mut b_rx) = ChannelTransport::new();
        let a = hub.register(Box::new(a)).unwrap();
        hub.register(Box::new(b)).unwrap();

        assert!(hub.send_to(&a, HubMessage::pong()));

        let frame = tokio::time::timeout(Duration::from_secs(1), a_rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert!(frame.starts_with(r#"{"type":"pong""#));
        assert!(b_rx.try_recv().is_none());
    }

    #[tokio::test]
    async fn send_to_unknown_session_returns_false() {
        let hub = EventHub::new(EventHubConfig::default());
        let (transport, _rx) = ChannelTransport::new();
        let handle = hub.register(Box::new(transport)).unwrap();
        hub.unregister(&handle);

        assert!(!hub.send_to(&handle, HubMessage::pong()));
    }

    #[tokio::test]
    async fn failed_write_unregisters_session() {
        let hub = EventHub::new(EventHubConfig::default());
        let (transport, rx) = ChannelTransport::new();
        let handle = hub.register(Box::new(transport)).unwrap();
        drop(rx);

        hub.broadcast(status(1));

        for _ in 0..50 {
            if !hub.is_registered(&handle) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(!hub.is_registered(&handle));
    }

    #[tokio::test]
    async fn register_after_shutdown_is_refused() {
        let hub = EventHub::new(EventHubConfig::default());
        hub.shutdown().await;

        let (transport, _rx) = ChannelTransport::new();
        assert_eq!(
            hub.register(Box::new(transport)).unwrap_err(),
            HubError::ShuttingDown
        );
    }

    #[tokio::test]
    async fn shutdown_closes_every_transport() {
        let hub = EventHub::new(EventHubConfig::default());
        let (a, a_rx) = ChannelTransport::new();
        let (b, b_rx) = ChannelTransport::new();
        hub.register(Box::new(a)).unwrap();
        hub.register(Box::new(b)).unwrap();

        hub.shutdown().await;

        assert_eq!(hub.session_count(), 0);
        assert!(a_rx.was_closed());
        assert!(b_rx.was_closed());
    }
}
