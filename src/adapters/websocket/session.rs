//! Consumer sessions and their delivery tasks.
//!
//! Each registered consumer gets a bounded outbound queue of encoded frames
//! and exactly one delivery task draining it into the consumer's transport. The registry
//! entry owns the sending half of the queue and a close signal; dropping
//! the entry is what ends the delivery task.

use std::sync::{Arc, Weak};

use tokio::sync::{mpsc, oneshot};

use crate::domain::foundation::{ConsumerId, Timestamp};
use crate::ports::ConsumerTransport;

use super::hub::EventHub;

/// Caller-side handle to a registered consumer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionHandle {
    id: ConsumerId,
    registered_at: Timestamp,
}

impl SessionHandle {
    pub fn id(&self) -> ConsumerId {
        self.id
    }

    pub fn registered_at(&self) -> Timestamp {
        self.registered_at
    }
}

/// Registry entry for one consumer.
pub(super) struct ConsumerSession {
    pub(super) queue: mpsc::Sender<Arc<str>>,
    pub(super) registered_at: Timestamp,
    _close: oneshot::Sender<()>,
}

/// Receiving side of a freshly opened session, handed to its delivery task.
pub(super) struct SessionReceiver {
    queue: mpsc::Receiver<Arc<str>>,
    closed: oneshot::Receiver<()>,
}

impl ConsumerSession {
    /// Opens a session with an outbound queue of `capacity` messages.
    pub(super) fn open(capacity: usize) -> (Self, SessionReceiver) {
        let (queue, queue_rx) = mpsc::channel(capacity);
        let (close, closed) = oneshot::channel();
        let session = Self {
            queue,
            registered_at: Timestamp::now(),
            _close: close,
        };
        (
            session,
            SessionReceiver {
                queue: queue_rx,
                closed,
            },
        )
    }

    pub(super) fn handle(&self, id: ConsumerId) -> SessionHandle {
        SessionHandle {
            id,
            registered_at: self.registered_at,
        }
    }
}

/// Drains one session's queue into its transport.
///
/// Exits when the registry entry is dropped or a write fails; a failed
/// write also removes the session from the hub. The transport is closed
/// exactly once, on exit.
pub(super) async fn deliver(
    hub: Weak<EventHub>,
    id: ConsumerId,
    receiver: SessionReceiver,
    mut transport: Box<dyn ConsumerTransport>,
) {
    let SessionReceiver {
        mut queue,
        mut closed,
    } = receiver;

    loop {
        let frame = tokio::select! {
            biased;
            _ = &mut closed => break,
            next = queue.recv() => match next {
                Some(frame) => frame,
                None => break,
            },
        };

        let sent = tokio::select! {
            biased;
            _ = &mut closed => break,
            result = transport.send(&frame) => result,
        };

        if let Err(e) = sent {
            tracing::debug!(session_id = %id, "Delivery failed, dropping session: {}", e);
            if let Some(hub) = hub.upgrade() {
                hub.remove(&id);
            }
            break;
        }
    }

    transport.close().await;
    tracing::debug!(session_id = %id, "Delivery task finished");
}
