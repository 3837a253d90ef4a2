//! Hub intake - the [`MessageSink`] adapters are bound to.
//!
//! Adapters emit into a bounded channel; a single dispatcher task drains
//! it into [`EventHub::broadcast`] and also sends the periodic liveness
//! `ping`. Emitting never waits: when the intake is full the message is
//! dropped, consistent with at-most-once delivery.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::{self, Instant};

use crate::domain::hub::HubMessage;
use crate::ports::MessageSink;

use super::hub::EventHub;

/// Cloneable emit handle bound to the hub.
#[derive(Clone)]
pub struct HubIntake {
    tx: mpsc::Sender<HubMessage>,
}

impl MessageSink for HubIntake {
    fn emit(&self, message: HubMessage) {
        match self.tx.try_send(message) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(message)) => {
                tracing::warn!(
                    kind = %message.kind(),
                    origin = %message.origin(),
                    "Hub intake full, dropping message"
                );
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!("Hub intake closed, dropping message");
            }
        }
    }
}

/// Task moving messages from the intake into the hub.
pub struct HubDispatcher {
    hub: Arc<EventHub>,
    intake: mpsc::Receiver<HubMessage>,
    ping_interval: Duration,
}

/// Creates a bound intake/dispatcher pair for `hub`.
pub fn intake_channel(
    hub: Arc<EventHub>,
    capacity: usize,
    ping_interval: Duration,
) -> (HubIntake, HubDispatcher) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (
        HubIntake { tx },
        HubDispatcher {
            hub,
            intake: rx,
            ping_interval,
        },
    )
}

impl HubDispatcher {
    /// Runs until shutdown is signalled or every intake handle is dropped.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ping = time::interval_at(Instant::now() + self.ping_interval, self.ping_interval);
        ping.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }

                next = self.intake.recv() => match next {
                    Some(message) => {
                        let report = self.hub.broadcast(message);
                        if report.dropped > 0 {
                            tracing::debug!(dropped = report.dropped, "Dropped stalled consumers");
                        }
                    }
                    None => break,
                },

                _ = ping.tick() => {
                    self.hub.broadcast(HubMessage::ping());
                }
            }
        }

        tracing::debug!("Hub dispatcher stopped");
    }
}
