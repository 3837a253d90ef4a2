//! Keepalive sub-task.

use std::future::Future;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::ports::AdapterError;

/// Periodic task that runs `beat` until stopped or a beat fails.
///
/// The first beat fires one `period` after spawning.
pub struct Heartbeat {
    handle: JoinHandle<()>,
}

impl Heartbeat {
    /// Spawns the task.
    ///
    /// # Arguments
    ///
    /// * `period` - Time between beats
    /// * `stop` - Connection stop signal; `true` or a dropped sender ends the task
    /// * `beat` - Produces one keepalive write per call
    pub fn spawn<F, Fut>(period: Duration, mut stop: watch::Receiver<bool>, mut beat: F) -> Self
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), AdapterError>> + Send + 'static,
    {
        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;

                    changed = stop.changed() => {
                        if changed.is_err() || *stop.borrow() {
                            break;
                        }
                    }

                    _ = ticker.tick() => {
                        if let Err(e) = beat().await {
                            tracing::debug!("Heartbeat stopped: {}", e);
                            break;
                        }
                    }
                }
            }
        });

        Self { handle }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the task to exit.
    pub async fn join(self) {
        if let Err(e) = self.handle.await {
            tracing::warn!("Heartbeat task ended abnormally: {}", e);
        }
    }
}
