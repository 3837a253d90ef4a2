//! ProducerAdapter port - uniform lifecycle for every upstream source.
//!
//! ```text
//!        ┌──────────┐  Ok   ┌──────────────────┐  stop / Err  ┌─────────────┐
//!  ───►  │ connect  │ ────► │ run(ctx)         │ ───────────► │ disconnect  │
//!        └──────────┘       │  emit(HubMessage)│              └─────────────┘
//!             │ Err         └──────────────────┘                     │
//!             ▼                                                      ▼
//!        backoff, retry ◄─────────────────────────────────── backoff, retry
//! ```
//!
//! The supervisor drives the loop; adapters only implement the three
//! steps.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;

use crate::domain::foundation::AdapterId;
use crate::domain::hub::HubMessage;

use super::{MessageSink, StatusReporter};

/// Errors surfaced by adapters to their supervisor.
#[derive(Debug, Clone, Error)]
pub enum AdapterError {
    /// Connection reset, refused or otherwise failed at the I/O level.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Credentials were rejected by the upstream.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The upstream sent something that cannot be interpreted at all.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// The upstream answered but has nothing to offer right now.
    #[error("source unavailable: {0}")]
    Unavailable(String),

    #[error("connection closed by peer")]
    Closed,

    #[error("not connected")]
    NotConnected,
}

impl AdapterError {
    pub fn transport(message: impl Into<String>) -> Self {
        AdapterError::Transport(message.into())
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        AdapterError::Authentication(message.into())
    }

    pub fn protocol(message: impl Into<String>) -> Self {
        AdapterError::Protocol(message.into())
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        AdapterError::Unavailable(message.into())
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, AdapterError::Authentication(_))
    }

    /// Failures recovered by reconnecting without operator action.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AdapterError::Transport(_)
                | AdapterError::Timeout(_)
                | AdapterError::Closed
                | AdapterError::Unavailable(_)
        )
    }
}

/// Everything an adapter's main loop is given by its supervisor.
#[derive(Clone)]
pub struct RunContext {
    sink: Arc<dyn MessageSink>,
    reporter: Arc<dyn StatusReporter>,
    stop: watch::Receiver<bool>,
}

impl RunContext {
    pub fn new(
        sink: Arc<dyn MessageSink>,
        reporter: Arc<dyn StatusReporter>,
        stop: watch::Receiver<bool>,
    ) -> Self {
        Self {
            sink,
            reporter,
            stop,
        }
    }

    /// Hands a message to the bound sink.
    pub fn emit(&self, message: HubMessage) {
        self.sink.emit(message);
    }

    pub fn sink(&self) -> Arc<dyn MessageSink> {
        Arc::clone(&self.sink)
    }

    pub fn reporter(&self) -> &dyn StatusReporter {
        self.reporter.as_ref()
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }

    /// Resolves once stop has been requested or the stop sender is gone.
    ///
    /// Borrows shared so it can be raced against work that also reads the
    /// context.
    pub async fn stopped(&self) {
        let mut stop = self.stop.clone();
        loop {
            if *stop.borrow_and_update() {
                return;
            }
            if stop.changed().await.is_err() {
                return;
            }
        }
    }

    /// A receiver for tasks spawned by the adapter.
    pub fn stop_signal(&self) -> watch::Receiver<bool> {
        self.stop.clone()
    }
}

/// One long-running upstream source.
///
/// `run` returns `Ok(())` only when stop was requested; any other exit is
/// an error and leads to a reconnect after backoff. `disconnect` must not
/// return before every task the adapter spawned has exited.
#[async_trait]
pub trait ProducerAdapter: Send {
    fn id(&self) -> &AdapterId;

    async fn connect(&mut self) -> Result<(), AdapterError>;

    async fn run(&mut self, ctx: &mut RunContext) -> Result<(), AdapterError>;

    async fn disconnect(&mut self) -> Result<(), AdapterError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::NoopStatusReporter;

    struct NullSink;

    impl MessageSink for NullSink {
        fn emit(&self, _message: HubMessage) {}
    }

    fn context() -> (watch::Sender<bool>, RunContext) {
        let (tx, rx) = watch::channel(false);
        let ctx = RunContext::new(Arc::new(NullSink), Arc::new(NoopStatusReporter), rx);
        (tx, ctx)
    }

    #[test]
    fn authentication_is_not_transient() {
        let err = AdapterError::authentication("bad token");
        assert!(err.is_authentication());
        assert!(!err.is_transient());
    }

    #[test]
    fn io_failures_are_transient() {
        assert!(AdapterError::transport("reset").is_transient());
        assert!(AdapterError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(AdapterError::Closed.is_transient());
        assert!(!AdapterError::protocol("garbage").is_transient());
    }

    #[tokio::test]
    async fn stopped_resolves_after_stop_is_sent() {
        let (tx, ctx) = context();
        assert!(!ctx.is_stopped());

        tx.send(true).unwrap();
        ctx.stopped().await;
        assert!(ctx.is_stopped());
    }

    #[tokio::test]
    async fn stopped_can_race_work_that_reads_the_context() {
        let (tx, ctx) = context();
        let work = async {
            ctx.emit(HubMessage::ping());
            std::future::pending::<()>().await
        };
        tx.send(true).unwrap();

        tokio::select! {
            _ = ctx.stopped() => {}
            _ = work => unreachable!(),
        }
    }

    #[tokio::test]
    async fn stopped_resolves_when_sender_is_dropped() {
        let (tx, ctx) = context();
        drop(tx);
        ctx.stopped().await;
    }
}
