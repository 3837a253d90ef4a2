//! PollAdapter - drives a [`PollSource`] on an interval.

use std::time::Duration;

use async_trait::async_trait;

use crate::domain::adapter::{AdapterSession, AdapterStatus};
use crate::domain::foundation::{AdapterId, Timestamp};
use crate::ports::{AdapterError, PollSource, ProducerAdapter, RunContext};

/// Poll-shaped producer.
///
/// A failed fetch marks the adapter degraded and polling continues on the
/// current interval. Only authentication failures end `run`.
pub struct PollAdapter<S> {
    source: S,
    interval: Duration,
}

impl<S: PollSource> PollAdapter<S> {
    pub fn new(source: S) -> Self {
        let interval = source.default_interval();
        Self { source, interval }
    }

    /// Interval that will be waited before the next fetch.
    pub fn current_interval(&self) -> Duration {
        self.interval
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Runs a single fetch, emitting its messages.
    ///
    /// Returns the number of messages emitted.
    pub async fn poll_once(&mut self, ctx: &RunContext) -> Result<usize, AdapterError> {
        let outcome = self.source.fetch().await?;
        let emitted = outcome.messages.len();
        for message in outcome.messages {
            ctx.emit(message);
        }

        if let Some(next) = outcome.next_interval.filter(|d| !d.is_zero()) {
            if next != self.interval {
                tracing::debug!(
                    adapter = %self.source.id(),
                    interval_ms = next.as_millis() as u64,
                    "Adopting upstream poll interval"
                );
            }
            self.interval = next;
        }

        Ok(emitted)
    }
}

#[async_trait]
impl<S: PollSource> ProducerAdapter for PollAdapter<S> {
    fn id(&self) -> &AdapterId {
        self.source.id()
    }

    async fn connect(&mut self) -> Result<(), AdapterError> {
        self.interval = self.source.default_interval();
        self.source.prepare().await
    }

    async fn run(&mut self, ctx: &mut RunContext) -> Result<(), AdapterError> {
        loop {
            let result = tokio::select! {
                biased;
                _ = ctx.stopped() => return Ok(()),
                result = self.poll_once(ctx) => result,
            };

            match result {
                Ok(_) => {
                    ctx.reporter().set_status(AdapterStatus::Connected);
                    ctx.reporter().set_session(AdapterSession::Poll {
                        last_success: Some(Timestamp::now()),
                        interval_ms: self.interval.as_millis() as u64,
                    });
                }
                Err(e) if e.is_authentication() => return Err(e),
                Err(e) => {
                    tracing::warn!(adapter = %self.source.id(), "Poll failed: {}", e);
                    ctx.reporter().record_error(&e.to_string());
                    ctx.reporter().set_status(AdapterStatus::Degraded);
                }
            }

            tokio::select! {
                biased;
                _ = ctx.stopped() => return Ok(()),
                _ = tokio::time::sleep(self.interval) => {}
            }
        }
    }

    async fn disconnect(&mut self) -> Result<(), AdapterError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory::CollectingSink;
    use crate::domain::hub::{HubMessage, MessageKind};
    use crate::ports::{NoopStatusReporter, PollOutcome};
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use tokio::sync::watch;

    struct ScriptedSource {
        id: AdapterId,
        responses: VecDeque<Result<PollOutcome, AdapterError>>,
        fetches: usize,
    }

    impl ScriptedSource {
        fn new(responses: Vec<Result<PollOutcome, AdapterError>>) -> Self {
            Self {
                id: AdapterId::agent(),
                responses: responses.into(),
                fetches: 0,
            }
        }
    }

    #[async_trait]
    impl PollSource for ScriptedSource {
        fn id(&self) -> &AdapterId {
            &self.id
        }

        fn default_interval(&self) -> Duration {
            Duration::from_millis(5)
        }

        async fn fetch(&mut self) -> Result<PollOutcome, AdapterError> {
            self.fetches += 1;
            self.responses
                .pop_front()
                .unwrap_or_else(|| Ok(PollOutcome::default()))
        }
    }

    fn message(n: u32) -> HubMessage {
        HubMessage::from_value(MessageKind::AgentStatus, AdapterId::agent(), json!(n))
    }

    fn context(sink: Arc<CollectingSink>) -> (watch::Sender<bool>, RunContext) {
        let (tx, rx) = watch::channel(false);
        (tx, RunContext::new(sink, Arc::new(NoopStatusReporter), rx))
    }

    #[tokio::test]
    async fn poll_once_emits_every_message() {
        let sink = CollectingSink::new();
        let (_tx, ctx) = context(sink.clone());
        let mut adapter = PollAdapter::new(ScriptedSource::new(vec![Ok(PollOutcome::new(
            vec![message(1), message(2)],
        ))]));

        assert_eq!(adapter.poll_once(&ctx).await.unwrap(), 2);
        assert_eq!(sink.len(), 2);
    }

    #[tokio::test]
    async fn server_interval_overrides_default() {
        let sink = CollectingSink::new();
        let (_tx, ctx) = context(sink);
        let mut adapter = PollAdapter::new(ScriptedSource::new(vec![Ok(
            PollOutcome::default().with_next_interval(Some(Duration::from_millis(1500))),
        )]));

        adapter.poll_once(&ctx).await.unwrap();
        assert_eq!(adapter.current_interval(), Duration::from_millis(1500));

        // Absent hint keeps the last dictated interval.
        adapter.poll_once(&ctx).await.unwrap();
        assert_eq!(adapter.current_interval(), Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn connect_resets_interval_to_default() {
        let sink = CollectingSink::new();
        let (_tx, ctx) = context(sink);
        let mut adapter = PollAdapter::new(ScriptedSource::new(vec![Ok(
            PollOutcome::default().with_next_interval(Some(Duration::from_secs(9))),
        )]));
        adapter.poll_once(&ctx).await.unwrap();

        adapter.connect().await.unwrap();
        assert_eq!(adapter.current_interval(), Duration::from_millis(5));
    }

    #[tokio::test]
    async fn run_survives_transient_failures() {
        let sink = CollectingSink::new();
        let (tx, mut ctx) = context(sink.clone());
        let mut adapter = PollAdapter::new(ScriptedSource::new(vec![
            Err(AdapterError::unavailable("agent down")),
            Ok(PollOutcome::new(vec![message(7)])),
        ]));

        let run = tokio::spawn(async move {
            let result = adapter.run(&mut ctx).await;
            (adapter, result)
        });
        tokio::time::timeout(Duration::from_secs(1), sink.wait_for(1))
            .await
            .unwrap();
        tx.send(true).unwrap();

        let (adapter, result) = run.await.unwrap();
        assert!(result.is_ok());
        assert!(adapter.source().fetches >= 2);
        assert_eq!(sink.messages()[0].payload(), &json!(7));
    }

    struct StalledSource(AdapterId);

    #[async_trait]
    impl PollSource for StalledSource {
        fn id(&self) -> &AdapterId {
            &self.0
        }

        fn default_interval(&self) -> Duration {
            Duration::from_millis(5)
        }

        async fn fetch(&mut self) -> Result<PollOutcome, AdapterError> {
            std::future::pending().await
        }
    }

    #[tokio::test]
    async fn stop_interrupts_a_fetch_in_flight() {
        let sink = CollectingSink::new();
        let (tx, mut ctx) = context(sink.clone());
        let mut adapter = PollAdapter::new(StalledSource(AdapterId::youtube_chat()));

        let run = tokio::spawn(async move { adapter.run(&mut ctx).await });
        tokio::time::sleep(Duration::from_millis(20)).await;
        tx.send(true).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(1), run)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
        assert!(sink.is_empty());
    }

    #[tokio::test]
    async fn run_ends_on_authentication_failure() {
        let sink = CollectingSink::new();
        let (_tx, mut ctx) = context(sink);
        let mut adapter = PollAdapter::new(ScriptedSource::new(vec![Err(
            AdapterError::authentication("bad key"),
        )]));

        let result = adapter.run(&mut ctx).await;
        assert!(result.unwrap_err().is_authentication());
    }
}
