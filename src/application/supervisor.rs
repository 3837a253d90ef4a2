//! AdapterSupervisor - Background service running every producer adapter.
//!
//! Each adapter gets its own task looping Connect → Run → Disconnect. After
//! a failure the task waits out an exponential backoff and connects again.
//!
//! ## Backoff
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `initial` | 5s | Wait after the first failure |
//! | `max` | 60s | Cap for the doubling wait |
//!
//! The wait resets to `initial` after every successful connect.
//!
//! ## Graceful Shutdown
//!
//! One stop signal is shared by every adapter task. It interrupts both a
//! running adapter and a backoff wait; [`AdapterSupervisor::join_all`]
//! returns once every task has disconnected its adapter and exited, even
//! when stop arrived mid-connect.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::domain::adapter::AdapterStatus;
use crate::domain::foundation::AdapterId;
use crate::ports::{AdapterError, MessageSink, ProducerAdapter, RunContext, StatusReporter};

/// Reconnect delays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub initial: Duration,
    pub max: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            initial: Duration::from_secs(5),
            max: Duration::from_secs(60),
        }
    }
}

impl BackoffPolicy {
    pub fn new(initial: Duration, max: Duration) -> Self {
        Self {
            initial,
            max: max.max(initial),
        }
    }

    /// Delay following `current`.
    pub fn next(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.max)
    }
}

/// Owns the adapter tasks and their shared stop signal.
pub struct AdapterSupervisor {
    policy: BackoffPolicy,
    stop: watch::Sender<bool>,
    tasks: Vec<(AdapterId, JoinHandle<()>)>,
}

impl AdapterSupervisor {
    pub fn new(policy: BackoffPolicy) -> Self {
        let (stop, _) = watch::channel(false);
        Self {
            policy,
            stop,
            tasks: Vec::new(),
        }
    }

    /// Starts supervising `adapter` on its own task.
    pub fn spawn(
        &mut self,
        adapter: Box<dyn ProducerAdapter>,
        sink: Arc<dyn MessageSink>,
        reporter: Arc<dyn StatusReporter>,
    ) {
        let id = adapter.id().clone();
        let ctx = RunContext::new(sink, reporter, self.stop.subscribe());
        let handle = tokio::spawn(supervise(adapter, ctx, self.policy));
        tracing::info!(adapter = %id, "Adapter started");
        self.tasks.push((id, handle));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn adapters(&self) -> impl Iterator<Item = &AdapterId> {
        self.tasks.iter().map(|(id, _)| id)
    }

    /// Signals every adapter task to stop.
    pub fn stop(&self) {
        self.stop.send_replace(true);
    }

    /// Waits for every adapter task to exit.
    pub async fn join_all(self) {
        for (id, handle) in self.tasks {
            if let Err(e) = handle.await {
                tracing::error!(adapter = %id, "Adapter task failed: {}", e);
            }
        }
    }

    /// Stops and joins every adapter task.
    pub async fn shutdown(self) {
        self.stop();
        self.join_all().await;
    }
}

async fn supervise(mut adapter: Box<dyn ProducerAdapter>, mut ctx: RunContext, policy: BackoffPolicy) {
    let id = adapter.id().clone();
    let mut delay = policy.initial;

    loop {
        if ctx.is_stopped() {
            break;
        }

        ctx.reporter().set_status(AdapterStatus::Connecting);
        let connected = tokio::select! {
            biased;
            _ = ctx.stopped() => None,
            result = adapter.connect() => Some(result),
        };
        let Some(connected) = connected else {
            // Release whatever the interrupted connect acquired.
            release(adapter.as_mut(), &id).await;
            break;
        };

        let outcome = match connected {
            Ok(()) => {
                tracing::info!(adapter = %id, "Adapter connected");
                delay = policy.initial;
                adapter.run(&mut ctx).await
            }
            Err(e) => Err(e),
        };

        release(adapter.as_mut(), &id).await;

        match outcome {
            Ok(()) if ctx.is_stopped() => break,
            Ok(()) => {
                tracing::info!(adapter = %id, "Adapter finished; reconnecting");
                ctx.reporter().set_status(AdapterStatus::Disconnected);
            }
            Err(e) => report_failure(&id, &ctx, &e, delay),
        }

        tokio::select! {
            biased;
            _ = ctx.stopped() => break,
            _ = tokio::time::sleep(delay) => {}
        }
        delay = policy.next(delay);
    }

    ctx.reporter().set_status(AdapterStatus::Disconnected);
    tracing::info!(adapter = %id, "Adapter stopped");
}

async fn release(adapter: &mut dyn ProducerAdapter, id: &AdapterId) {
    if let Err(e) = adapter.disconnect().await {
        tracing::debug!(adapter = %id, "Disconnect failed: {}", e);
    }
}

fn report_failure(id: &AdapterId, ctx: &RunContext, error: &AdapterError, retry_in: Duration) {
    ctx.reporter().record_error(&error.to_string());
    if error.is_authentication() {
        tracing::error!(adapter = %id, retry_secs = retry_in.as_secs(), "Authentication failed: {}", error);
        ctx.reporter().set_status(AdapterStatus::Degraded);
    } else {
        tracing::warn!(adapter = %id, retry_secs = retry_in.as_secs(), "Adapter failed: {}", error);
        ctx.reporter().set_status(AdapterStatus::Disconnected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::in_memory::CollectingSink;
    use crate::application::StatusBoard;
    use crate::domain::hub::{HubMessage, MessageKind};
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Counters {
        connects: AtomicUsize,
        runs: AtomicUsize,
        disconnects: AtomicUsize,
    }

    /// Fails `connect` a fixed number of times, then emits once per run
    /// and fails the run.
    struct FlakyAdapter {
        id: AdapterId,
        failing_connects: usize,
        auth_failure: bool,
        counters: Arc<Counters>,
    }

    #[async_trait]
    impl ProducerAdapter for FlakyAdapter {
        fn id(&self) -> &AdapterId {
            &self.id
        }

        async fn connect(&mut self) -> Result<(), AdapterError> {
            let n = self.counters.connects.fetch_add(1, Ordering::SeqCst);
            if n < self.failing_connects {
                if self.auth_failure {
                    return Err(AdapterError::authentication("bad token"));
                }
                return Err(AdapterError::transport("refused"));
            }
            Ok(())
        }

        async fn run(&mut self, ctx: &mut RunContext) -> Result<(), AdapterError> {
            self.counters.runs.fetch_add(1, Ordering::SeqCst);
            ctx.reporter().set_status(AdapterStatus::Connected);
            ctx.emit(HubMessage::from_value(
                MessageKind::AgentStatus,
                self.id.clone(),
                json!({ "run": true }),
            ));
            Err(AdapterError::Closed)
        }

        async fn disconnect(&mut self) -> Result<(), AdapterError> {
            self.counters.disconnects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Runs until stopped.
    struct SteadyAdapter {
        id: AdapterId,
        counters: Arc<Counters>,
    }

    #[async_trait]
    impl ProducerAdapter for SteadyAdapter {
        fn id(&self) -> &AdapterId {
            &self.id
        }

        async fn connect(&mut self) -> Result<(), AdapterError> {
            self.counters.connects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn run(&mut self, ctx: &mut RunContext) -> Result<(), AdapterError> {
            self.counters.runs.fetch_add(1, Ordering::SeqCst);
            ctx.reporter().set_status(AdapterStatus::Connected);
            ctx.stopped().await;
            Ok(())
        }

        async fn disconnect(&mut self) -> Result<(), AdapterError> {
            self.counters.disconnects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Never finishes connecting.
    struct HangingConnectAdapter {
        id: AdapterId,
        counters: Arc<Counters>,
    }

    #[async_trait]
    impl ProducerAdapter for HangingConnectAdapter {
        fn id(&self) -> &AdapterId {
            &self.id
        }

        async fn connect(&mut self) -> Result<(), AdapterError> {
            self.counters.connects.fetch_add(1, Ordering::SeqCst);
            std::future::pending().await
        }

        async fn run(&mut self, _ctx: &mut RunContext) -> Result<(), AdapterError> {
            self.counters.runs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn disconnect(&mut self) -> Result<(), AdapterError> {
            self.counters.disconnects.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn fast_policy() -> BackoffPolicy {
        BackoffPolicy::new(Duration::from_millis(5), Duration::from_millis(20))
    }

    #[test]
    fn backoff_doubles_up_to_cap() {
        let policy = BackoffPolicy::new(Duration::from_secs(5), Duration::from_secs(60));
        let mut delay = policy.initial;
        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(delay.as_secs());
            delay = policy.next(delay);
        }
        assert_eq!(seen, vec![5, 10, 20, 40, 60, 60]);
    }

    #[test]
    fn cap_never_below_initial() {
        let policy = BackoffPolicy::new(Duration::from_secs(10), Duration::from_secs(1));
        assert_eq!(policy.max, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn reconnects_after_failures() {
        let counters = Arc::new(Counters::default());
        let sink = CollectingSink::new();
        let board = StatusBoard::new();
        let reporter = board.register(AdapterId::agent()).unwrap();

        let mut supervisor = AdapterSupervisor::new(fast_policy());
        supervisor.spawn(
            Box::new(FlakyAdapter {
                id: AdapterId::agent(),
                failing_connects: 2,
                auth_failure: false,
                counters: counters.clone(),
            }),
            sink.clone(),
            reporter,
        );

        tokio::time::timeout(Duration::from_secs(2), sink.wait_for(2))
            .await
            .unwrap();
        supervisor.shutdown().await;

        assert!(counters.connects.load(Ordering::SeqCst) >= 4);
        assert!(counters.runs.load(Ordering::SeqCst) >= 2);
        // Disconnect follows every connect attempt.
        assert_eq!(
            counters.disconnects.load(Ordering::SeqCst),
            counters.connects.load(Ordering::SeqCst)
        );
        assert_eq!(
            board.get(&AdapterId::agent()).unwrap().status(),
            AdapterStatus::Disconnected
        );
    }

    #[tokio::test]
    async fn authentication_failure_marks_degraded() {
        let counters = Arc::new(Counters::default());
        let board = StatusBoard::new();
        let reporter = board.register(AdapterId::twitch_chat()).unwrap();

        let mut supervisor = AdapterSupervisor::new(BackoffPolicy::new(
            Duration::from_secs(30),
            Duration::from_secs(30),
        ));
        supervisor.spawn(
            Box::new(FlakyAdapter {
                id: AdapterId::twitch_chat(),
                failing_connects: usize::MAX,
                auth_failure: true,
                counters: counters.clone(),
            }),
            CollectingSink::new(),
            reporter,
        );

        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let state = board.get(&AdapterId::twitch_chat()).unwrap();
            if state.status() == AdapterStatus::Degraded {
                assert_eq!(state.last_error(), Some("authentication failed: bad token"));
                break;
            }
            assert!(tokio::time::Instant::now() < deadline, "never degraded");
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        // Stop interrupts the 30s backoff wait.
        tokio::time::timeout(Duration::from_secs(1), supervisor.shutdown())
            .await
            .unwrap();
        assert_eq!(counters.connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stop_during_connect_still_disconnects() {
        let counters = Arc::new(Counters::default());
        let board = StatusBoard::new();
        let reporter = board.register(AdapterId::obs()).unwrap();

        let mut supervisor = AdapterSupervisor::new(fast_policy());
        supervisor.spawn(
            Box::new(HangingConnectAdapter {
                id: AdapterId::obs(),
                counters: counters.clone(),
            }),
            CollectingSink::new(),
            reporter,
        );

        while counters.connects.load(Ordering::SeqCst) < 1 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        tokio::time::timeout(Duration::from_secs(1), supervisor.shutdown())
            .await
            .unwrap();

        assert_eq!(counters.runs.load(Ordering::SeqCst), 0);
        assert_eq!(counters.disconnects.load(Ordering::SeqCst), 1);
        assert_eq!(
            board.get(&AdapterId::obs()).unwrap().status(),
            AdapterStatus::Disconnected
        );
    }

    #[tokio::test]
    async fn stop_ends_running_adapters() {
        let counters = Arc::new(Counters::default());
        let board = StatusBoard::new();
        let mut supervisor = AdapterSupervisor::new(fast_policy());

        for id in [AdapterId::obs(), AdapterId::youtube_chat()] {
            let reporter = board.register(id.clone()).unwrap();
            supervisor.spawn(
                Box::new(SteadyAdapter {
                    id,
                    counters: counters.clone(),
                }),
                CollectingSink::new(),
                reporter,
            );
        }
        assert_eq!(supervisor.len(), 2);

        while counters.runs.load(Ordering::SeqCst) < 2 {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        tokio::time::timeout(Duration::from_secs(1), supervisor.shutdown())
            .await
            .unwrap();

        assert_eq!(counters.connects.load(Ordering::SeqCst), 2);
        assert_eq!(counters.disconnects.load(Ordering::SeqCst), 2);
        assert!(board
            .snapshot()
            .iter()
            .all(|s| s.status() == AdapterStatus::Disconnected));
    }
}
