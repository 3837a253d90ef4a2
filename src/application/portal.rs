//! Portal - assembles the hub, the status board and every enabled adapter.
//!
//! ```text
//!  AppConfig ──► build_adapters ──► AdapterSupervisor ──► HubIntake
//!                                                              │
//!                                   StatusBoard          HubDispatcher
//!                                                              │
//!                                                          EventHub ──► viewers
//! ```

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::adapters::agent::{AgentClient, AgentClientConfig, AgentStatusSource};
use crate::adapters::http::AppState;
use crate::adapters::obs::{ObsAdapter, ObsConfig};
use crate::adapters::poll::PollAdapter;
use crate::adapters::twitch::{
    EventSubAdapter, EventSubConfig, HelixClient, HelixConfig, TwitchChatAdapter, TwitchChatConfig,
};
use crate::adapters::websocket::{intake_channel, EventHub, EventHubConfig, HubIntake};
use crate::adapters::youtube::{YouTubeChatConfig, YouTubeChatSource};
use crate::config::{AppConfig, ValidationError};
use crate::domain::foundation::AdapterId;
use crate::ports::{MessageSink, ProducerAdapter};

use super::status_board::{StatusBoard, StatusBoardError};
use super::supervisor::{AdapterSupervisor, BackoffPolicy};

#[derive(Debug, Error)]
pub enum PortalError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("cannot build {adapter} adapter: {reason}")]
    Adapter { adapter: AdapterId, reason: String },

    #[error(transparent)]
    Status(#[from] StatusBoardError),

    #[error("shutdown did not complete within {0:?}")]
    ShutdownTimeout(Duration),
}

impl PortalError {
    fn adapter(adapter: AdapterId, reason: impl ToString) -> Self {
        PortalError::Adapter {
            adapter,
            reason: reason.to_string(),
        }
    }
}

/// A running hub with its adapters.
pub struct Portal {
    hub: Arc<EventHub>,
    board: Arc<StatusBoard>,
    supervisor: AdapterSupervisor,
    dispatcher_stop: watch::Sender<bool>,
    dispatcher: JoinHandle<()>,
}

impl Portal {
    /// Builds every enabled adapter and starts the dispatcher and the
    /// adapter tasks. Must be called from within a Tokio runtime.
    pub fn start(config: &AppConfig) -> Result<Self, PortalError> {
        let adapters = build_adapters(config)?;

        let hub = EventHub::new(EventHubConfig::default().with_queue_capacity(config.hub.queue_capacity));
        let (intake, dispatcher) = intake_channel(
            Arc::clone(&hub),
            config.hub.intake_capacity,
            config.hub.ping_interval(),
        );
        let (dispatcher_stop, stop_rx) = watch::channel(false);
        let dispatcher = tokio::spawn(dispatcher.run(stop_rx));

        let board = StatusBoard::new();
        let mut supervisor = AdapterSupervisor::new(BackoffPolicy::new(
            config.supervisor.reconnect_delay(),
            config.supervisor.max_reconnect_delay(),
        ));
        spawn_all(&mut supervisor, &board, &intake, adapters)?;

        tracing::info!(adapters = supervisor.len(), "Portal started");

        Ok(Self {
            hub,
            board,
            supervisor,
            dispatcher_stop,
            dispatcher,
        })
    }

    pub fn hub(&self) -> Arc<EventHub> {
        Arc::clone(&self.hub)
    }

    pub fn board(&self) -> Arc<StatusBoard> {
        Arc::clone(&self.board)
    }

    /// State for [`crate::adapters::http::build_router`].
    pub fn app_state(&self) -> AppState {
        AppState::new(self.hub(), self.board())
    }

    pub fn adapter_count(&self) -> usize {
        self.supervisor.len()
    }

    /// Stops every adapter, then the dispatcher, then closes all viewer
    /// sessions.
    pub async fn shutdown(self, timeout: Duration) -> Result<(), PortalError> {
        let Self {
            hub,
            supervisor,
            dispatcher_stop,
            dispatcher,
            ..
        } = self;

        let sequence = async move {
            supervisor.shutdown().await;
            dispatcher_stop.send_replace(true);
            if let Err(e) = dispatcher.await {
                tracing::error!("Hub dispatcher failed: {}", e);
            }
            hub.shutdown().await;
        };

        match tokio::time::timeout(timeout, sequence).await {
            Ok(()) => {
                tracing::info!("Portal stopped");
                Ok(())
            }
            Err(_) => Err(PortalError::ShutdownTimeout(timeout)),
        }
    }
}

fn spawn_all(
    supervisor: &mut AdapterSupervisor,
    board: &Arc<StatusBoard>,
    intake: &HubIntake,
    adapters: Vec<Box<dyn ProducerAdapter>>,
) -> Result<(), PortalError> {
    for adapter in adapters {
        let reporter = board.register(adapter.id().clone())?;
        let sink: Arc<dyn MessageSink> = Arc::new(intake.clone());
        supervisor.spawn(adapter, sink, reporter);
    }
    Ok(())
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, ValidationError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or(ValidationError::MissingRequired(field))
}

/// Creates one adapter per enabled source, in a fixed order.
pub fn build_adapters(config: &AppConfig) -> Result<Vec<Box<dyn ProducerAdapter>>, PortalError> {
    let mut adapters: Vec<Box<dyn ProducerAdapter>> = Vec::new();

    if config.agent.enabled {
        let agent = &config.agent;
        let client = AgentClient::new(AgentClientConfig::new(&agent.url).with_timeout(agent.timeout()))
            .map_err(|e| PortalError::adapter(AdapterId::agent(), e))?;
        let source = AgentStatusSource::new(client, agent.polling_interval());
        adapters.push(Box::new(PollAdapter::new(source)));
    }

    if config.obs.enabled {
        let obs = &config.obs;
        let adapter = ObsAdapter::new(
            ObsConfig::new(&obs.host, obs.port)
                .with_password(obs.password.clone())
                .with_keepalive(obs.keepalive())
                .with_connect_timeout(obs.connect_timeout()),
        );
        adapters.push(Box::new(adapter));
    }

    if config.twitch.enabled {
        let twitch = &config.twitch;
        let channel = required(&twitch.channel, "twitch.channel")?;
        let token = required(&twitch.oauth_token, "twitch.oauth_token")?;

        let chat = TwitchChatAdapter::new(
            TwitchChatConfig::new(channel, token)
                .with_url(&twitch.irc_url)
                .with_heartbeat(twitch.heartbeat())
                .with_auth_timeout(twitch.auth_timeout()),
        );
        adapters.push(Box::new(chat));

        let subscriptions = twitch.subscription_types()?;
        if subscriptions.is_empty() {
            tracing::info!("No EventSub subscriptions configured, skipping EventSub");
        } else {
            let client_id = required(&twitch.client_id, "twitch.client_id")?;
            let helix = HelixClient::new(HelixConfig::new(client_id, token).with_base_url(&twitch.helix_url))
                .map_err(|e| PortalError::adapter(AdapterId::twitch_eventsub(), e))?;
            let eventsub = EventSubAdapter::new(
                EventSubConfig::new(channel)
                    .with_url(&twitch.eventsub_url)
                    .with_subscriptions(subscriptions),
                Arc::new(helix),
            );
            adapters.push(Box::new(eventsub));
        }
    }

    if config.youtube.enabled {
        let youtube = &config.youtube;
        let api_key = required(&youtube.api_key, "youtube.api_key")?;
        let source = YouTubeChatSource::new(
            YouTubeChatConfig::new(api_key)
                .with_base_url(&youtube.api_base_url)
                .with_channel_id(youtube.channel_id.clone())
                .with_live_chat_id(youtube.live_chat_id.clone())
                .with_default_interval(youtube.default_poll_interval()),
        )
        .map_err(|e| PortalError::adapter(AdapterId::youtube_chat(), e))?;
        adapters.push(Box::new(PollAdapter::new(source)));
    }

    Ok(adapters)
}
