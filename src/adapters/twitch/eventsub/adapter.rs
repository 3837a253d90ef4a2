//! EventSubAdapter - drives a [`SubscriptionMachine`] over a live socket.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use tokio_tungstenite::tungstenite::{self, Message};

use crate::adapters::stream::{self, map_ws_error, WsStream};
use crate::domain::adapter::{AdapterSession, AdapterStatus};
use crate::domain::foundation::AdapterId;
use crate::domain::hub::{EventSource, HubMessage, MessageKind};
use crate::domain::subscription::{SubscriptionPhase, SubscriptionType};
use crate::ports::{
    AdapterError, ControlError, ProducerAdapter, RunContext, SubscriptionControl,
    SubscriptionOutcome, SubscriptionRequest,
};

use super::{Action, Frame, SubscriptionMachine};

/// Settings for the EventSub connection.
#[derive(Debug, Clone)]
pub struct EventSubConfig {
    pub url: String,
    /// Broadcaster login; resolved to a user id once.
    pub channel: String,
    pub subscriptions: Vec<SubscriptionType>,
    pub connect_timeout: Duration,
    /// Deadline for a welcome after a socket opens.
    pub welcome_timeout: Duration,
    /// Slack added to the server's keepalive window.
    pub keepalive_grace: Duration,
}

impl EventSubConfig {
    pub fn new(channel: impl AsRef<str>) -> Self {
        Self {
            url: "wss://eventsub.wss.twitch.tv/ws".to_string(),
            channel: channel.as_ref().trim_start_matches('#').to_ascii_lowercase(),
            subscriptions: SubscriptionType::ALL.to_vec(),
            connect_timeout: Duration::from_secs(10),
            welcome_timeout: Duration::from_secs(10),
            keepalive_grace: Duration::from_secs(5),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_subscriptions(mut self, subscriptions: Vec<SubscriptionType>) -> Self {
        self.subscriptions = subscriptions;
        self
    }

    pub fn with_welcome_timeout(mut self, timeout: Duration) -> Self {
        self.welcome_timeout = timeout;
        self
    }

    pub fn with_keepalive_grace(mut self, grace: Duration) -> Self {
        self.keepalive_grace = grace;
        self
    }
}

/// Which socket a frame came from.
enum Inbound {
    Current(Result<Option<Result<Message, tungstenite::Error>>, tokio::time::error::Elapsed>),
    Retiring(Option<Result<Message, tungstenite::Error>>),
}

async fn next_retiring(
    socket: Option<&mut WsStream>,
) -> Option<Result<Message, tungstenite::Error>> {
    match socket {
        Some(socket) => socket.next().await,
        None => std::future::pending().await,
    }
}

async fn close_socket(mut socket: WsStream) {
    if let Err(e) = socket.close(None).await {
        tracing::trace!("Closing EventSub socket: {}", e);
    }
}

/// Twitch EventSub producer.
pub struct EventSubAdapter {
    id: AdapterId,
    config: EventSubConfig,
    control: Arc<dyn SubscriptionControl>,
    machine: SubscriptionMachine,
    broadcaster_id: Option<String>,
    socket: Option<WsStream>,
}

impl EventSubAdapter {
    pub fn new(config: EventSubConfig, control: Arc<dyn SubscriptionControl>) -> Self {
        Self {
            id: AdapterId::twitch_eventsub(),
            config,
            control,
            machine: SubscriptionMachine::new(),
            broadcaster_id: None,
            socket: None,
        }
    }

    pub fn phase(&self) -> SubscriptionPhase {
        self.machine.phase()
    }

    pub fn broadcaster_id(&self) -> Option<&str> {
        self.broadcaster_id.as_deref()
    }

    /// How long the current socket may stay silent.
    fn read_deadline(&self) -> Option<Duration> {
        if self.machine.phase().accepts_welcome() {
            return Some(self.config.welcome_timeout);
        }
        self.machine
            .session()
            .and_then(|session| session.keepalive_timeout())
            .map(|timeout| timeout + self.config.keepalive_grace)
    }

    async fn establish(&mut self) -> Result<(), AdapterError> {
        if self.broadcaster_id.is_none() {
            let id = self.control.resolve_user_id(&self.config.channel).await?;
            tracing::info!(adapter = %self.id, broadcaster_id = %id, "Resolved broadcaster");
            self.broadcaster_id = Some(id);
        }

        let socket = stream::connect(&self.config.url, self.config.connect_timeout).await?;
        self.socket = Some(socket);
        self.machine.opened();
        Ok(())
    }

    async fn create_subscriptions(&self, session_id: &str) -> Result<(), AdapterError> {
        let broadcaster_id = self
            .broadcaster_id
            .clone()
            .ok_or(AdapterError::NotConnected)?;

        for kind in &self.config.subscriptions {
            let request = SubscriptionRequest {
                kind: *kind,
                broadcaster_id: broadcaster_id.clone(),
                session_id: session_id.to_string(),
            };

            match self.control.create_subscription(&request).await {
                Ok(SubscriptionOutcome::Accepted) => {
                    tracing::info!(adapter = %self.id, subscription = %kind, "Subscription created");
                }
                Ok(SubscriptionOutcome::Rejected { status, reason }) => {
                    tracing::warn!(
                        adapter = %self.id,
                        subscription = %kind,
                        status,
                        "Subscription rejected: {}",
                        reason
                    );
                }
                Err(ControlError::Unauthorized) => return Err(ControlError::Unauthorized.into()),
                Err(e) => {
                    tracing::warn!(adapter = %self.id, subscription = %kind, "Subscription failed: {}", e);
                }
            }
        }
        Ok(())
    }

    /// Applies one text frame. Returns a replacement socket when the
    /// server asked for a reconnect.
    async fn apply(
        &mut self,
        text: &str,
        ctx: &RunContext,
    ) -> Result<Option<AppliedAction>, AdapterError> {
        let frame = match Frame::parse(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(adapter = %self.id, "Malformed EventSub frame: {}", e);
                return Ok(None);
            }
        };

        match self.machine.handle(frame) {
            Action::CreateSubscriptions { session_id } => {
                tracing::info!(adapter = %self.id, session_id = %session_id, "Session welcomed");
                self.create_subscriptions(&session_id).await?;
                ctx.reporter().set_status(AdapterStatus::Connected);
                ctx.reporter()
                    .set_session(AdapterSession::Subscription { session_id });
                Ok(None)
            }
            Action::Emit(event) => {
                match HubMessage::new(
                    MessageKind::SubscriptionEvent(EventSource::Twitch),
                    self.id.clone(),
                    &event,
                ) {
                    Ok(message) => ctx.emit(message),
                    Err(e) => tracing::warn!(adapter = %self.id, "Dropping event: {}", e),
                }
                Ok(None)
            }
            Action::Reconnect { url } => {
                tracing::info!(adapter = %self.id, "Server requested reconnect");
                let socket = stream::connect(&url, self.config.connect_timeout).await?;
                Ok(Some(AppliedAction::Replace(socket)))
            }
            Action::ReconnectComplete { session_id } => {
                tracing::info!(adapter = %self.id, session_id = %session_id, "Reconnected");
                ctx.reporter()
                    .set_session(AdapterSession::Subscription { session_id });
                Ok(Some(AppliedAction::RetireOld))
            }
            Action::Revoked {
                subscription_type,
                status,
            } => {
                tracing::warn!(
                    adapter = %self.id,
                    subscription = %subscription_type,
                    status = %status,
                    "Subscription revoked"
                );
                ctx.reporter()
                    .record_error(&format!("{} revoked: {}", subscription_type, status));
                ctx.reporter().set_status(AdapterStatus::Degraded);
                Ok(None)
            }
            Action::Ignore => Ok(None),
        }
    }
}

enum AppliedAction {
    Replace(WsStream),
    RetireOld,
}

#[async_trait]
impl ProducerAdapter for EventSubAdapter {
    fn id(&self) -> &AdapterId {
        &self.id
    }

    async fn connect(&mut self) -> Result<(), AdapterError> {
        self.machine.connecting();
        if let Err(e) = self.establish().await {
            self.machine.reset();
            return Err(e);
        }
        Ok(())
    }

    async fn run(&mut self, ctx: &mut RunContext) -> Result<(), AdapterError> {
        let mut socket = self.socket.take().ok_or(AdapterError::NotConnected)?;
        let mut retiring: Option<WsStream> = None;

        loop {
            let deadline = self.read_deadline();
            let inbound = tokio::select! {
                biased;
                _ = ctx.stopped() => {
                    if let Some(old) = retiring.take() {
                        close_socket(old).await;
                    }
                    close_socket(socket).await;
                    return Ok(());
                }
                frame = async {
                    match deadline {
                        Some(limit) => tokio::time::timeout(limit, socket.next()).await,
                        None => Ok(socket.next().await),
                    }
                } => Inbound::Current(frame),
                frame = next_retiring(retiring.as_mut()) => Inbound::Retiring(frame),
            };

            let text = match inbound {
                Inbound::Current(Err(_)) => {
                    let limit = deadline.unwrap_or_default();
                    tracing::warn!(adapter = %self.id, phase = ?self.machine.phase(), "EventSub went silent");
                    return Err(AdapterError::Timeout(limit));
                }
                Inbound::Current(Ok(Some(Ok(Message::Text(text))))) => text,
                Inbound::Current(Ok(Some(Ok(Message::Close(_)))) | Ok(None)) => {
                    return Err(AdapterError::Closed);
                }
                Inbound::Current(Ok(Some(Ok(_)))) => continue,
                Inbound::Current(Ok(Some(Err(e)))) => return Err(map_ws_error(e)),
                Inbound::Retiring(Some(Ok(Message::Text(text)))) => text,
                Inbound::Retiring(Some(Ok(_))) => continue,
                Inbound::Retiring(_) => {
                    retiring = None;
                    continue;
                }
            };

            match self.apply(&text, ctx).await? {
                Some(AppliedAction::Replace(replacement)) => {
                    let old = std::mem::replace(&mut socket, replacement);
                    if let Some(stale) = retiring.replace(old) {
                        close_socket(stale).await;
                    }
                }
                Some(AppliedAction::RetireOld) => {
                    if let Some(old) = retiring.take() {
                        close_socket(old).await;
                    }
                }
                None => {}
            }
        }
    }

    async fn disconnect(&mut self) -> Result<(), AdapterError> {
        if let Some(socket) = self.socket.take() {
            close_socket(socket).await;
        }
        self.machine.reset();
        Ok(())
    }
}
