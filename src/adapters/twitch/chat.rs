//! TwitchChatAdapter - Twitch IRC over websocket.
//!
//! ```text
//! Disconnected ──connect──▶ Authenticating ──001──▶ Joined
//!      ▲                         │                    │
//!      └──── close / NOTICE ─────┘◀──── disconnect ───┘
//! ```
//!
//! `run` spawns two tasks that share one stop signal: the line reader and
//! the heartbeat. `disconnect` stops both, leaves the channel, closes the
//! socket once and joins both tasks before returning.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use secrecy::{ExposeSecret, Secret};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::{self, error::ProtocolError, Message};

use crate::adapters::stream::{self, map_ws_error, Heartbeat, SharedWriter, TextWriter, WsSource};
use crate::domain::adapter::{AdapterSession, AdapterStatus};
use crate::domain::foundation::{AdapterId, StateMachine};
use crate::domain::hub::{ChatSource, HubMessage, MessageKind};
use crate::ports::{AdapterError, MessageSink, ProducerAdapter, RunContext};

use super::irc::{pong_for, IrcLine, HEARTBEAT_PROBE};

/// Chat protocol state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatState {
    #[default]
    Disconnected,
    Authenticating,
    Joined,
}

impl StateMachine for ChatState {
    const MACHINE: &'static str = "twitch chat";

    fn can_transition_to(&self, target: &Self) -> bool {
        use ChatState::*;
        matches!(
            (self, target),
            (Disconnected, Authenticating)
                | (Authenticating, Joined)
                | (Authenticating, Disconnected)
                | (Joined, Disconnected)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ChatState::*;
        match self {
            Disconnected => vec![Authenticating],
            Authenticating => vec![Joined, Disconnected],
            Joined => vec![Disconnected],
        }
    }
}

/// Settings for the chat connection.
#[derive(Debug, Clone)]
pub struct TwitchChatConfig {
    pub url: String,
    /// Channel login, lowercase, without `#`.
    pub channel: String,
    token: Secret<String>,
    pub heartbeat: Duration,
    pub auth_timeout: Duration,
    pub connect_timeout: Duration,
}

impl TwitchChatConfig {
    pub fn new(channel: impl AsRef<str>, oauth_token: impl Into<String>) -> Self {
        Self {
            url: "wss://irc-ws.chat.twitch.tv:443".to_string(),
            channel: channel.as_ref().trim_start_matches('#').to_ascii_lowercase(),
            token: Secret::new(oauth_token.into()),
            heartbeat: Duration::from_secs(300),
            auth_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_heartbeat(mut self, period: Duration) -> Self {
        self.heartbeat = period;
        self
    }

    pub fn with_auth_timeout(mut self, timeout: Duration) -> Self {
        self.auth_timeout = timeout;
        self
    }

    /// Capability request, credentials, identity and join, in send order.
    fn handshake(&self) -> [String; 4] {
        let token = self.token.expose_secret();
        let pass = if token.starts_with("oauth:") {
            format!("PASS {}", token)
        } else {
            format!("PASS oauth:{}", token)
        };
        [
            "CAP REQ :twitch.tv/tags twitch.tv/commands".to_string(),
            pass,
            format!("NICK {}", self.channel),
            format!("JOIN #{}", self.channel),
        ]
    }
}

fn terminated(line: impl AsRef<str>) -> String {
    format!("{}\r\n", line.as_ref())
}

/// Handles inbound lines for one joined connection.
struct LineHandler<W> {
    writer: W,
    sink: Arc<dyn MessageSink>,
    origin: AdapterId,
}

impl<W: TextWriter> LineHandler<W> {
    /// Processes every line of one frame in order.
    ///
    /// A `PING` is answered before the next line is looked at.
    async fn handle_frame(&self, frame: &str) -> Result<(), AdapterError> {
        for line in stream::lines(frame) {
            self.handle_line(line).await?;
        }
        Ok(())
    }

    async fn handle_line(&self, line: &str) -> Result<(), AdapterError> {
        match IrcLine::classify(line) {
            IrcLine::Ping(arg) => self.writer.send_text(terminated(pong_for(arg))).await,
            IrcLine::Chat(message) => {
                match HubMessage::new(
                    MessageKind::ChatMessage(ChatSource::Twitch),
                    self.origin.clone(),
                    &message,
                ) {
                    Ok(msg) => self.sink.emit(msg),
                    Err(e) => tracing::warn!(adapter = %self.origin, "Dropping chat line: {}", e),
                }
                Ok(())
            }
            IrcLine::Reconnect => Err(AdapterError::transport("server requested reconnect")),
            IrcLine::AuthFailed(notice) => Err(AdapterError::authentication(notice)),
            IrcLine::Welcome | IrcLine::Other => Ok(()),
        }
    }
}

fn closed_by_peer(err: &tungstenite::Error) -> bool {
    matches!(
        err,
        tungstenite::Error::ConnectionClosed
            | tungstenite::Error::AlreadyClosed
            | tungstenite::Error::Protocol(ProtocolError::ResetWithoutClosingHandshake)
    )
}

/// Reads until `001`, answering PINGs on the way.
///
/// Returns the lines that arrived after `001` in the same frame.
async fn await_welcome(
    writer: &SharedWriter,
    source: &mut WsSource,
) -> Result<Vec<String>, AdapterError> {
    let login_closed = || AdapterError::authentication("connection closed before login completed");

    loop {
        let text = match source.next().await {
            Some(Ok(Message::Text(text))) => text,
            Some(Ok(Message::Close(_))) | None => return Err(login_closed()),
            Some(Ok(_)) => continue,
            Some(Err(e)) if closed_by_peer(&e) => return Err(login_closed()),
            Some(Err(e)) => return Err(map_ws_error(e)),
        };

        let mut welcomed = false;
        let mut pending = Vec::new();
        for line in stream::lines(&text) {
            if welcomed {
                pending.push(line.to_string());
                continue;
            }
            match IrcLine::classify(line) {
                IrcLine::Ping(arg) => writer.send_text(terminated(pong_for(arg))).await?,
                IrcLine::Welcome => welcomed = true,
                IrcLine::AuthFailed(notice) => return Err(AdapterError::authentication(notice)),
                _ => {}
            }
        }
        if welcomed {
            return Ok(pending);
        }
    }
}

async fn read_loop(
    handler: LineHandler<SharedWriter>,
    mut source: WsSource,
    pending: Vec<String>,
    mut stop: watch::Receiver<bool>,
) -> Result<(), AdapterError> {
    for line in &pending {
        handler.handle_line(line).await?;
    }

    loop {
        let frame = tokio::select! {
            biased;
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    return Ok(());
                }
                continue;
            }
            frame = source.next() => frame,
        };

        match frame {
            Some(Ok(Message::Text(text))) => handler.handle_frame(&text).await?,
            Some(Ok(Message::Close(_))) | None => return Err(AdapterError::Closed),
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                if *stop.borrow() {
                    return Ok(());
                }
                return Err(map_ws_error(e));
            }
        }
    }
}

/// Twitch IRC chat producer.
pub struct TwitchChatAdapter {
    id: AdapterId,
    config: TwitchChatConfig,
    state: ChatState,
    connected: Arc<AtomicBool>,
    writer: Option<SharedWriter>,
    source: Option<WsSource>,
    pending: Vec<String>,
    stop: Option<watch::Sender<bool>>,
    reader: Option<JoinHandle<Result<(), AdapterError>>>,
    heartbeat: Option<Heartbeat>,
}

impl TwitchChatAdapter {
    pub fn new(config: TwitchChatConfig) -> Self {
        Self {
            id: AdapterId::twitch_chat(),
            config,
            state: ChatState::Disconnected,
            connected: Arc::new(AtomicBool::new(false)),
            writer: None,
            source: None,
            pending: Vec::new(),
            stop: None,
            reader: None,
            heartbeat: None,
        }
    }

    pub fn state(&self) -> ChatState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn set_state(&mut self, target: ChatState) -> Result<(), AdapterError> {
        self.state
            .advance(target)
            .map_err(|e| AdapterError::protocol(e.to_string()))
    }

    async fn login(&mut self) -> Result<(), AdapterError> {
        let socket = stream::connect(&self.config.url, self.config.connect_timeout).await?;
        let (sink, mut source) = socket.split();
        let writer = SharedWriter::new(sink);
        self.writer = Some(writer.clone());

        for line in self.config.handshake() {
            writer.send_text(terminated(line)).await?;
        }

        let pending = tokio::time::timeout(
            self.config.auth_timeout,
            await_welcome(&writer, &mut source),
        )
        .await
        .map_err(|_| AdapterError::Timeout(self.config.auth_timeout))??;

        self.source = Some(source);
        self.pending = pending;
        Ok(())
    }
}

#[async_trait]
impl ProducerAdapter for TwitchChatAdapter {
    fn id(&self) -> &AdapterId {
        &self.id
    }

    async fn connect(&mut self) -> Result<(), AdapterError> {
        if self.state != ChatState::Disconnected {
            self.disconnect().await?;
        }
        self.set_state(ChatState::Authenticating)?;

        if let Err(e) = self.login().await {
            if let Some(writer) = self.writer.take() {
                writer.close().await;
            }
            self.source = None;
            self.set_state(ChatState::Disconnected)?;
            return Err(e);
        }

        self.set_state(ChatState::Joined)?;
        self.connected.store(true, Ordering::SeqCst);
        tracing::info!(adapter = %self.id, channel = %self.config.channel, "Joined chat");
        Ok(())
    }

    async fn run(&mut self, ctx: &mut RunContext) -> Result<(), AdapterError> {
        let (Some(writer), Some(source)) = (self.writer.clone(), self.source.take()) else {
            return Err(AdapterError::NotConnected);
        };

        ctx.reporter().set_status(AdapterStatus::Connected);
        ctx.reporter().set_session(AdapterSession::Chat {
            nickname: self.config.channel.clone(),
            channel: format!("#{}", self.config.channel),
        });

        let (stop_tx, stop_rx) = watch::channel(false);
        self.stop = Some(stop_tx);

        let heartbeat_writer = writer.clone();
        let connected = self.connected.clone();
        self.heartbeat = Some(Heartbeat::spawn(
            self.config.heartbeat,
            stop_rx.clone(),
            move || {
                let writer = heartbeat_writer.clone();
                let connected = connected.clone();
                async move {
                    if connected.load(Ordering::SeqCst) {
                        writer.send_text(terminated(HEARTBEAT_PROBE)).await
                    } else {
                        Ok(())
                    }
                }
            },
        ));

        let handler = LineHandler {
            writer,
            sink: ctx.sink(),
            origin: self.id.clone(),
        };
        let pending = std::mem::take(&mut self.pending);
        let mut reader = tokio::spawn(read_loop(handler, source, pending, stop_rx));

        let finished = tokio::select! {
            biased;
            _ = ctx.stopped() => None,
            joined = &mut reader => Some(joined),
        };

        match finished {
            None => {
                self.reader = Some(reader);
                Ok(())
            }
            Some(Ok(result)) => result,
            Some(Err(e)) => Err(AdapterError::transport(format!("chat reader failed: {}", e))),
        }
    }

    async fn disconnect(&mut self) -> Result<(), AdapterError> {
        self.connected.store(false, Ordering::SeqCst);
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(true);
        }

        if let Some(writer) = self.writer.take() {
            if self.state == ChatState::Joined {
                let part = terminated(format!("PART #{}", self.config.channel));
                if let Err(e) = writer.send_text(part).await {
                    tracing::debug!(adapter = %self.id, "PART not sent: {}", e);
                }
            }
            writer.close().await;
        }

        if let Some(reader) = self.reader.take() {
            match reader.await {
                Ok(Err(e)) => tracing::debug!(adapter = %self.id, "Reader ended: {}", e),
                Err(e) => tracing::warn!(adapter = %self.id, "Reader task failed: {}", e),
                Ok(Ok(())) => {}
            }
        }
        if let Some(heartbeat) = self.heartbeat.take() {
            heartbeat.join().await;
        }

        self.source = None;
        self.pending.clear();
        if self.state != ChatState::Disconnected {
            self.set_state(ChatState::Disconnected)?;
            tracing::info!(adapter = %self.id, "Left chat");
        }
        Ok(())
    }
}
