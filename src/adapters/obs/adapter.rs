//! ObsAdapter - streamed producer for the OBS control channel.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, Secret};
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;

use crate::adapters::stream::{self, map_ws_error, Heartbeat, SharedWriter, WsStream};
use crate::domain::adapter::{AdapterSession, AdapterStatus};
use crate::domain::foundation::AdapterId;
use crate::domain::hub::{HubMessage, MessageKind};
use crate::ports::{AdapterError, ProducerAdapter, RunContext};

use super::protocol::{
    identify_frame, normalize_event, EventFrame, Hello, Identified, RawFrame,
    CLOSE_AUTHENTICATION_FAILED, OP_EVENT, OP_HELLO, OP_IDENTIFIED,
};

#[derive(Debug, Clone)]
pub struct ObsConfig {
    pub host: String,
    pub port: u16,
    password: Option<Secret<String>>,
    pub keepalive: Duration,
    pub connect_timeout: Duration,
}

impl ObsConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            password: None,
            keepalive: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password.filter(|p| !p.is_empty()).map(Secret::new);
        self
    }

    pub fn with_keepalive(mut self, period: Duration) -> Self {
        self.keepalive = period;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn url(&self) -> String {
        format!("ws://{}:{}", self.host, self.port)
    }
}

fn close_error(frame: Option<CloseFrame<'_>>) -> AdapterError {
    match frame {
        Some(frame) if u16::from(frame.code) == CLOSE_AUTHENTICATION_FAILED => {
            AdapterError::authentication(format!("OBS rejected identify: {}", frame.reason))
        }
        Some(frame) => {
            tracing::debug!(code = u16::from(frame.code), reason = %frame.reason, "OBS closed");
            AdapterError::Closed
        }
        None => AdapterError::Closed,
    }
}

/// Reads frames until one with `op` arrives.
async fn expect_op(socket: &mut WsStream, op: u8) -> Result<RawFrame, AdapterError> {
    loop {
        match socket.next().await {
            Some(Ok(Message::Text(text))) => {
                let frame =
                    RawFrame::parse(&text).map_err(|e| AdapterError::protocol(e.to_string()))?;
                if frame.op == op {
                    return Ok(frame);
                }
                tracing::debug!(op = frame.op, expected = op, "Skipping frame during handshake");
            }
            Some(Ok(Message::Close(frame))) => return Err(close_error(frame)),
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(map_ws_error(e)),
            None => return Err(AdapterError::Closed),
        }
    }
}

/// OBS producer.
pub struct ObsAdapter {
    id: AdapterId,
    config: ObsConfig,
    socket: Option<WsStream>,
    session: Option<AdapterSession>,
}

impl ObsAdapter {
    pub fn new(config: ObsConfig) -> Self {
        Self {
            id: AdapterId::obs(),
            config,
            socket: None,
            session: None,
        }
    }

    async fn handshake(&self, socket: &mut WsStream) -> Result<AdapterSession, AdapterError> {
        let hello: Hello = serde_json::from_value(expect_op(socket, OP_HELLO).await?.d)
            .map_err(|e| AdapterError::protocol(format!("bad Hello: {}", e)))?;

        let password = self.config.password.as_ref().map(|p| p.expose_secret().as_str());
        let identify = identify_frame(&hello, password).ok_or_else(|| {
            AdapterError::authentication("OBS requires a password and none is configured")
        })?;
        socket
            .send(Message::Text(identify))
            .await
            .map_err(map_ws_error)?;

        let identified: Identified = serde_json::from_value(expect_op(socket, OP_IDENTIFIED).await?.d)
            .map_err(|e| AdapterError::protocol(format!("bad Identified: {}", e)))?;

        Ok(AdapterSession::ControlTool {
            server_version: hello.obs_web_socket_version,
            rpc_version: identified.negotiated_rpc_version,
        })
    }

    fn emit_event(&self, ctx: &RunContext, text: &str) {
        let frame = match RawFrame::parse(text) {
            Ok(frame) if frame.op == OP_EVENT => frame,
            Ok(_) => return,
            Err(e) => {
                tracing::warn!(adapter = %self.id, "Malformed OBS frame: {}", e);
                return;
            }
        };
        let Ok(event) = serde_json::from_value::<EventFrame>(frame.d) else {
            tracing::warn!(adapter = %self.id, "Event frame without eventType");
            return;
        };
        let Some(normalized) = normalize_event(&event) else {
            tracing::trace!(adapter = %self.id, event_type = %event.event_type, "Unforwarded event");
            return;
        };

        match HubMessage::new(MessageKind::ControlToolEvent, self.id.clone(), &normalized) {
            Ok(message) => ctx.emit(message),
            Err(e) => tracing::warn!(adapter = %self.id, "Dropping OBS event: {}", e),
        }
    }
}

#[async_trait]
impl ProducerAdapter for ObsAdapter {
    fn id(&self) -> &AdapterId {
        &self.id
    }

    async fn connect(&mut self) -> Result<(), AdapterError> {
        let url = self.config.url();
        let mut socket = stream::connect(&url, self.config.connect_timeout).await?;

        let session = tokio::time::timeout(self.config.connect_timeout, self.handshake(&mut socket))
            .await
            .map_err(|_| AdapterError::Timeout(self.config.connect_timeout))??;

        tracing::info!(adapter = %self.id, url = %url, "Identified with OBS");
        self.socket = Some(socket);
        self.session = Some(session);
        Ok(())
    }

    async fn run(&mut self, ctx: &mut RunContext) -> Result<(), AdapterError> {
        let socket = self.socket.take().ok_or(AdapterError::NotConnected)?;
        ctx.reporter().set_status(AdapterStatus::Connected);
        if let Some(session) = self.session.clone() {
            ctx.reporter().set_session(session);
        }

        let (sink, mut source) = socket.split();
        let writer = SharedWriter::new(sink);
        let (stop_tx, stop_rx) = watch::channel(false);

        let ping_writer = writer.clone();
        let heartbeat = Heartbeat::spawn(self.config.keepalive, stop_rx, move || {
            let writer = ping_writer.clone();
            async move { writer.send(Message::Ping(Vec::new())).await }
        });

        let result = loop {
            let frame = tokio::select! {
                biased;
                _ = ctx.stopped() => break Ok(()),
                frame = source.next() => frame,
            };

            match frame {
                Some(Ok(Message::Text(text))) => self.emit_event(ctx, &text),
                Some(Ok(Message::Close(frame))) => break Err(close_error(frame)),
                Some(Ok(_)) => {}
                Some(Err(e)) => break Err(map_ws_error(e)),
                None => break Err(AdapterError::Closed),
            }
        };

        let _ = stop_tx.send(true);
        writer.close().await;
        heartbeat.join().await;
        result
    }

    async fn disconnect(&mut self) -> Result<(), AdapterError> {
        if let Some(mut socket) = self.socket.take() {
            if let Err(e) = socket.close(None).await {
                tracing::trace!(adapter = %self.id, "Closing OBS socket: {}", e);
            }
        }
        self.session = None;
        Ok(())
    }
}
