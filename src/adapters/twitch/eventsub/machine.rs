//! SubscriptionMachine - frame-driven session state for EventSub.
//!
//! Pure state: every I/O consequence of a frame is returned as an
//! [`Action`] for the adapter to carry out.
//!
//! A revocation ends one subscription, not the session: notifications of
//! the revoked type are dropped from then on while the others keep flowing.

use std::collections::HashSet;

use crate::domain::foundation::StateMachine;
use crate::domain::subscription::{
    SubscriptionEvent, SubscriptionPhase, SubscriptionSession, SubscriptionType,
};

use super::Frame;

/// What the adapter must do after a frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// A fresh session was welcomed; create every configured subscription.
    CreateSubscriptions { session_id: String },
    Emit(SubscriptionEvent),
    /// Open a replacement connection; keep the current one until it is welcomed.
    Reconnect { url: String },
    /// The replacement connection was welcomed; the old one can be closed.
    ReconnectComplete { session_id: String },
    Revoked {
        subscription_type: String,
        status: String,
    },
    Ignore,
}

#[derive(Debug, Default)]
pub struct SubscriptionMachine {
    phase: SubscriptionPhase,
    session: Option<SubscriptionSession>,
    revoked: HashSet<SubscriptionType>,
}

impl SubscriptionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> SubscriptionPhase {
        self.phase
    }

    pub fn session(&self) -> Option<&SubscriptionSession> {
        self.session.as_ref()
    }

    pub fn is_revoked(&self, kind: SubscriptionType) -> bool {
        self.revoked.contains(&kind)
    }

    /// A connection attempt is starting.
    pub fn connecting(&mut self) {
        self.session = None;
        self.revoked.clear();
        self.phase = SubscriptionPhase::Connecting;
    }

    /// The socket is open; the server speaks first.
    pub fn opened(&mut self) {
        self.move_to(SubscriptionPhase::AwaitingWelcome);
    }

    pub fn reset(&mut self) {
        self.session = None;
        self.revoked.clear();
        self.phase = SubscriptionPhase::Disconnected;
    }

    pub fn handle(&mut self, frame: Frame) -> Action {
        match frame {
            Frame::Welcome(session) => self.on_welcome(session),
            Frame::Keepalive => Action::Ignore,
            Frame::Notification {
                subscription_type,
                event,
            } => self.on_notification(&subscription_type, &event),
            Frame::Reconnect(session) => self.on_reconnect(session),
            Frame::Revocation {
                subscription_type,
                status,
            } => self.on_revocation(subscription_type, status),
            Frame::Unknown(kind) => {
                tracing::debug!(message_type = %kind, "Ignoring unknown frame");
                Action::Ignore
            }
        }
    }

    fn on_welcome(&mut self, session: SubscriptionSession) -> Action {
        if !self.phase.accepts_welcome() {
            tracing::warn!(phase = ?self.phase, "Unexpected welcome ignored");
            return Action::Ignore;
        }

        let resumed = self.phase == SubscriptionPhase::Reconnecting;
        let session_id = session.session_id.clone();
        self.session = Some(session);
        self.move_to(SubscriptionPhase::SessionActive);

        if resumed {
            Action::ReconnectComplete { session_id }
        } else {
            Action::CreateSubscriptions { session_id }
        }
    }

    fn on_notification(&mut self, subscription_type: &str, event: &serde_json::Value) -> Action {
        if !matches!(
            self.phase,
            SubscriptionPhase::SessionActive | SubscriptionPhase::Reconnecting
        ) {
            tracing::debug!(phase = ?self.phase, "Notification outside a session ignored");
            return Action::Ignore;
        }

        let Some(kind) = SubscriptionType::from_wire(subscription_type) else {
            tracing::debug!(subscription_type, "Unhandled subscription type");
            return Action::Ignore;
        };
        if self.revoked.contains(&kind) {
            tracing::debug!(subscription_type, "Notification for revoked subscription dropped");
            return Action::Ignore;
        }

        match SubscriptionEvent::decode(kind, event) {
            Ok(event) => Action::Emit(event),
            Err(e) => {
                tracing::warn!(subscription_type, "Undecodable notification: {}", e);
                Action::Ignore
            }
        }
    }

    fn on_revocation(&mut self, subscription_type: String, status: String) -> Action {
        if !matches!(
            self.phase,
            SubscriptionPhase::SessionActive | SubscriptionPhase::Reconnecting
        ) {
            tracing::debug!(phase = ?self.phase, "Revocation outside a session ignored");
            return Action::Ignore;
        }
        if let Some(kind) = SubscriptionType::from_wire(&subscription_type) {
            self.revoked.insert(kind);
        }
        Action::Revoked {
            subscription_type,
            status,
        }
    }

    fn on_reconnect(&mut self, session: SubscriptionSession) -> Action {
        if self.phase != SubscriptionPhase::SessionActive {
            tracing::warn!(phase = ?self.phase, "Unexpected reconnect ignored");
            return Action::Ignore;
        }
        let Some(url) = session.reconnect_url.clone() else {
            tracing::warn!("Reconnect frame without a url ignored");
            return Action::Ignore;
        };

        self.move_to(SubscriptionPhase::Reconnecting);
        Action::Reconnect { url }
    }

    fn move_to(&mut self, target: SubscriptionPhase) {
        if let Err(e) = self.phase.advance(target) {
            tracing::warn!("Subscription phase unchanged: {}", e);
        }
    }
}
