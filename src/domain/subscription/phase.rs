//! Subscription protocol phase.

use serde::Serialize;

use crate::domain::foundation::StateMachine;

/// Where the subscription client is in the session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPhase {
    #[default]
    Disconnected,
    Connecting,
    AwaitingWelcome,
    SessionActive,
    /// A replacement connection was requested by the server.
    Reconnecting,
}

impl SubscriptionPhase {
    /// Phases in which a welcome frame is expected.
    pub fn accepts_welcome(&self) -> bool {
        matches!(
            self,
            SubscriptionPhase::AwaitingWelcome | SubscriptionPhase::Reconnecting
        )
    }
}

impl StateMachine for SubscriptionPhase {
    const MACHINE: &'static str = "eventsub phase";

    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionPhase::*;
        matches!(
            (self, target),
            (Disconnected, Connecting)
                | (Connecting, AwaitingWelcome)
                | (Connecting, Disconnected)
                | (AwaitingWelcome, SessionActive)
                | (AwaitingWelcome, Disconnected)
                | (SessionActive, Reconnecting)
                | (SessionActive, Disconnected)
                | (Reconnecting, SessionActive)
                | (Reconnecting, Disconnected)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionPhase::*;
        match self {
            Disconnected => vec![Connecting],
            Connecting => vec![AwaitingWelcome, Disconnected],
            AwaitingWelcome => vec![SessionActive, Disconnected],
            SessionActive => vec![Reconnecting, Disconnected],
            Reconnecting => vec![SessionActive, Disconnected],
        }
    }
}
