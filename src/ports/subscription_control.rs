//! SubscriptionControl port - request/response channel that creates
//! event subscriptions for a websocket session.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::subscription::SubscriptionType;

use super::AdapterError;

/// One subscription to create, bound to a live session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionRequest {
    pub kind: SubscriptionType,
    pub broadcaster_id: String,
    pub session_id: String,
}

/// How the control channel answered a creation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionOutcome {
    Accepted,
    Rejected { status: u16, reason: String },
}

#[derive(Debug, Clone, Error)]
pub enum ControlError {
    #[error("control channel rejected credentials")]
    Unauthorized,

    #[error("control channel request failed: {0}")]
    Transport(String),

    #[error("unexpected control channel response: {0}")]
    UnexpectedResponse(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl From<ControlError> for AdapterError {
    fn from(err: ControlError) -> Self {
        match err {
            ControlError::Unauthorized => {
                AdapterError::authentication("control channel rejected credentials")
            }
            ControlError::Transport(message) => AdapterError::Transport(message),
            ControlError::UnexpectedResponse(message) => AdapterError::Protocol(message),
            ControlError::NotFound(message) => AdapterError::Unavailable(message),
        }
    }
}

/// Companion control channel for the subscription protocol.
#[async_trait]
pub trait SubscriptionControl: Send + Sync {
    /// Resolves a login name to the platform's user id.
    async fn resolve_user_id(&self, login: &str) -> Result<String, ControlError>;

    async fn create_subscription(
        &self,
        request: &SubscriptionRequest,
    ) -> Result<SubscriptionOutcome, ControlError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_maps_to_authentication_failure() {
        let err: AdapterError = ControlError::Unauthorized.into();
        assert!(err.is_authentication());
    }

    #[test]
    fn missing_user_maps_to_unavailable() {
        let err: AdapterError = ControlError::NotFound("user portal".to_string()).into();
        assert!(matches!(err, AdapterError::Unavailable(_)));
    }
}
