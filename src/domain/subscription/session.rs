//! Subscription protocol session.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

/// Current session of the subscription protocol.
///
/// Replaced wholesale whenever the server sends a new welcome; never
/// patched field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionSession {
    pub session_id: String,
    pub status: String,
    pub keepalive_timeout_seconds: Option<u64>,
    pub reconnect_url: Option<String>,
    pub connected_at: Option<Timestamp>,
}

impl SubscriptionSession {
    /// Keepalive window advertised by the server, if any.
    pub fn keepalive_timeout(&self) -> Option<std::time::Duration> {
        self.keepalive_timeout_seconds
            .filter(|secs| *secs > 0)
            .map(std::time::Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn session(timeout: Option<u64>) -> SubscriptionSession {
        SubscriptionSession {
            session_id: "abc".to_string(),
            status: "connected".to_string(),
            keepalive_timeout_seconds: timeout,
            reconnect_url: None,
            connected_at: None,
        }
    }

    #[test]
    fn keepalive_timeout_converts_seconds() {
        assert_eq!(session(Some(10)).keepalive_timeout(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn zero_or_missing_keepalive_means_no_deadline() {
        assert_eq!(session(Some(0)).keepalive_timeout(), None);
        assert_eq!(session(None).keepalive_timeout(), None);
    }
}
