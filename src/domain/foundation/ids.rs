//! Strongly-typed identifier value objects.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::ValidationError;

/// Unique identifier for one consumer connection registered with the hub.
///
/// Generated server-side when a transport is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConsumerId(Uuid);

impl ConsumerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConsumerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConsumerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConsumerId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Stable name of a configured upstream source, e.g. `twitch-chat`.
///
/// One adapter per id for the lifetime of the process.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AdapterId(String);

impl AdapterId {
    pub const AGENT: &'static str = "agent";
    pub const OBS: &'static str = "obs";
    pub const TWITCH_CHAT: &'static str = "twitch-chat";
    pub const TWITCH_EVENTSUB: &'static str = "twitch-eventsub";
    pub const YOUTUBE_CHAT: &'static str = "youtube-chat";

    /// Creates an adapter id, rejecting empty or whitespace-containing names.
    pub fn new(id: impl Into<String>) -> Result<Self, ValidationError> {
        let id = id.into();
        if id.is_empty() {
            return Err(ValidationError::adapter_id(id, "empty"));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(ValidationError::adapter_id(id, "contains whitespace"));
        }
        Ok(Self(id))
    }

    /// Id for one of the built-in sources.
    pub(crate) fn builtin(id: &'static str) -> Self {
        Self(id.to_string())
    }

    pub fn agent() -> Self {
        Self::builtin(Self::AGENT)
    }

    pub fn obs() -> Self {
        Self::builtin(Self::OBS)
    }

    pub fn twitch_chat() -> Self {
        Self::builtin(Self::TWITCH_CHAT)
    }

    pub fn twitch_eventsub() -> Self {
        Self::builtin(Self::TWITCH_EVENTSUB)
    }

    pub fn youtube_chat() -> Self {
        Self::builtin(Self::YOUTUBE_CHAT)
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AdapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consumer_ids_are_unique() {
        assert_ne!(ConsumerId::new(), ConsumerId::new());
    }

    #[test]
    fn consumer_id_round_trips_through_display() {
        let id = ConsumerId::new();
        let parsed: ConsumerId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn consumer_id_rejects_garbage() {
        assert!("not-a-uuid".parse::<ConsumerId>().is_err());
    }

    #[test]
    fn adapter_id_rejects_empty() {
        assert_eq!(
            AdapterId::new(""),
            Err(ValidationError::adapter_id("", "empty"))
        );
    }

    #[test]
    fn adapter_id_rejects_whitespace() {
        assert!(AdapterId::new("twitch chat").is_err());
    }

    #[test]
    fn builtin_adapter_ids_display_their_name() {
        assert_eq!(AdapterId::twitch_chat().to_string(), "twitch-chat");
        assert_eq!(AdapterId::obs().as_str(), "obs");
    }

    #[test]
    fn adapter_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&AdapterId::agent()).unwrap();
        assert_eq!(json, "\"agent\"");
    }
}
