//! Upstream source configuration (agent, OBS, Twitch, YouTube)

use serde::Deserialize;
use std::time::Duration;

use crate::domain::subscription::SubscriptionType;

use super::error::ValidationError;

fn has_value(value: &Option<String>) -> bool {
    value.as_ref().is_some_and(|v| !v.trim().is_empty())
}

fn check_url(field: &'static str, value: &str, schemes: &[&str]) -> Result<(), ValidationError> {
    if schemes.iter().any(|scheme| value.starts_with(scheme)) {
        Ok(())
    } else {
        Err(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
        })
    }
}

/// Local health agent
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSourceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Base URL of the agent's HTTP API
    #[serde(default = "default_agent_url")]
    pub url: String,

    #[serde(default = "default_agent_interval")]
    pub polling_interval_secs: u64,

    /// Per-request timeout in seconds
    #[serde(default = "default_agent_timeout")]
    pub timeout_secs: u64,
}

impl AgentSourceConfig {
    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.enabled {
            return Ok(());
        }
        check_url("agent.url", &self.url, &["http://", "https://"])?;
        if self.polling_interval_secs == 0 {
            return Err(ValidationError::ZeroValue("agent.polling_interval_secs"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::ZeroValue("agent.timeout_secs"));
        }
        Ok(())
    }
}

impl Default for AgentSourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: default_agent_url(),
            polling_interval_secs: default_agent_interval(),
            timeout_secs: default_agent_timeout(),
        }
    }
}

/// OBS websocket control channel
#[derive(Debug, Clone, Deserialize)]
pub struct ObsSourceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_obs_host")]
    pub host: String,

    #[serde(default = "default_obs_port")]
    pub port: u16,

    /// obs-websocket server password, when authentication is on
    pub password: Option<String>,

    #[serde(default = "default_obs_keepalive")]
    pub keepalive_secs: u64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
}

impl ObsSourceConfig {
    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.enabled {
            return Ok(());
        }
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        if self.keepalive_secs == 0 {
            return Err(ValidationError::ZeroValue("obs.keepalive_secs"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ValidationError::ZeroValue("obs.connect_timeout_secs"));
        }
        Ok(())
    }
}

impl Default for ObsSourceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: default_obs_host(),
            port: default_obs_port(),
            password: None,
            keepalive_secs: default_obs_keepalive(),
            connect_timeout_secs: default_connect_timeout(),
        }
    }
}

/// Twitch chat, EventSub and Helix
#[derive(Debug, Clone, Deserialize)]
pub struct TwitchSourceConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Application client id, required for EventSub
    pub client_id: Option<String>,

    /// Channel login the portal joins and watches
    pub channel: Option<String>,

    /// User access token, with or without the `oauth:` prefix
    pub oauth_token: Option<String>,

    #[serde(default = "default_irc_url")]
    pub irc_url: String,

    #[serde(default = "default_eventsub_url")]
    pub eventsub_url: String,

    #[serde(default = "default_helix_url")]
    pub helix_url: String,

    /// EventSub subscription types (comma-separated); empty disables EventSub
    #[serde(default = "default_subscriptions")]
    pub subscriptions: String,

    /// Seconds between chat keepalive probes
    #[serde(default = "default_heartbeat")]
    pub heartbeat_secs: u64,

    /// Seconds allowed for the chat login to complete
    #[serde(default = "default_auth_timeout")]
    pub auth_timeout_secs: u64,
}

impl TwitchSourceConfig {
    pub fn heartbeat(&self) -> Duration {
        Duration::from_secs(self.heartbeat_secs)
    }

    pub fn auth_timeout(&self) -> Duration {
        Duration::from_secs(self.auth_timeout_secs)
    }

    /// Parsed subscription types, in configured order without duplicates.
    pub fn subscription_types(&self) -> Result<Vec<SubscriptionType>, ValidationError> {
        let mut types = Vec::new();
        for name in self.subscriptions.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let kind: SubscriptionType = name
                .parse()
                .map_err(|_| ValidationError::UnknownSubscription(name.to_string()))?;
            if !types.contains(&kind) {
                types.push(kind);
            }
        }
        Ok(types)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.enabled {
            return Ok(());
        }
        if !has_value(&self.channel) {
            return Err(ValidationError::MissingRequired("twitch.channel"));
        }
        if !has_value(&self.oauth_token) {
            return Err(ValidationError::MissingRequired("twitch.oauth_token"));
        }
        if !self.subscription_types()?.is_empty() && !has_value(&self.client_id) {
            return Err(ValidationError::MissingRequired("twitch.client_id"));
        }
        check_url("twitch.irc_url", &self.irc_url, &["ws://", "wss://"])?;
        check_url("twitch.eventsub_url", &self.eventsub_url, &["ws://", "wss://"])?;
        check_url("twitch.helix_url", &self.helix_url, &["http://", "https://"])?;
        if self.heartbeat_secs == 0 {
            return Err(ValidationError::ZeroValue("twitch.heartbeat_secs"));
        }
        if self.auth_timeout_secs == 0 {
            return Err(ValidationError::ZeroValue("twitch.auth_timeout_secs"));
        }
        Ok(())
    }
}

impl Default for TwitchSourceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            client_id: None,
            channel: None,
            oauth_token: None,
            irc_url: default_irc_url(),
            eventsub_url: default_eventsub_url(),
            helix_url: default_helix_url(),
            subscriptions: default_subscriptions(),
            heartbeat_secs: default_heartbeat(),
            auth_timeout_secs: default_auth_timeout(),
        }
    }
}

/// YouTube live chat
#[derive(Debug, Clone, Deserialize)]
pub struct YouTubeSourceConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Data API v3 key
    pub api_key: Option<String>,

    pub channel_id: Option<String>,

    /// Fixed live chat; otherwise the active broadcast's chat is used
    pub live_chat_id: Option<String>,

    #[serde(default = "default_youtube_url")]
    pub api_base_url: String,

    /// Poll interval used until the API dictates one
    #[serde(default = "default_youtube_interval")]
    pub default_poll_interval_secs: u64,
}

impl YouTubeSourceConfig {
    pub fn default_poll_interval(&self) -> Duration {
        Duration::from_secs(self.default_poll_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.enabled {
            return Ok(());
        }
        if !has_value(&self.api_key) {
            return Err(ValidationError::MissingRequired("youtube.api_key"));
        }
        check_url("youtube.api_base_url", &self.api_base_url, &["http://", "https://"])?;
        if self.default_poll_interval_secs == 0 {
            return Err(ValidationError::ZeroValue("youtube.default_poll_interval_secs"));
        }
        Ok(())
    }
}

impl Default for YouTubeSourceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            api_key: None,
            channel_id: None,
            live_chat_id: None,
            api_base_url: default_youtube_url(),
            default_poll_interval_secs: default_youtube_interval(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_agent_url() -> String {
    "http://127.0.0.1:9999".to_string()
}

fn default_agent_interval() -> u64 {
    3
}

fn default_agent_timeout() -> u64 {
    5
}

fn default_obs_host() -> String {
    "localhost".to_string()
}

fn default_obs_port() -> u16 {
    4455
}

fn default_obs_keepalive() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_irc_url() -> String {
    "wss://irc-ws.chat.twitch.tv:443".to_string()
}

fn default_eventsub_url() -> String {
    "wss://eventsub.wss.twitch.tv/ws".to_string()
}

fn default_helix_url() -> String {
    "https://api.twitch.tv/helix".to_string()
}

fn default_subscriptions() -> String {
    "follow,subscribe,raid".to_string()
}

fn default_heartbeat() -> u64 {
    300
}

fn default_auth_timeout() -> u64 {
    10
}

fn default_youtube_url() -> String {
    "https://www.googleapis.com/youtube/v3".to_string()
}

fn default_youtube_interval() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn twitch() -> TwitchSourceConfig {
        TwitchSourceConfig {
            enabled: true,
            client_id: Some("cid".to_string()),
            channel: Some("streamer".to_string()),
            oauth_token: Some("oauth:abc".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_agent_defaults() {
        let config = AgentSourceConfig::default();
        assert!(config.enabled);
        assert_eq!(config.url, "http://127.0.0.1:9999");
        assert_eq!(config.polling_interval(), Duration::from_secs(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_agent_url_must_be_http() {
        let config = AgentSourceConfig {
            url: "127.0.0.1:9999".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidUrl { field: "agent.url", .. })
        ));
    }

    #[test]
    fn test_disabled_sources_skip_validation() {
        let config = YouTubeSourceConfig::default();
        assert!(!config.enabled);
        assert!(config.validate().is_ok());
        assert!(TwitchSourceConfig::default().validate().is_ok());
    }

    #[test]
    fn test_obs_defaults() {
        let config = ObsSourceConfig::default();
        assert_eq!(config.port, 4455);
        assert_eq!(config.keepalive(), Duration::from_secs(30));
        assert!(config.password.is_none());
    }

    #[test]
    fn test_twitch_requires_channel_and_token() {
        let config = TwitchSourceConfig {
            channel: None,
            ..twitch()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("twitch.channel"))
        );

        let config = TwitchSourceConfig {
            oauth_token: Some("  ".to_string()),
            ..twitch()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("twitch.oauth_token"))
        );
    }

    #[test]
    fn test_client_id_only_needed_for_subscriptions() {
        let config = TwitchSourceConfig {
            client_id: None,
            ..twitch()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("twitch.client_id"))
        );

        let config = TwitchSourceConfig {
            client_id: None,
            subscriptions: String::new(),
            ..twitch()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_subscription_parsing() {
        let config = TwitchSourceConfig {
            subscriptions: "raid, channel.follow,raid".to_string(),
            ..twitch()
        };
        assert_eq!(
            config.subscription_types().unwrap(),
            vec![SubscriptionType::Raid, SubscriptionType::Follow]
        );

        let config = TwitchSourceConfig {
            subscriptions: "follow,cheer".to_string(),
            ..twitch()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::UnknownSubscription("cheer".to_string()))
        );
    }

    #[test]
    fn test_youtube_requires_api_key() {
        let config = YouTubeSourceConfig {
            enabled: true,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("youtube.api_key"))
        );
    }
}
