//! Application configuration module
//!
//! Configuration is read from an optional YAML file, then from environment
//! variables with the `LIVE_PORTAL` prefix. Nested values use a double
//! underscore as separator. Every section has defaults, so an empty
//! environment yields a runnable (agent + OBS only) configuration.
//!
//! # Example
//!
//! ```no_run
//! use live_portal::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod error;
mod hub;
mod server;
mod sources;

pub use error::{ConfigError, ValidationError};
pub use hub::{HubConfig, SupervisorConfig};
pub use server::{LogFormat, ServerConfig};
pub use sources::{AgentSourceConfig, ObsSourceConfig, TwitchSourceConfig, YouTubeSourceConfig};

use serde::Deserialize;
use std::path::Path;

/// Environment variable naming an optional YAML configuration file.
pub const CONFIG_FILE_ENV: &str = "LIVE_PORTAL_CONFIG";

const ENV_PREFIX: &str = "LIVE_PORTAL";

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Listener, logging and shutdown
    #[serde(default)]
    pub server: ServerConfig,

    /// Event hub queue bounds and ping cadence
    #[serde(default)]
    pub hub: HubConfig,

    /// Reconnect backoff shared by all adapters
    #[serde(default)]
    pub supervisor: SupervisorConfig,

    /// Local health agent
    #[serde(default)]
    pub agent: AgentSourceConfig,

    /// OBS control channel
    #[serde(default)]
    pub obs: ObsSourceConfig,

    /// Twitch chat and EventSub
    #[serde(default)]
    pub twitch: TwitchSourceConfig,

    /// YouTube live chat
    #[serde(default)]
    pub youtube: YouTubeSourceConfig,
}

impl AppConfig {
    /// Load configuration from the optional YAML file and the environment
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads the YAML file named by `LIVE_PORTAL_CONFIG`, if set
    /// 3. Reads environment variables with `LIVE_PORTAL` prefix, which
    ///    override file values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `LIVE_PORTAL__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `LIVE_PORTAL__TWITCH__CHANNEL=...` -> `twitch.channel = ...`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read or values cannot be
    /// parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let file = std::env::var(CONFIG_FILE_ENV).ok();
        Self::load_from(file.as_deref().map(Path::new))
    }

    /// Like [`AppConfig::load`], with an explicit YAML file.
    pub fn load_from(file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Yaml)
                    .required(true),
            );
        }

        let config = builder
            .add_source(
                config::Environment::default()
                    .prefix(ENV_PREFIX)
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid value found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.hub.validate()?;
        self.supervisor.validate()?;
        self.agent.validate()?;
        self.obs.validate()?;
        self.twitch.validate()?;
        self.youtube.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::io::Write;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const TOUCHED: [&str; 6] = [
        "LIVE_PORTAL__SERVER__PORT",
        "LIVE_PORTAL__SERVER__LOG_FORMAT",
        "LIVE_PORTAL__HUB__QUEUE_CAPACITY",
        "LIVE_PORTAL__TWITCH__ENABLED",
        "LIVE_PORTAL__TWITCH__CHANNEL",
        "LIVE_PORTAL__AGENT__URL",
    ];

    fn clear_env() {
        for key in TOUCHED {
            env::remove_var(key);
        }
    }

    #[test]
    fn test_load_with_defaults_only() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load_from(None).unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.hub.queue_capacity, 256);
        assert!(config.agent.enabled);
        assert!(!config.twitch.enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("LIVE_PORTAL__SERVER__PORT", "3000");
        env::set_var("LIVE_PORTAL__SERVER__LOG_FORMAT", "json");
        env::set_var("LIVE_PORTAL__HUB__QUEUE_CAPACITY", "16");
        let result = AppConfig::load_from(None);
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.log_format, LogFormat::Json);
        assert_eq!(config.hub.queue_capacity, 16);
    }

    #[test]
    fn test_yaml_file_with_env_override() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();

        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(
            file,
            "server:\n  port: 9000\nagent:\n  url: http://10.0.0.2:9999\n  polling_interval_secs: 7\ntwitch:\n  channel: from_file"
        )
        .unwrap();

        env::set_var("LIVE_PORTAL__AGENT__URL", "http://agent.local:9999");
        let result = AppConfig::load_from(Some(file.path()));
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.agent.url, "http://agent.local:9999");
        assert_eq!(config.agent.polling_interval_secs, 7);
        assert_eq!(config.twitch.channel.as_deref(), Some("from_file"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load_from(Some(Path::new("/nonexistent/live-portal.yaml")));
        assert!(matches!(result, Err(ConfigError::Source(_))));
    }

    #[test]
    fn test_enabled_twitch_without_channel_fails_validation() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("LIVE_PORTAL__TWITCH__ENABLED", "true");
        let result = AppConfig::load_from(None);
        clear_env();

        let config = result.unwrap();
        assert_eq!(
            config.validate(),
            Err(ValidationError::MissingRequired("twitch.channel"))
        );
    }
}
