//! Failures while reading or checking configuration.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// The YAML file or an environment value could not be read or parsed.
    #[error("cannot read configuration: {0}")]
    Source(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    Invalid(#[from] ValidationError),
}

/// A value that parsed but cannot be used to start the portal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0} is required when its source is enabled")]
    MissingRequired(&'static str),

    #[error("server.port must be non-zero")]
    InvalidPort,

    #[error("'{0}' is not a bindable socket address")]
    InvalidAddress(String),

    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),

    #[error("supervisor.max_reconnect_delay_secs is below supervisor.reconnect_delay_secs")]
    InvalidBackoff,

    #[error("twitch.subscriptions names unknown type '{0}'")]
    UnknownSubscription(String),

    #[error("{field} must be an http(s) or ws(s) URL, got '{value}'")]
    InvalidUrl { field: &'static str, value: String },
}
