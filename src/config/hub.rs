//! Event hub and adapter supervision configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Event hub configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HubConfig {
    /// Per-consumer outbound queue bound
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Adapter-to-hub intake bound
    #[serde(default = "default_intake_capacity")]
    pub intake_capacity: usize,

    /// Seconds between liveness pings to consumers
    #[serde(default = "default_ping_interval")]
    pub ping_interval_secs: u64,
}

impl HubConfig {
    pub fn ping_interval(&self) -> Duration {
        Duration::from_secs(self.ping_interval_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.queue_capacity == 0 {
            return Err(ValidationError::ZeroValue("hub.queue_capacity"));
        }
        if self.intake_capacity == 0 {
            return Err(ValidationError::ZeroValue("hub.intake_capacity"));
        }
        if self.ping_interval_secs == 0 {
            return Err(ValidationError::ZeroValue("hub.ping_interval_secs"));
        }
        Ok(())
    }
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            queue_capacity: default_queue_capacity(),
            intake_capacity: default_intake_capacity(),
            ping_interval_secs: default_ping_interval(),
        }
    }
}

/// Reconnect policy shared by every adapter
#[derive(Debug, Clone, Deserialize)]
pub struct SupervisorConfig {
    /// First wait after a failure, in seconds
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,

    /// Cap for the doubling backoff, in seconds
    #[serde(default = "default_max_reconnect_delay")]
    pub max_reconnect_delay_secs: u64,
}

impl SupervisorConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn max_reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.max_reconnect_delay_secs)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.reconnect_delay_secs == 0 {
            return Err(ValidationError::ZeroValue("supervisor.reconnect_delay_secs"));
        }
        if self.max_reconnect_delay_secs < self.reconnect_delay_secs {
            return Err(ValidationError::InvalidBackoff);
        }
        Ok(())
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            reconnect_delay_secs: default_reconnect_delay(),
            max_reconnect_delay_secs: default_max_reconnect_delay(),
        }
    }
}

fn default_queue_capacity() -> usize {
    256
}

fn default_intake_capacity() -> usize {
    1024
}

fn default_ping_interval() -> u64 {
    30
}

fn default_reconnect_delay() -> u64 {
    5
}

fn default_max_reconnect_delay() -> u64 {
    60
}
