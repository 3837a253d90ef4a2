//! AgentClient - typed HTTP access to the local health agent.
//!
//! # Configuration
//!
//! ```ignore
//! let config = AgentClientConfig::new("http://127.0.0.1:9999")
//!     .with_timeout(Duration::from_secs(2));
//! let client = AgentClient::new(config)?;
//! ```

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use crate::adapters::http_client::{build_client, check_status, map_request_error};
use crate::domain::agent::{AgentCapabilities, AgentStatus};
use crate::ports::AdapterError;

/// Connection settings for the agent.
#[derive(Debug, Clone)]
pub struct AgentClientConfig {
    /// Base URL, without a trailing slash.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl AgentClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

pub struct AgentClient {
    client: Client,
    config: AgentClientConfig,
}

impl AgentClient {
    pub fn new(config: AgentClientConfig) -> Result<Self, AdapterError> {
        let client = build_client(config.timeout)?;
        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// `GET /status`
    pub async fn status(&self) -> Result<AgentStatus, AdapterError> {
        self.get_json("/status").await
    }

    /// `GET /capabilities`
    pub async fn capabilities(&self) -> Result<AgentCapabilities, AdapterError> {
        self.get_json("/capabilities").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, AdapterError> {
        let url = format!("{}{}", self.config.base_url, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| map_request_error(e, self.config.timeout))?;

        check_status(response)
            .await?
            .json::<T>()
            .await
            .map_err(|e| map_request_error(e, self.config.timeout))
    }
}
