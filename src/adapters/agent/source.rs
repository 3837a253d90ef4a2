use std::time::Duration;

use async_trait::async_trait;

use crate::domain::agent::AgentReport;
use crate::domain::foundation::AdapterId;
use crate::domain::hub::{HubMessage, MessageKind};
use crate::ports::{AdapterError, PollOutcome, PollSource};

use super::AgentClient;

/// Poll source for the health agent.
///
/// A failed capabilities fetch is logged and the status is still emitted
/// without it; a failed status fetch fails the whole poll.
pub struct AgentStatusSource {
    id: AdapterId,
    client: AgentClient,
    interval: Duration,
}

impl AgentStatusSource {
    pub fn new(client: AgentClient, interval: Duration) -> Self {
        Self {
            id: AdapterId::agent(),
            client,
            interval,
        }
    }
}

#[async_trait]
impl PollSource for AgentStatusSource {
    fn id(&self) -> &AdapterId {
        &self.id
    }

    fn default_interval(&self) -> Duration {
        self.interval
    }

    async fn fetch(&mut self) -> Result<PollOutcome, AdapterError> {
        let status = self.client.status().await?;
        let capabilities = match self.client.capabilities().await {
            Ok(caps) => Some(caps),
            Err(e) => {
                tracing::debug!(agent = %self.client.base_url(), "Capabilities unavailable: {}", e);
                None
            }
        };

        let report = AgentReport {
            status,
            capabilities,
        };
        let message = HubMessage::new(MessageKind::AgentStatus, self.id.clone(), &report)
            .map_err(|e| AdapterError::protocol(e.to_string()))?;

        Ok(PollOutcome::new(vec![message]))
    }
}
