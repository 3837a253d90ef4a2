//! PollSource port - one fetch of a pull-style upstream.

use async_trait::async_trait;
use std::time::Duration;

use crate::domain::foundation::AdapterId;
use crate::domain::hub::HubMessage;

use super::AdapterError;

/// Result of one successful fetch.
#[derive(Debug, Default)]
pub struct PollOutcome {
    /// Normalized messages, in upstream order.
    pub messages: Vec<HubMessage>,
    /// Server-dictated wait before the next fetch, if the upstream sent one.
    pub next_interval: Option<Duration>,
}

impl PollOutcome {
    pub fn new(messages: Vec<HubMessage>) -> Self {
        Self {
            messages,
            next_interval: None,
        }
    }

    pub fn with_next_interval(mut self, interval: Option<Duration>) -> Self {
        self.next_interval = interval;
        self
    }
}

/// A pull-style upstream wrapped by the generic poll adapter.
#[async_trait]
pub trait PollSource: Send {
    fn id(&self) -> &AdapterId;

    /// Interval used until the upstream dictates another.
    fn default_interval(&self) -> Duration;

    /// One-off setup run on every connect.
    async fn prepare(&mut self) -> Result<(), AdapterError> {
        Ok(())
    }

    /// Performs one fetch.
    async fn fetch(&mut self) -> Result<PollOutcome, AdapterError>;
}
