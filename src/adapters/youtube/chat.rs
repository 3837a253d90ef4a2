use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::de::DeserializeOwned;

use crate::adapters::http_client::{build_client, check_status, map_request_error};
use crate::domain::foundation::AdapterId;
use crate::domain::hub::{ChatSource, HubMessage, MessageKind};
use crate::ports::{AdapterError, PollOutcome, PollSource};

use super::wire::{BroadcastList, ChatPage};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Settings for the YouTube chat source.
#[derive(Debug, Clone)]
pub struct YouTubeChatConfig {
    api_key: Secret<String>,
    /// Data API base URL, without a trailing slash.
    pub api_base_url: String,
    /// Fixed live chat id; when absent the active broadcast's chat is used.
    pub live_chat_id: Option<String>,
    /// Channel whose active broadcast is looked up.
    pub channel_id: Option<String>,
    /// Interval used until the API dictates one.
    pub default_interval: Duration,
}

impl YouTubeChatConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            api_base_url: "https://www.googleapis.com/youtube/v3".to_string(),
            live_chat_id: None,
            channel_id: None,
            default_interval: Duration::from_secs(5),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_live_chat_id(mut self, id: Option<String>) -> Self {
        self.live_chat_id = id.filter(|id| !id.is_empty());
        self
    }

    pub fn with_channel_id(mut self, id: Option<String>) -> Self {
        self.channel_id = id.filter(|id| !id.is_empty());
        self
    }

    pub fn with_default_interval(mut self, interval: Duration) -> Self {
        self.default_interval = interval;
        self
    }
}

/// Poll source for YouTube live chat.
pub struct YouTubeChatSource {
    id: AdapterId,
    client: Client,
    config: YouTubeChatConfig,
    live_chat_id: Option<String>,
    page_token: Option<String>,
}

impl YouTubeChatSource {
    pub fn new(config: YouTubeChatConfig) -> Result<Self, AdapterError> {
        Ok(Self {
            id: AdapterId::youtube_chat(),
            client: build_client(REQUEST_TIMEOUT)?,
            config,
            live_chat_id: None,
            page_token: None,
        })
    }

    /// Live chat being polled, once resolved.
    pub fn live_chat_id(&self) -> Option<&str> {
        self.live_chat_id.as_deref()
    }

    /// Continuation token sent with the next fetch.
    pub fn page_token(&self) -> Option<&str> {
        self.page_token.as_deref()
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, AdapterError> {
        let url = format!("{}/{}", self.config.api_base_url, path);
        let response = self
            .client
            .get(&url)
            .query(query)
            .query(&[("key", self.config.api_key.expose_secret().as_str())])
            .send()
            .await
            .map_err(|e| map_request_error(e, REQUEST_TIMEOUT))?;

        check_status(response)
            .await?
            .json::<T>()
            .await
            .map_err(|e| map_request_error(e, REQUEST_TIMEOUT))
    }

    async fn resolve_live_chat(&self) -> Result<String, AdapterError> {
        if let Some(id) = &self.config.live_chat_id {
            return Ok(id.clone());
        }

        let mut query = vec![("part", "snippet"), ("broadcastStatus", "active")];
        if let Some(channel) = self.config.channel_id.as_deref() {
            query.push(("channelId", channel));
        }
        let broadcasts: BroadcastList = self.get_json("liveBroadcasts", &query).await?;

        broadcasts
            .live_chat_id()
            .map(str::to_string)
            .ok_or_else(|| AdapterError::unavailable("no active broadcast with a live chat"))
    }
}

#[async_trait]
impl PollSource for YouTubeChatSource {
    fn id(&self) -> &AdapterId {
        &self.id
    }

    fn default_interval(&self) -> Duration {
        self.config.default_interval
    }

    async fn prepare(&mut self) -> Result<(), AdapterError> {
        self.page_token = None;
        let chat_id = self.resolve_live_chat().await?;
        tracing::info!(adapter = %self.id, live_chat_id = %chat_id, "Resolved live chat");
        self.live_chat_id = Some(chat_id);
        Ok(())
    }

    async fn fetch(&mut self) -> Result<PollOutcome, AdapterError> {
        let chat_id = self.live_chat_id.clone().ok_or(AdapterError::NotConnected)?;

        let mut query = vec![
            ("liveChatId", chat_id.as_str()),
            ("part", "snippet,authorDetails"),
        ];
        if let Some(token) = self.page_token.as_deref() {
            query.push(("pageToken", token));
        }
        let page: ChatPage = self.get_json("liveChat/messages", &query).await?;

        if let Some(token) = page.next_page_token.filter(|t| !t.is_empty()) {
            self.page_token = Some(token);
        }

        let mut messages = Vec::with_capacity(page.items.len());
        for chat in page.items.into_iter().filter_map(|item| item.into_message()) {
            let message = HubMessage::new(
                MessageKind::ChatMessage(ChatSource::YouTube),
                self.id.clone(),
                &chat,
            )
            .map_err(|e| AdapterError::protocol(e.to_string()))?;
            messages.push(message);
        }

        let next_interval = page
            .polling_interval_millis
            .filter(|ms| *ms > 0)
            .map(Duration::from_millis);

        Ok(PollOutcome::new(messages).with_next_interval(next_interval))
    }
}
