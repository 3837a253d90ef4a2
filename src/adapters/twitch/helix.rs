//! HelixClient - the REST control channel for EventSub.
//!
//! Requests carry `Authorization: Bearer <token>` and `Client-Id`. A chat
//! token in `oauth:` form is accepted and stripped.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::ports::{ControlError, SubscriptionControl, SubscriptionOutcome, SubscriptionRequest};

#[derive(Debug, Clone)]
pub struct HelixConfig {
    pub base_url: String,
    pub client_id: String,
    token: Secret<String>,
    pub timeout: Duration,
}

impl HelixConfig {
    pub fn new(client_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: "https://api.twitch.tv/helix".to_string(),
            client_id: client_id.into(),
            token: Secret::new(token.into()),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn bearer(&self) -> String {
        let token = self.token.expose_secret();
        format!("Bearer {}", token.strip_prefix("oauth:").unwrap_or(token))
    }
}

#[derive(Debug, Serialize)]
struct CreateSubscriptionBody<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    version: &'static str,
    condition: Value,
    transport: WebsocketTransport<'a>,
}

#[derive(Debug, Serialize)]
struct WebsocketTransport<'a> {
    method: &'static str,
    session_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct UsersResponse {
    #[serde(default)]
    data: Vec<User>,
}

#[derive(Debug, Deserialize)]
struct User {
    id: String,
}

pub struct HelixClient {
    client: Client,
    config: HelixConfig,
}

impl HelixClient {
    pub fn new(config: HelixConfig) -> Result<Self, ControlError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ControlError::Transport(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path)
    }
}

fn transport_error(err: reqwest::Error) -> ControlError {
    ControlError::Transport(err.to_string())
}

#[async_trait]
impl SubscriptionControl for HelixClient {
    async fn resolve_user_id(&self, login: &str) -> Result<String, ControlError> {
        let response = self
            .client
            .get(self.url("users"))
            .query(&[("login", login)])
            .header("Authorization", self.config.bearer())
            .header("Client-Id", &self.config.client_id)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(ControlError::Unauthorized),
            status if !status.is_success() => {
                return Err(ControlError::UnexpectedResponse(format!(
                    "user lookup returned {}",
                    status
                )))
            }
            _ => {}
        }

        let users: UsersResponse = response
            .json()
            .await
            .map_err(|e| ControlError::UnexpectedResponse(e.to_string()))?;

        users
            .data
            .into_iter()
            .next()
            .map(|user| user.id)
            .ok_or_else(|| ControlError::NotFound(format!("user {}", login)))
    }

    async fn create_subscription(
        &self,
        request: &SubscriptionRequest,
    ) -> Result<SubscriptionOutcome, ControlError> {
        let body = CreateSubscriptionBody {
            kind: request.kind.wire_name(),
            version: request.kind.version(),
            condition: request.kind.condition(&request.broadcaster_id),
            transport: WebsocketTransport {
                method: "websocket",
                session_id: &request.session_id,
            },
        };

        let response = self
            .client
            .post(self.url("eventsub/subscriptions"))
            .header("Authorization", self.config.bearer())
            .header("Client-Id", &self.config.client_id)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        match response.status() {
            StatusCode::OK | StatusCode::ACCEPTED => Ok(SubscriptionOutcome::Accepted),
            StatusCode::UNAUTHORIZED => Err(ControlError::Unauthorized),
            status => {
                let reason = response.text().await.unwrap_or_default();
                Ok(SubscriptionOutcome::Rejected {
                    status: status.as_u16(),
                    reason,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::subscription::SubscriptionType;
    use serde_json::json;

    #[test]
    fn bearer_strips_chat_prefix() {
        assert_eq!(HelixConfig::new("cid", "oauth:tok").bearer(), "Bearer tok");
        assert_eq!(HelixConfig::new("cid", "tok").bearer(), "Bearer tok");
    }

    #[test]
    fn follow_body_carries_both_condition_ids() {
        let body = CreateSubscriptionBody {
            kind: SubscriptionType::Follow.wire_name(),
            version: SubscriptionType::Follow.version(),
            condition: SubscriptionType::Follow.condition("42"),
            transport: WebsocketTransport {
                method: "websocket",
                session_id: "s1",
            },
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "type": "channel.follow",
                "version": "2",
                "condition": { "broadcaster_user_id": "42", "moderator_user_id": "42" },
                "transport": { "method": "websocket", "session_id": "s1" }
            })
        );
    }

    #[tokio::test]
    async fn unreachable_api_is_transport_error() {
        let client =
            HelixClient::new(HelixConfig::new("cid", "tok").with_base_url("http://127.0.0.1:1"))
                .unwrap();
        let err = client.resolve_user_id("someone").await.unwrap_err();
        assert!(matches!(err, ControlError::Transport(_)));
    }
}
