//! reqwest helpers shared by the polled HTTP sources.

use std::time::Duration;

use reqwest::{Client, Response, StatusCode};

use crate::ports::AdapterError;

/// Builds a client with a per-request timeout.
pub fn build_client(timeout: Duration) -> Result<Client, AdapterError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AdapterError::transport(format!("Failed to create HTTP client: {}", e)))
}

/// Maps a request failure the way every upstream treats it.
pub fn map_request_error(err: reqwest::Error, timeout: Duration) -> AdapterError {
    if err.is_timeout() {
        AdapterError::Timeout(timeout)
    } else if err.is_connect() {
        AdapterError::transport(format!("Connection failed: {}", err))
    } else if err.is_decode() {
        AdapterError::unavailable(format!("Undecodable response: {}", err))
    } else {
        AdapterError::transport(err.to_string())
    }
}

/// Passes successful responses through; maps everything else.
///
/// 401/403 are authentication failures, every other non-success status
/// marks the upstream unavailable.
pub async fn check_status(response: Response) -> Result<Response, AdapterError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(status_error(status, &body))
}

fn status_error(status: StatusCode, body: &str) -> AdapterError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            AdapterError::authentication(format!("{}: {}", status, truncate(body)))
        }
        _ => AdapterError::unavailable(format!("Unexpected status {}: {}", status, truncate(body))),
    }
}

fn truncate(body: &str) -> &str {
    const LIMIT: usize = 200;
    match body.char_indices().nth(LIMIT) {
        Some((idx, _)) => &body[..idx],
        None => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unauthorized_is_authentication_failure() {
        assert!(status_error(StatusCode::UNAUTHORIZED, "").is_authentication());
        assert!(status_error(StatusCode::FORBIDDEN, "quota").is_authentication());
    }

    #[test]
    fn server_errors_mark_source_unavailable() {
        let err = status_error(StatusCode::SERVICE_UNAVAILABLE, "down");
        assert!(matches!(err, AdapterError::Unavailable(_)));
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(500);
        assert_eq!(truncate(&body).len(), 200);
        assert_eq!(truncate("short"), "short");
    }
}
