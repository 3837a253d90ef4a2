//! Shared plumbing for adapters that hold a persistent websocket.
//!
//! - [`connect`] opens a client websocket with a deadline.
//! - [`SharedWriter`] lets the reader, the heartbeat and `disconnect`
//!   write to one connection and closes it at most once.
//! - [`Heartbeat`] is the keepalive sub-task with its own stop signal.

mod heartbeat;
mod writer;

pub use heartbeat::Heartbeat;
pub use writer::{SharedWriter, TextWriter};

use std::time::Duration;

use futures::stream::{SplitSink, SplitStream};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use crate::ports::AdapterError;

pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
pub type WsSink = SplitSink<WsStream, Message>;
pub type WsSource = SplitStream<WsStream>;

/// Opens a client websocket to `url`, failing after `timeout`.
pub async fn connect(url: &str, timeout: Duration) -> Result<WsStream, AdapterError> {
    match tokio::time::timeout(timeout, tokio_tungstenite::connect_async(url)).await {
        Ok(Ok((stream, _response))) => Ok(stream),
        Ok(Err(e)) => Err(map_ws_error(e)),
        Err(_) => Err(AdapterError::Timeout(timeout)),
    }
}

/// Classifies a websocket error for the supervisor.
pub fn map_ws_error(err: tungstenite::Error) -> AdapterError {
    use tungstenite::Error;

    match err {
        Error::ConnectionClosed | Error::AlreadyClosed => AdapterError::Closed,
        Error::Http(response) if matches!(response.status().as_u16(), 401 | 403) => {
            AdapterError::authentication(format!("handshake rejected with {}", response.status()))
        }
        Error::Protocol(e) => AdapterError::protocol(e.to_string()),
        Error::Utf8 => AdapterError::protocol("invalid utf-8 in text frame"),
        other => AdapterError::transport(other.to_string()),
    }
}

/// Splits a text frame into protocol lines, dropping empty ones.
pub fn lines(frame: &str) -> impl Iterator<Item = &str> {
    frame
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_handles_crlf_and_trailing_delimiter() {
        let collected: Vec<_> = lines("PING :a\r\n:x PRIVMSG #c :hi\r\n").collect();
        assert_eq!(collected, vec!["PING :a", ":x PRIVMSG #c :hi"]);
    }

    #[test]
    fn lines_accepts_bare_newlines() {
        assert_eq!(lines("a\nb").count(), 2);
    }

    #[test]
    fn closed_errors_map_to_closed() {
        assert!(matches!(
            map_ws_error(tungstenite::Error::ConnectionClosed),
            AdapterError::Closed
        ));
    }

    #[tokio::test]
    async fn connect_to_unreachable_host_fails_transiently() {
        let err = connect("ws://127.0.0.1:9/", Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(err.is_transient(), "unexpected error {:?}", err);
    }
}
