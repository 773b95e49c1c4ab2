// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for WebSocket communication.
//!
//! Provides a trait-based transport layer that enables:
//! - Real WebSocket connections for production
//! - Mock transports for unit testing
//!
//! A transport owns the session handshake: `connect` sends `hello` and
//! resolves to the session id carried by the server's `welcome`.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use ts_core::protocol::{ClientMessage, ErrorCode, ServerMessage};

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The operation did not finish in time.
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// The server refused the auth token.
    #[error("auth token rejected: {0}")]
    AuthRejected(String),

    /// The server answered `hello` with something other than `welcome`.
    #[error("handshake failed: {0}")]
    Handshake(String),

    /// Connection closed unexpectedly.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    SerializationError(String),
}

impl TransportError {
    /// Returns true if retrying with the same token cannot succeed.
    pub fn is_auth_rejection(&self) -> bool {
        matches!(self, TransportError::AuthRejected(_))
    }
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Transport trait for WebSocket-like communication.
///
/// This trait abstracts over the actual transport mechanism, allowing
/// for easy testing with mock implementations.
pub trait Transport: Send + Sync {
    /// Connect to a server and perform the `hello`/`welcome` handshake.
    ///
    /// Returns the session id assigned by the server.
    fn connect<'a>(
        &'a mut self,
        endpoint: &'a str,
        auth_token: &'a str,
        query: &'a BTreeMap<String, String>,
    ) -> Pin<Box<dyn Future<Output = TransportResult<String>> + Send + 'a>>;

    /// Close the connection. Closing an idle transport is a no-op.
    fn close(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>>;

    /// Send a message to the server.
    fn send(
        &mut self,
        msg: ClientMessage,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>>;

    /// Receive a message from the server.
    ///
    /// Returns `None` if the connection is closed.
    fn recv(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Option<ServerMessage>>> + Send + '_>>;

    /// Check if connected.
    fn is_connected(&self) -> bool;
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// WebSocket transport implementation using tokio-tungstenite.
pub struct WebSocketTransport {
    /// The WebSocket connection, if connected.
    ws: Option<WebSocketConnection>,
}

/// Internal WebSocket connection wrapper.
struct WebSocketConnection {
    sink: futures_util::stream::SplitSink<WsStream, tokio_tungstenite::tungstenite::Message>,
    stream: futures_util::stream::SplitStream<WsStream>,
}

impl WebSocketTransport {
    /// Create a new WebSocket transport.
    pub fn new() -> Self {
        WebSocketTransport { ws: None }
    }
}

impl Default for WebSocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a failed WebSocket upgrade to a transport error.
fn classify_connect_error(err: tokio_tungstenite::tungstenite::Error) -> TransportError {
    use tokio_tungstenite::tungstenite::Error;

    match err {
        Error::Http(response) => {
            let status = response.status().as_u16();
            if status == 401 || status == 403 {
                TransportError::AuthRejected(format!("HTTP {status}"))
            } else {
                TransportError::ConnectionFailed(format!("HTTP {status}"))
            }
        }
        other => TransportError::ConnectionFailed(other.to_string()),
    }
}

impl Transport for WebSocketTransport {
    fn connect<'a>(
        &'a mut self,
        endpoint: &'a str,
        auth_token: &'a str,
        query: &'a BTreeMap<String, String>,
    ) -> Pin<Box<dyn Future<Output = TransportResult<String>> + Send + 'a>> {
        Box::pin(async move {
            use futures_util::StreamExt;

            // Drop any previous connection before dialing again
            self.ws = None;

            let (ws_stream, _) = tokio_tungstenite::connect_async(endpoint)
                .await
                .map_err(classify_connect_error)?;

            let (sink, stream) = ws_stream.split();
            self.ws = Some(WebSocketConnection { sink, stream });

            let hello = ClientMessage::hello(auth_token, query.clone());
            if let Err(e) = self.send(hello).await {
                self.ws = None;
                return Err(e);
            }

            let reply = match self.recv().await {
                Ok(reply) => reply,
                Err(e) => {
                    self.ws = None;
                    return Err(e);
                }
            };

            match reply {
                Some(ServerMessage::Welcome { session_id }) => Ok(session_id),
                Some(ServerMessage::Error {
                    code: Some(ErrorCode::AuthRejected),
                    message,
                }) => {
                    self.ws = None;
                    Err(TransportError::AuthRejected(message))
                }
                Some(ServerMessage::Error { message, .. }) => {
                    self.ws = None;
                    Err(TransportError::Handshake(message))
                }
                Some(other) => {
                    self.ws = None;
                    Err(TransportError::Handshake(format!(
                        "expected welcome, got {other:?}"
                    )))
                }
                None => {
                    self.ws = None;
                    Err(TransportError::ConnectionClosed)
                }
            }
        })
    }

    fn close(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            if let Some(mut ws) = self.ws.take() {
                use futures_util::SinkExt;
                // The peer may already be gone; closing is best effort
                let _ = ws.sink.close().await;
            }
            Ok(())
        })
    }

    fn send(
        &mut self,
        msg: ClientMessage,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        Box::pin(async move {
            use futures_util::SinkExt;
            use tokio_tungstenite::tungstenite::Message;

            let ws = self.ws.as_mut().ok_or(TransportError::ConnectionClosed)?;

            let json = msg
                .to_json()
                .map_err(|e| TransportError::SerializationError(e.to_string()))?;

            if let Err(e) = ws.sink.send(Message::Text(json.into())).await {
                // Connection is broken, clear it
                self.ws = None;
                return Err(TransportError::SendFailed(e.to_string()));
            }

            // Flush to ensure the data is actually sent and we detect connection failures
            if let Err(e) = ws.sink.flush().await {
                self.ws = None;
                return Err(TransportError::SendFailed(e.to_string()));
            }

            Ok(())
        })
    }

    fn recv(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Option<ServerMessage>>> + Send + '_>> {
        Box::pin(async move {
            use futures_util::StreamExt;
            use tokio_tungstenite::tungstenite::Message;

            let ws = self.ws.as_mut().ok_or(TransportError::ConnectionClosed)?;

            loop {
                match ws.stream.next().await {
                    Some(Ok(Message::Text(text))) => {
                        let msg = ServerMessage::from_json(&text)
                            .map_err(|e| TransportError::SerializationError(e.to_string()))?;
                        return Ok(Some(msg));
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        // Connection closed, clear it
                        self.ws = None;
                        return Ok(None);
                    }
                    Some(Ok(_)) => {
                        // Ignore ping/pong and binary frames
                        continue;
                    }
                    Some(Err(e)) => {
                        // Connection is broken, clear it
                        self.ws = None;
                        return Err(TransportError::ReceiveFailed(e.to_string()));
                    }
                }
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.ws.is_some()
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
