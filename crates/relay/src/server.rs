// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket server implementation.
//!
//! Handles client connections, the hello handshake, message routing, and
//! broadcast fanout filtered by each connection's joined channels.
//!
//! # Coverage Notes
//!
//! Due to LLVM coverage instrumentation limitations with async Rust:
//! - `handle_client_message`: Fully covered (all business logic)
//! - `run`, `handle_connection`: Async plumbing exercised by tests but not instrumented

use std::collections::HashSet;
use std::net::SocketAddr;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, info, warn};

use ts_core::protocol::{ClientMessage, ErrorCode, ServerMessage};
use ts_core::{ActionId, Channel};

use crate::state::ServerState;
use crate::world::{Applied, Verdict};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Per-connection session state.
#[derive(Debug, Default)]
pub(crate) struct Connection {
    session_id: Option<String>,
    channels: HashSet<Channel>,
    /// Set when the server wants the socket closed after the reply goes out.
    closing: bool,
}

impl Connection {
    fn is_authenticated(&self) -> bool {
        self.session_id.is_some()
    }

    fn wants(&self, channel: &Channel) -> bool {
        self.is_authenticated() && self.channels.contains(channel)
    }
}

/// Run the WebSocket server on the given address.
pub async fn run(addr: SocketAddr, state: ServerState) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(addr).await?;
    info!("Listening on: {}", listener.local_addr()?);

    loop {
        let (stream, peer_addr) = listener.accept().await?;
        let state = state.clone();

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
pub(crate) async fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: ServerState,
) -> Result<(), BoxError> {
    let ws_stream = tokio_tungstenite::accept_async(stream).await?;
    info!("New WebSocket connection from: {}", peer_addr);

    let (mut ws_sink, mut ws_stream) = ws_stream.split();
    let mut broadcast_rx = state.subscribe();
    let mut conn = Connection::default();

    loop {
        tokio::select! {
            msg = ws_stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let response = handle_client_message(&text, &state, &mut conn).await;
                        if let Some(response) = response {
                            ws_sink.send(Message::Text(response.to_json()?.into())).await?;
                        }
                        if conn.closing {
                            let _ = ws_sink.close().await;
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client {} disconnected", peer_addr);
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        ws_sink.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(_)) => {
                        // Ignore other message types (Binary, Pong, Frame)
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error from {}: {}", peer_addr, e);
                        break;
                    }
                    None => {
                        info!("Client {} stream ended", peer_addr);
                        break;
                    }
                }
            }

            broadcast = broadcast_rx.recv() => {
                match broadcast {
                    Ok(event) if conn.wants(&event.channel) => {
                        let json = ServerMessage::event(event).to_json()?;
                        if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                            warn!("Failed to send event to {}: {}", peer_addr, e);
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(RecvError::Lagged(n)) => {
                        warn!("Client {} lagged by {} events", peer_addr, n);
                    }
                    Err(RecvError::Closed) => {
                        break;
                    }
                }
            }
        }
    }

    info!("Connection closed: {}", peer_addr);
    Ok(())
}

/// Process a client message and return an optional response.
pub(crate) async fn handle_client_message(
    text: &str,
    state: &ServerState,
    conn: &mut Connection,
) -> Option<ServerMessage> {
    let msg = match ClientMessage::from_json(text) {
        Ok(msg) => msg,
        Err(e) => {
            debug!("Unparseable message: {}", e);
            return Some(ServerMessage::error_with_code(
                ErrorCode::BadRequest,
                format!("malformed message: {e}"),
            ));
        }
    };
    debug!("Received message: {:?}", msg);

    match msg {
        ClientMessage::Hello { token, query } => {
            if !state.authorize(&token) {
                warn!("Rejected hello with invalid token");
                conn.closing = true;
                return Some(ServerMessage::error_with_code(
                    ErrorCode::AuthRejected,
                    "invalid token",
                ));
            }
            let session_id = conn
                .session_id
                .get_or_insert_with(|| state.next_session_id())
                .clone();
            debug!("Session {} opened (query: {:?})", session_id, query);
            Some(ServerMessage::welcome(session_id))
        }

        _ if !conn.is_authenticated() => Some(ServerMessage::error_with_code(
            ErrorCode::NotAuthenticated,
            "send hello first",
        )),

        ClientMessage::Join { channel } => {
            debug!("Join {}", channel);
            conn.channels.insert(channel);
            None
        }

        ClientMessage::Leave { channel } => {
            debug!("Leave {}", channel);
            conn.channels.remove(&channel);
            None
        }

        ClientMessage::Action { action } => {
            let id = action.id;
            match state.apply_action(action).await {
                Ok(Applied::Accepted(_)) | Ok(Applied::Duplicate(Verdict::Accepted)) => {
                    Some(ServerMessage::ack(id))
                }
                Ok(Applied::Rejected(message))
                | Ok(Applied::Duplicate(Verdict::Rejected(message))) => {
                    debug!("Action {} rejected: {}", id, message);
                    Some(ServerMessage::rejected(id, message))
                }
                Err(e) => {
                    // Applied in memory only; the client's retry is acked from memory
                    error!("Failed to log action {}: {}", id, e);
                    Some(storage_error(id, &e))
                }
            }
        }

        ClientMessage::Ping { id } => {
            debug!("Ping received: {}", id);
            Some(ServerMessage::pong(id))
        }
    }
}

/// Reply for an action whose log write failed.
pub(crate) fn storage_error(id: ActionId, e: &std::io::Error) -> ServerMessage {
    ServerMessage::error_with_code(
        ErrorCode::Unavailable,
        format!("storage error for {id}: {e}"),
    )
}
