// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::future::{pending, Future};
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use ts_core::protocol::{ClientMessage, ServerMessage};
use ts_core::{ActionId, Channel};

use super::transport::{Transport, TransportError, TransportResult};
use std::collections::BTreeMap;

/// How the mock answers the next `connect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectScript {
    Accept,
    Refuse,
    RejectAuth,
    /// Never completes.
    Hang,
}

/// How the mock server answers the next action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Ack,
    Reject,
    /// Accept the send but never answer.
    Silent,
    /// Fail the send and drop the connection.
    FailSend,
}

#[derive(Default)]
struct MockState {
    connected: bool,
    connects: VecDeque<ConnectScript>,
    tokens: Vec<String>,
    sessions: u64,
    sent: Vec<ClientMessage>,
    /// `None` entries close the connection from the server side.
    incoming: VecDeque<Option<ServerMessage>>,
    replies: VecDeque<Reply>,
    ignore_pings: bool,
}

/// Scripted in-process transport. Clones share state, so a test keeps one
/// clone to drive and inspect the transport owned by a session.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
    wake: Arc<Notify>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts upcoming connect results. Unscripted connects succeed.
    pub fn script_connects(&self, script: &[ConnectScript]) {
        self.state.lock().unwrap().connects.extend(script);
    }

    /// Scripts replies to upcoming actions. Unscripted actions are acked.
    pub fn reply_to_actions(&self, replies: &[Reply]) {
        self.state.lock().unwrap().replies.extend(replies);
    }

    pub fn ignore_pings(&self, ignore: bool) {
        self.state.lock().unwrap().ignore_pings = ignore;
    }

    /// Queues a server message.
    pub fn push(&self, msg: ServerMessage) {
        self.state.lock().unwrap().incoming.push_back(Some(msg));
        self.wake.notify_one();
    }

    /// Makes the server end the connection cleanly.
    pub fn close_from_server(&self) {
        self.state.lock().unwrap().incoming.push_back(None);
        self.wake.notify_one();
    }

    /// Breaks the connection so the next receive fails.
    pub fn drop_connection(&self) {
        self.state.lock().unwrap().connected = false;
        self.wake.notify_one();
    }

    pub fn connect_calls(&self) -> usize {
        self.state.lock().unwrap().tokens.len()
    }

    pub fn tokens(&self) -> Vec<String> {
        self.state.lock().unwrap().tokens.clone()
    }

    pub fn sent(&self) -> Vec<ClientMessage> {
        self.state.lock().unwrap().sent.clone()
    }

    pub fn joins(&self) -> Vec<Channel> {
        self.sent()
            .into_iter()
            .filter_map(|m| match m {
                ClientMessage::Join { channel } => Some(channel),
                _ => None,
            })
            .collect()
    }

    pub fn actions(&self) -> Vec<ActionId> {
        self.sent()
            .into_iter()
            .filter_map(|m| match m {
                ClientMessage::Action { action } => Some(action.id),
                _ => None,
            })
            .collect()
    }

    pub fn pings(&self) -> usize {
        self.sent()
            .iter()
            .filter(|m| matches!(m, ClientMessage::Ping { .. }))
            .count()
    }

    fn try_recv(&self) -> Option<TransportResult<Option<ServerMessage>>> {
        let mut state = self.state.lock().unwrap();
        if !state.connected {
            return Some(Err(TransportError::ReceiveFailed("connection dropped".into())));
        }
        match state.incoming.pop_front()? {
            Some(msg) => Some(Ok(Some(msg))),
            None => {
                state.connected = false;
                Some(Ok(None))
            }
        }
    }

    fn try_send(&self, msg: ClientMessage) -> TransportResult<()> {
        let mut state = self.state.lock().unwrap();
        if !state.connected {
            return Err(TransportError::ConnectionClosed);
        }
        match &msg {
            ClientMessage::Action { action } => {
                match state.replies.pop_front().unwrap_or(Reply::Ack) {
                    Reply::Ack => state
                        .incoming
                        .push_back(Some(ServerMessage::ack(action.id))),
                    Reply::Reject => state.incoming.push_back(Some(ServerMessage::rejected(
                        action.id,
                        "rejected by server",
                    ))),
                    Reply::Silent => {}
                    Reply::FailSend => {
                        state.connected = false;
                        return Err(TransportError::SendFailed("broken pipe".into()));
                    }
                }
            }
            ClientMessage::Ping { id } if !state.ignore_pings => {
                state.incoming.push_back(Some(ServerMessage::pong(*id)));
            }
            _ => {}
        }
        state.sent.push(msg);
        Ok(())
    }
}

impl Transport for MockTransport {
    fn connect<'a>(
        &'a mut self,
        _endpoint: &'a str,
        auth_token: &'a str,
        _query: &'a BTreeMap<String, String>,
    ) -> Pin<Box<dyn Future<Output = TransportResult<String>> + Send + 'a>> {
        let script = {
            let mut state = self.state.lock().unwrap();
            state.tokens.push(auth_token.to_string());
            state.connects.pop_front().unwrap_or(ConnectScript::Accept)
        };
        let shared = Arc::clone(&self.state);
        Box::pin(async move {
            match script {
                ConnectScript::Accept => {
                    let mut state = shared.lock().unwrap();
                    state.connected = true;
                    state.sessions += 1;
                    Ok(format!("mock-{}", state.sessions))
                }
                ConnectScript::Refuse => {
                    Err(TransportError::ConnectionFailed("connection refused".into()))
                }
                ConnectScript::RejectAuth => Err(TransportError::AuthRejected("HTTP 401".into())),
                ConnectScript::Hang => pending().await,
            }
        })
    }

    fn close(&mut self) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        self.state.lock().unwrap().connected = false;
        Box::pin(async { Ok(()) })
    }

    fn send(
        &mut self,
        msg: ClientMessage,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + '_>> {
        let result = self.try_send(msg);
        self.wake.notify_one();
        Box::pin(async move { result })
    }

    fn recv(
        &mut self,
    ) -> Pin<Box<dyn Future<Output = TransportResult<Option<ServerMessage>>> + Send + '_>> {
        Box::pin(async move {
            loop {
                if let Some(result) = self.try_recv() {
                    return result;
                }
                self.wake.notified().await;
            }
        })
    }

    fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }
}
