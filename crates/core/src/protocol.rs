// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol messages for client-server communication.
//!
//! The protocol is simple:
//! - Client opens with `hello`, then joins channels and submits actions
//! - Server answers `welcome`, pushes channel events and acks or rejects actions

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::action::{Action, ActionId};
use crate::channel::Channel;
use crate::event::Event;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Opens a session.
    ///
    /// Must be the first message on a connection; the server replies with
    /// `welcome` or an `auth_rejected` error.
    Hello {
        token: String,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        query: BTreeMap<String, String>,
    },

    /// Start receiving events for a channel. Joining twice is harmless.
    Join { channel: Channel },

    /// Stop receiving events for a channel.
    Leave { channel: Channel },

    /// Submit an action. The server answers `ack` or `rejected` with the same id.
    Action { action: Action },

    /// Ping message for keepalive.
    Ping {
        /// Client-chosen ID echoed in Pong.
        id: u64,
    },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Successful reply to `hello`.
    Welcome {
        /// Opaque id the server assigned to this session.
        session_id: String,
    },

    /// A pushed event on a joined channel.
    Event { event: Event },

    /// The action with this id was applied (or had already been applied).
    Ack { id: ActionId },

    /// The action with this id was refused and must not be retried.
    Rejected { id: ActionId, message: String },

    /// Pong response to client Ping.
    Pong {
        /// Echoed from the Ping message.
        id: u64,
    },

    /// The server is ending the session; the client may reconnect.
    Close { reason: String },

    /// Error message.
    Error {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<ErrorCode>,
        /// Human-readable error description.
        message: String,
    },
}

/// Machine-readable error category carried by [`ServerMessage::Error`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The `hello` token was refused.
    AuthRejected,
    /// A message arrived before `hello`.
    NotAuthenticated,
    /// The message could not be parsed.
    BadRequest,
    /// The server could not record the message; the client should retry later.
    Unavailable,
}

impl ClientMessage {
    /// Creates a Hello message.
    pub fn hello(token: impl Into<String>, query: BTreeMap<String, String>) -> Self {
        ClientMessage::Hello {
            token: token.into(),
            query,
        }
    }

    /// Creates a Join message.
    pub fn join(channel: Channel) -> Self {
        ClientMessage::Join { channel }
    }

    /// Creates a Leave message.
    pub fn leave(channel: Channel) -> Self {
        ClientMessage::Leave { channel }
    }

    /// Creates an Action message.
    pub fn action(action: Action) -> Self {
        ClientMessage::Action { action }
    }

    /// Creates a Ping message.
    pub fn ping(id: u64) -> Self {
        ClientMessage::Ping { id }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

impl ServerMessage {
    /// Creates a Welcome message.
    pub fn welcome(session_id: impl Into<String>) -> Self {
        ServerMessage::Welcome {
            session_id: session_id.into(),
        }
    }

    /// Creates an Event message.
    pub fn event(event: Event) -> Self {
        ServerMessage::Event { event }
    }

    /// Creates an Ack message.
    pub fn ack(id: ActionId) -> Self {
        ServerMessage::Ack { id }
    }

    /// Creates a Rejected message.
    pub fn rejected(id: ActionId, message: impl Into<String>) -> Self {
        ServerMessage::Rejected {
            id,
            message: message.into(),
        }
    }

    /// Creates a Pong message.
    pub fn pong(id: u64) -> Self {
        ServerMessage::Pong { id }
    }

    /// Creates a Close message.
    pub fn close(reason: impl Into<String>) -> Self {
        ServerMessage::Close {
            reason: reason.into(),
        }
    }

    /// Creates an Error message.
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: None,
            message: message.into(),
        }
    }

    /// Creates an Error message with a code.
    pub fn error_with_code(code: ErrorCode, message: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: Some(code),
            message: message.into(),
        }
    }

    /// Serializes the message to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes the message from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
