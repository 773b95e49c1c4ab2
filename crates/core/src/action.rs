// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! User-initiated actions that must reach the server.
//!
//! Every action carries a client-generated [`ActionId`] that stays the same
//! across retries, so the server can deduplicate resends of an action whose
//! acknowledgement was lost.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Action type for ticket scans.
pub const SCAN: &str = "scan";
/// Action type for undoing a ticket scan.
pub const UNDO_SCAN: &str = "undo_scan";
/// Action type for casting a vote.
pub const VOTE: &str = "vote";
/// Action type for opening a poll.
pub const CREATE_POLL: &str = "create_poll";
/// Action type for closing a poll.
pub const CLOSE_POLL: &str = "close_poll";

/// Stable, client-generated identifier for an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(Uuid);

impl ActionId {
    /// Generates a fresh random id.
    pub fn new() -> Self {
        ActionId(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        ActionId(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ActionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s)
            .map(ActionId)
            .map_err(|_| Error::InvalidActionId(s.to_string()))
    }
}

/// An outbound action as it appears on the wire: `{id, type, payload}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    #[serde(rename = "type")]
    pub action_type: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl Action {
    /// Creates an action with a fresh id.
    pub fn new(action_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Action {
            id: ActionId::new(),
            action_type: action_type.into(),
            payload,
        }
    }

    /// Creates a ticket scan action.
    pub fn scan(event_id: impl Into<String>, ticket_id: impl Into<String>) -> Self {
        Self::typed(
            SCAN,
            &TicketRef {
                event_id: event_id.into(),
                ticket_id: ticket_id.into(),
            },
        )
    }

    /// Creates an action that reverts a previous scan of the ticket.
    pub fn undo_scan(event_id: impl Into<String>, ticket_id: impl Into<String>) -> Self {
        Self::typed(
            UNDO_SCAN,
            &TicketRef {
                event_id: event_id.into(),
                ticket_id: ticket_id.into(),
            },
        )
    }

    /// Creates a vote action.
    pub fn vote(poll_id: impl Into<String>, option: impl Into<String>) -> Self {
        Self::typed(
            VOTE,
            &VotePayload {
                poll_id: poll_id.into(),
                option: option.into(),
            },
        )
    }

    /// Creates a poll-opening action.
    pub fn create_poll(
        poll_id: impl Into<String>,
        question: impl Into<String>,
        options: Vec<String>,
    ) -> Self {
        Self::typed(
            CREATE_POLL,
            &CreatePollPayload {
                poll_id: poll_id.into(),
                question: question.into(),
                options,
            },
        )
    }

    /// Creates a poll-closing action.
    pub fn close_poll(poll_id: impl Into<String>) -> Self {
        Self::typed(
            CLOSE_POLL,
            &PollRef {
                poll_id: poll_id.into(),
            },
        )
    }

    fn typed<T: Serialize>(action_type: &str, payload: &T) -> Self {
        // Plain structs of strings always serialize.
        let payload = serde_json::to_value(payload).unwrap_or(serde_json::Value::Null);
        Self::new(action_type, payload)
    }

    /// Decodes the payload into a typed struct.
    pub fn payload_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.payload.clone()).map_err(|e| Error::InvalidPayload {
            kind: self.action_type.clone(),
            reason: e.to_string(),
        })
    }
}

/// An action waiting in the offline queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PendingAction {
    #[serde(flatten)]
    pub action: Action,
    pub enqueued_at: DateTime<Utc>,
    #[serde(default)]
    pub attempt_count: u32,
}

impl PendingAction {
    /// Wraps an action that was just refused at the network boundary.
    pub fn new(action: Action, enqueued_at: DateTime<Utc>) -> Self {
        PendingAction {
            action,
            enqueued_at,
            attempt_count: 0,
        }
    }

    pub fn id(&self) -> ActionId {
        self.action.id
    }
}

/// Payload of `scan` and `undo_scan`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRef {
    pub event_id: String,
    pub ticket_id: String,
}

/// Payload of `vote`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VotePayload {
    pub poll_id: String,
    pub option: String,
}

/// Payload of `create_poll`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePollPayload {
    pub poll_id: String,
    pub question: String,
    pub options: Vec<String>,
}

/// Payload of `close_poll`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollRef {
    pub poll_id: String,
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
