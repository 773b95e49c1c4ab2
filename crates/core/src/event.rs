// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server-pushed events.
//!
//! Events are `{channel, type, body}` triples. The `type` is decoded into a
//! closed [`EventKind`] so listeners register against a typed key; kinds this
//! build does not know are preserved as [`EventKind::Other`].

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::channel::Channel;
use crate::error::{Error, Result};

/// The type of an inbound event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EventKind {
    PollCreated,
    VoteUpdate,
    PollClosed,
    PollDeleted,
    TicketScanned,
    ScanUndone,
    /// A kind not known to this build.
    Other(String),
}

impl EventKind {
    pub fn as_str(&self) -> &str {
        match self {
            EventKind::PollCreated => "poll_created",
            EventKind::VoteUpdate => "vote_update",
            EventKind::PollClosed => "poll_closed",
            EventKind::PollDeleted => "poll_deleted",
            EventKind::TicketScanned => "ticket_scanned",
            EventKind::ScanUndone => "scan_undone",
            EventKind::Other(kind) => kind,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl From<String> for EventKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "poll_created" => EventKind::PollCreated,
            "vote_update" => EventKind::VoteUpdate,
            "poll_closed" => EventKind::PollClosed,
            "poll_deleted" => EventKind::PollDeleted,
            "ticket_scanned" => EventKind::TicketScanned,
            "scan_undone" => EventKind::ScanUndone,
            _ => EventKind::Other(s),
        }
    }
}

impl From<EventKind> for String {
    fn from(kind: EventKind) -> Self {
        kind.as_str().to_string()
    }
}

/// A server-pushed notification on a channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub channel: Channel,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub body: serde_json::Value,
}

impl Event {
    pub fn new(channel: Channel, kind: EventKind, body: serde_json::Value) -> Self {
        Event {
            channel,
            kind,
            body,
        }
    }

    /// Builds an event from a typed body.
    pub fn with_body<T: Serialize>(channel: Channel, kind: EventKind, body: &T) -> Result<Self> {
        Ok(Event::new(channel, kind, serde_json::to_value(body)?))
    }

    /// Decodes the body into a typed struct.
    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_value(self.body.clone()).map_err(|e| Error::InvalidPayload {
            kind: self.kind.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Body of `poll_created`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSnapshot {
    pub poll_id: String,
    pub question: String,
    pub options: Vec<String>,
}

/// Body of `vote_update`: the full tally after the vote was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub poll_id: String,
    pub tallies: BTreeMap<String, u64>,
}

impl VoteTally {
    pub fn total(&self) -> u64 {
        self.tallies.values().sum()
    }
}

/// Body of `ticket_scanned` and `scan_undone`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketScan {
    pub event_id: String,
    pub ticket_id: String,
    pub at: DateTime<Utc>,
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
