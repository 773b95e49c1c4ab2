// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Logical channels a session can be joined to.
//!
//! A channel is a `(kind, id)` pair rendered as `kind:id`, for example
//! `poll-room:p1` or `event-room:evt_1`. On the wire channels are plain
//! strings; parsing validates both halves.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The kind half of a channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ChannelKind {
    /// Live updates for one ticketed event (scans, check-ins).
    EventRoom,
    /// Live updates for one poll (creation, tallies, closing).
    PollRoom,
    /// Any other kebab-case kind the server understands.
    Other(String),
}

impl ChannelKind {
    /// Returns the wire spelling of this kind.
    pub fn as_str(&self) -> &str {
        match self {
            ChannelKind::EventRoom => "event-room",
            ChannelKind::PollRoom => "poll-room",
            ChannelKind::Other(kind) => kind,
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ChannelKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let valid = !s.is_empty()
            && !s.starts_with('-')
            && s.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
        if !valid {
            return Err(Error::InvalidChannel(s.to_string()));
        }
        Ok(match s {
            "event-room" => ChannelKind::EventRoom,
            "poll-room" => ChannelKind::PollRoom,
            other => ChannelKind::Other(other.to_string()),
        })
    }
}

/// A logical topic the session subscribes to for push updates.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Channel {
    kind: ChannelKind,
    id: String,
}

impl Channel {
    /// Creates a channel, validating the id.
    pub fn new(kind: ChannelKind, id: impl Into<String>) -> Result<Self> {
        let id = id.into();
        if id.is_empty() || id.chars().any(char::is_whitespace) {
            return Err(Error::InvalidChannel(format!("{}:{}", kind, id)));
        }
        Ok(Channel { kind, id })
    }

    /// Creates an `event-room:<id>` channel.
    pub fn event_room(id: impl Into<String>) -> Result<Self> {
        Self::new(ChannelKind::EventRoom, id)
    }

    /// Creates a `poll-room:<id>` channel.
    pub fn poll_room(id: impl Into<String>) -> Result<Self> {
        Self::new(ChannelKind::PollRoom, id)
    }

    pub fn kind(&self) -> &ChannelKind {
        &self.kind
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl FromStr for Channel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (kind, id) = s
            .split_once(':')
            .ok_or_else(|| Error::InvalidChannel(s.to_string()))?;
        let kind: ChannelKind = kind
            .parse()
            .map_err(|_| Error::InvalidChannel(s.to_string()))?;
        Channel::new(kind, id).map_err(|_| Error::InvalidChannel(s.to_string()))
    }
}

impl TryFrom<String> for Channel {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<Channel> for String {
    fn from(channel: Channel) -> Self {
        channel.to_string()
    }
}

#[cfg(test)]
#[path = "channel_tests.rs"]
mod tests;
