// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The set of channels a session should be joined to.
//!
//! The registry is the source of truth for subscriptions and is
//! independent of connection state. After every (re)connect the session
//! joins everything returned by [`SubscriptionRegistry::reassert_all`].

use std::collections::BTreeSet;

use ts_core::Channel;

#[derive(Debug, Clone, Default)]
pub struct SubscriptionRegistry {
    channels: BTreeSet<Channel>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records interest in a channel. Returns true if it was not already present.
    pub fn subscribe(&mut self, channel: Channel) -> bool {
        self.channels.insert(channel)
    }

    /// Drops interest in a channel. Returns true if it was present.
    pub fn unsubscribe(&mut self, channel: &Channel) -> bool {
        self.channels.remove(channel)
    }

    /// Channels to join after a connection is (re)established, each once.
    pub fn reassert_all(&self) -> Vec<Channel> {
        self.channels.iter().cloned().collect()
    }

    pub fn contains(&self, channel: &Channel) -> bool {
        self.channels.contains(channel)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Channel> {
        self.channels.iter()
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
