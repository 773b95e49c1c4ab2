// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Durable storage for the offline action queue.
//!
//! The whole queue is stored as one JSON array under `queue:<stream>`.
//! Every save overwrites the previous value, so a reader sees either the
//! old queue or the new one.

use ts_core::PendingAction;

use super::kv::{KeyValueStore, StoreError, StoreResult};

/// Persists the pending actions of one stream.
pub struct ActionStore {
    kv: Box<dyn KeyValueStore>,
    key: String,
}

impl ActionStore {
    /// Creates a store for `stream` on top of a key/value backend.
    pub fn new(kv: Box<dyn KeyValueStore>, stream: &str) -> Self {
        ActionStore {
            kv,
            key: Self::key_for(stream),
        }
    }

    /// The backing key for a stream's queue.
    pub fn key_for(stream: &str) -> String {
        format!("queue:{stream}")
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Loads the persisted queue.
    ///
    /// A missing, unreadable or corrupt value yields an empty queue. The
    /// failure is logged, never returned.
    pub fn load(&self) -> Vec<PendingAction> {
        let raw = match self.kv.get(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "QueueCorrupt: failed to read queue, starting empty");
                return Vec::new();
            }
        };

        if raw.trim().is_empty() {
            return Vec::new();
        }

        match serde_json::from_str(&raw) {
            Ok(queue) => queue,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "QueueCorrupt: discarding unparsable queue");
                Vec::new()
            }
        }
    }

    /// Replaces the persisted queue.
    pub fn save(&mut self, queue: &[PendingAction]) -> StoreResult<()> {
        let json = serde_json::to_string(queue).map_err(StoreError::from)?;
        self.kv.set(&self.key, &json)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
