// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for ts-core operations.

use thiserror::Error;

/// All possible errors that can occur in ts-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid channel: '{0}'\n  hint: channels look like 'poll-room:p1' or 'event-room:evt_1'")]
    InvalidChannel(String),

    #[error("invalid action id: '{0}'")]
    InvalidActionId(String),

    #[error("invalid {kind} payload: {reason}")]
    InvalidPayload { kind: String, reason: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for ts-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
