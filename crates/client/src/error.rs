// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::config::ConfigError;
use crate::sync::{FailureReason, SessionError, StoreError};

/// All possible errors that can occur in the turnstile library.
///
/// Errors provide user-friendly messages with hints for common issues.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid channel: '{0}'\n  hint: channels look like 'poll-room:p1' or 'event-room:evt_1'")]
    InvalidChannel(String),

    #[error("invalid action id: '{0}'")]
    InvalidActionId(String),

    #[error("invalid {kind} payload: {reason}")]
    InvalidPayload { kind: String, reason: String },

    #[error("no auth token\n  hint: pass --token or set TURNSTILE_TOKEN")]
    TokenMissing,

    #[error("could not reach {endpoint}: {reason}")]
    Unreachable { endpoint: String, reason: String },

    #[error("session failed: {0}")]
    SessionFailed(FailureReason),

    #[error("action {id} rejected: {message}")]
    ActionRejected { id: String, message: String },

    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for turnstile operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<ts_core::Error> for Error {
    fn from(e: ts_core::Error) -> Self {
        match e {
            ts_core::Error::InvalidChannel(s) => Error::InvalidChannel(s),
            ts_core::Error::InvalidActionId(s) => Error::InvalidActionId(s),
            ts_core::Error::InvalidPayload { kind, reason } => {
                Error::InvalidPayload { kind, reason }
            }
            ts_core::Error::Json(e) => Error::Json(e),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
