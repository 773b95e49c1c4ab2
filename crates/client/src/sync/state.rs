// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Session states, errors and the notifications derived from them.

use std::fmt;

use chrono::{DateTime, Utc};
use ts_core::ActionId;

/// Why a session gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    AuthMissing,
    AuthRejected,
    MaxAttemptsExceeded,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureReason::AuthMissing => "auth token missing",
            FailureReason::AuthRejected => "auth token rejected",
            FailureReason::MaxAttemptsExceeded => "reconnect attempts exhausted",
        };
        f.write_str(s)
    }
}

/// Externally visible connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Connected,
    /// Waiting for retry number `attempt` (1-based) to fire.
    Reconnecting {
        attempt: u32,
    },
    Failed {
        reason: FailureReason,
    },
}

impl SessionState {
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            SessionState::Connecting | SessionState::Connected | SessionState::Reconnecting { .. }
        )
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => f.write_str("idle"),
            SessionState::Connecting => f.write_str("connecting"),
            SessionState::Connected => f.write_str("connected"),
            SessionState::Reconnecting { attempt } => write!(f, "reconnecting (attempt {attempt})"),
            SessionState::Failed { reason } => write!(f, "failed: {reason}"),
        }
    }
}

/// Error taxonomy for the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No auth token is available.
    #[error("no auth token available")]
    AuthMissing,

    /// The server refused the auth token.
    #[error("auth token rejected: {0}")]
    AuthRejected(String),

    /// Connection refused, DNS failure, connect timeout, broken socket.
    #[error("transport unavailable: {0}")]
    TransportUnavailable(String),

    /// Pings went unanswered.
    #[error("heartbeat timed out")]
    HeartbeatTimeout,

    /// An action was sent but neither acked nor rejected in time.
    #[error("no acknowledgement within {0:?}")]
    AckTimeout(std::time::Duration),

    /// The server closed the session.
    #[error("server closed connection: {0}")]
    ServerClosed(String),

    /// The retry budget is spent.
    #[error("gave up after {attempts} reconnect attempts")]
    MaxAttemptsExceeded { attempts: u32 },

    /// The caller disconnected while the operation was in flight.
    #[error("disconnected")]
    Cancelled,
}

impl SessionError {
    /// Returns true if reconnecting may help.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            SessionError::AuthMissing
                | SessionError::AuthRejected(_)
                | SessionError::MaxAttemptsExceeded { .. }
                | SessionError::Cancelled
        )
    }
}

/// Coarse status reported to listeners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Connected,
    Disconnected,
    Error,
}

impl From<&SessionState> for StatusKind {
    fn from(state: &SessionState) -> Self {
        match state {
            SessionState::Connected => StatusKind::Connected,
            SessionState::Failed { .. } => StatusKind::Error,
            _ => StatusKind::Disconnected,
        }
    }
}

/// Emitted on every state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusUpdate {
    pub kind: StatusKind,
    pub state: SessionState,
    pub reason: Option<SessionError>,
}

impl StatusUpdate {
    pub fn new(state: SessionState, reason: Option<SessionError>) -> Self {
        StatusUpdate {
            kind: StatusKind::from(&state),
            state,
            reason,
        }
    }
}

/// Bookkeeping about the current connection lifecycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInfo {
    pub session_id: Option<String>,
    pub last_connected_at: Option<DateTime<Utc>>,
    pub consecutive_failures: u32,
    pub reconnect_attempt: u32,
}

/// Immediate result of `send_action`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The server acknowledged the action.
    Delivered,
    /// The action is in the offline queue and will be retried.
    Queued,
    /// The server refused the action; it will not be retried.
    Rejected(String),
}

/// Per-action notification for actions resolved outside `send_action`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionReport {
    Delivered { id: ActionId },
    Rejected { id: ActionId, message: String },
    /// Still queued after repeated failed deliveries.
    Stuck { id: ActionId, attempts: u32 },
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
