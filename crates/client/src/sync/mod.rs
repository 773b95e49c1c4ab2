// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Resilient real-time sync layer.
//!
//! Keeps a logical connection to a server-pushed event stream alive across
//! an unreliable network, and makes sure actions taken while offline reach
//! the server once it is reachable again.
//!
//! # Architecture
//!
//! ```text
//!                 ┌──────────────┐     ┌─────────────┐     ┌─────────────┐
//!   actions ─────►│   Session    │────►│  Transport  │────►│   Relay     │
//!                 │ (state mach.)│◄────│   (trait)   │◄────│   Server    │
//!                 └──────────────┘     └─────────────┘     └─────────────┘
//!                   │    │     │
//!          ┌────────┘    │     └──────────┐
//!          ▼             ▼                ▼
//!   ┌────────────┐ ┌────────────┐  ┌─────────────┐
//!   │ Scheduler  │ │  Registry  │  │ Dispatcher  │──► handlers
//!   │ (backoff)  │ │ (channels) │  │  (events)   │
//!   └────────────┘ └────────────┘  └─────────────┘
//!                        │
//!                        ▼
//!   ┌────────────┐ ┌────────────┐
//!   │   Queue    │►│   Store    │──► KeyValueStore (file / sqlite / memory)
//!   │ (offline)  │ │ (durable)  │
//!   └────────────┘ └────────────┘
//! ```
//!
//! # Features
//!
//! - Exponential backoff with jitter and a retry budget
//! - Heartbeat with a degraded sub-state before timeout
//! - Subscriptions re-joined after every reconnect
//! - Offline queue persisted after every mutation, drained FIFO
//! - Injectable transport, token provider and storage for testing

mod auth;
mod dispatcher;
mod heartbeat;
mod kv;
mod queue;
mod registry;
mod scheduler;
mod session;
mod state;
mod store;
mod transport;

pub use auth::{StaticToken, TokenProvider};
pub use dispatcher::{
    DispatchReport, EventDispatcher, HandlerError, HandlerResult, ListenerId, Topic,
};
pub use heartbeat::{Heartbeat, HeartbeatPolicy, HeartbeatStatus};
pub use kv::{FileStore, KeyValueStore, MemoryStore, SqliteStore, StoreError, StoreResult};
pub use queue::{ActionSender, Delivery, DrainReport, OfflineQueue, Rejection};
pub use registry::SubscriptionRegistry;
pub use scheduler::{BackoffPolicy, ReconnectScheduler};
pub use session::{Session, SessionConfig, SessionHandle, StepOutcome};
pub use state::{
    ActionOutcome, ActionReport, FailureReason, SessionError, SessionInfo, SessionState,
    StatusKind, StatusUpdate,
};
pub use store::ActionStore;
pub use transport::{Transport, TransportError, TransportResult, WebSocketTransport};

#[cfg(test)]
mod test_helpers;
