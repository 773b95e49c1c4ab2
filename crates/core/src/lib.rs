// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! ts-core: Shared types for the turnstile sync layer
//!
//! This crate provides the channel, action and event data types and the
//! WebSocket wire protocol used by both the turnstile client and the relay.

pub mod action;
pub mod channel;
pub mod error;
pub mod event;
pub mod protocol;

pub use action::{Action, ActionId, PendingAction};
pub use channel::{Channel, ChannelKind};
pub use error::{Error, Result};
pub use event::{Event, EventKind};
pub use protocol::{ClientMessage, ErrorCode, ServerMessage};
