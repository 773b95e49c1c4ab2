// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! turnstile - resilient real-time sync for live events and polls.
//!
//! This crate provides the client side of the turnstile sync layer and the
//! `turnstile` CLI built on it.
//!
//! # Main Components
//!
//! - [`sync::Session`] - connection state machine with backoff, heartbeat
//!   and re-subscription
//! - [`sync::OfflineQueue`] - durable FIFO of actions taken while offline
//! - [`sync::EventDispatcher`] - typed fan-out of events and status
//! - [`Config`] - `turnstile.toml` settings
//! - [`Error`] - Error types for CLI operations
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use turnstile::sync::{FileStore, Session, SessionConfig, StaticToken, WebSocketTransport};
//!
//! let auth = Arc::new(StaticToken::new(Some(token)));
//! let store = Box::new(FileStore::open(state_dir.join("queue"))?);
//! let mut session = Session::new(SessionConfig::default(), WebSocketTransport::new(), auth, store);
//!
//! session.dispatcher_mut().on_any_event(|event| {
//!     println!("{event:?}");
//!     Ok(())
//! });
//! session.connect([Channel::poll_room("p1")?]).await;
//! session.run().await;
//! ```

mod cli;
pub mod colors;
mod commands;
mod display;
pub mod help;

pub mod board;
pub mod config;
pub mod env;
pub mod error;
pub mod sync;

pub use cli::{
    Cli, Command, ConfigCommand, GlobalArgs, OutputFormat, PollCommand, QueueCommand, StreamArgs,
};
pub use config::Config;
pub use error::{Error, Result};

use commands::Context;

/// Runs one CLI command to completion.
pub async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::load(&cli.global)?;
    match cli.command {
        Command::Listen {
            channels,
            stream,
            json,
        } => commands::listen::run(&ctx, channels, &stream.stream, json).await,
        Command::Scan {
            ticket,
            event,
            undo,
            stream,
        } => commands::action::scan(&ctx, &event, &ticket, undo, &stream.stream).await,
        Command::Vote {
            poll,
            option,
            stream,
        } => commands::action::vote(&ctx, &poll, &option, &stream.stream).await,
        Command::Poll(cmd) => commands::action::poll(&ctx, cmd).await,
        Command::Queue(cmd) => commands::queue::run(&ctx, cmd).await,
        Command::Config(cmd) => commands::config::run(&ctx, cmd),
    }
}
