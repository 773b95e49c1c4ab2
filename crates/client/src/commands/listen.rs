// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::{Arc, Mutex, PoisonError};

use ts_core::Channel;

use crate::board::Board;
use crate::colors;
use crate::display;
use crate::error::Result;
use crate::sync::SessionState;

use super::{failure_error, Context};

/// Joins `channels` and prints everything that arrives until Ctrl-C or the
/// session gives up.
pub async fn run(ctx: &Context, channels: Vec<Channel>, stream: &str, json: bool) -> Result<()> {
    let mut session = ctx.session(stream)?;
    let board = Arc::new(Mutex::new(Board::new()));
    let colorize = colors::should_colorize();

    let dispatcher = session.dispatcher_mut();
    dispatcher.on_any_event(move |event| {
        let mut board = board.lock().unwrap_or_else(PoisonError::into_inner);
        board.apply(event)?;
        if json {
            println!("{}", serde_json::to_string(event)?);
        } else {
            println!("{}", display::format_event(event, &board));
        }
        Ok(())
    });
    dispatcher.on_status(move |update| {
        eprintln!("{}", display::format_status(update, colorize));
        Ok(())
    });
    dispatcher.on_action_report(|report| {
        eprintln!("{}", display::format_report(report));
        Ok(())
    });

    let handle = session.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.disconnect();
        }
    });

    session.connect(channels).await;
    match session.run().await {
        SessionState::Failed { reason } => Err(failure_error(reason)),
        _ => Ok(()),
    }
}
