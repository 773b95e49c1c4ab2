// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::{Arc, Mutex, PoisonError};

use chrono::Utc;

use crate::cli::{OutputFormat, QueueCommand};
use crate::display;
use crate::error::{Error, Result};
use crate::sync::SessionState;

use super::{failure_error, Context};

/// Execute a queue subcommand.
pub async fn run(ctx: &Context, cmd: QueueCommand) -> Result<()> {
    match cmd {
        QueueCommand::List { stream, output } => list(ctx, &stream.stream, output),
        QueueCommand::Drain { stream } => drain(ctx, &stream.stream).await,
        QueueCommand::Clear { stream } => clear(ctx, &stream.stream),
    }
}

pub(crate) fn list(ctx: &Context, stream: &str, output: OutputFormat) -> Result<()> {
    let queue = ctx.open_queue(stream)?;
    let items = queue.peek_all();

    match output {
        OutputFormat::Text => {
            if items.is_empty() {
                println!("No queued actions.");
                return Ok(());
            }
            let now = Utc::now();
            for pending in &items {
                println!("{}", display::format_pending(pending, now));
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&items)?);
        }
    }
    Ok(())
}

pub(crate) fn clear(ctx: &Context, stream: &str) -> Result<()> {
    let mut queue = ctx.open_queue(stream)?;
    let cleared = queue.clear();
    let noun = if cleared == 1 { "action" } else { "actions" };
    println!("Cleared {cleared} queued {noun}.");
    Ok(())
}

/// Connects once; reaching `Connected` drains the queue.
async fn drain(ctx: &Context, stream: &str) -> Result<()> {
    let mut session = ctx.session(stream)?;
    let queued = session.queue().len();
    if queued == 0 {
        println!("No queued actions.");
        return Ok(());
    }

    let last_error = Arc::new(Mutex::new(None));
    let dispatcher = session.dispatcher_mut();
    dispatcher.on_action_report(|report| {
        println!("{}", display::format_report(report));
        Ok(())
    });
    let sink = Arc::clone(&last_error);
    dispatcher.on_status(move |update| {
        if let Some(reason) = &update.reason {
            *sink.lock().unwrap_or_else(PoisonError::into_inner) = Some(reason.to_string());
        }
        Ok(())
    });
    session.connect(std::iter::empty()).await;

    let state = session.state();
    let remaining = session.queue().len();
    let reason = last_error
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    session.disconnect().await;

    match state {
        SessionState::Failed { reason } => Err(failure_error(reason)),
        SessionState::Reconnecting { .. } if remaining == queued => Err(Error::Unreachable {
            endpoint: ctx.config.endpoint.clone(),
            reason: reason.unwrap_or_else(|| state.to_string()),
        }),
        _ => {
            println!(
                "Sent {} of {} queued actions, {} remaining.",
                queued - remaining,
                queued,
                remaining
            );
            Ok(())
        }
    }
}
