// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use ts_core::Action;

use crate::cli::PollCommand;
use crate::display;
use crate::error::{Error, Result};
use crate::sync::{ActionOutcome, SessionState};

use super::Context;

pub async fn scan(ctx: &Context, event: &str, ticket: &str, undo: bool, stream: &str) -> Result<()> {
    let action = if undo {
        Action::undo_scan(event, ticket)
    } else {
        Action::scan(event, ticket)
    };
    send(ctx, stream, action).await
}

pub async fn vote(ctx: &Context, poll: &str, option: &str, stream: &str) -> Result<()> {
    send(ctx, stream, Action::vote(poll, option)).await
}

pub async fn poll(ctx: &Context, cmd: PollCommand) -> Result<()> {
    match cmd {
        PollCommand::Create {
            poll,
            question,
            options,
            stream,
        } => send(ctx, &stream.stream, Action::create_poll(poll, question, options)).await,
        PollCommand::Close { poll, stream } => {
            send(ctx, &stream.stream, Action::close_poll(poll)).await
        }
    }
}

/// Makes one connect attempt and sends the action, or queues it.
///
/// Actions already queued for the stream are drained first, so the new one
/// never overtakes them.
async fn send(ctx: &Context, stream: &str, action: Action) -> Result<()> {
    let id = action.id.to_string();
    let mut session = ctx.session(stream)?;
    session.dispatcher_mut().on_action_report(|report| {
        println!("{}", display::format_report(report));
        Ok(())
    });

    session.connect(std::iter::empty()).await;
    if let SessionState::Failed { reason } = session.state() {
        tracing::warn!(%reason, "cannot connect, queueing action");
    }
    let outcome = session.send_action(action).await;
    session.disconnect().await;

    println!("{}", display::format_outcome(&id, &outcome));
    match outcome {
        ActionOutcome::Rejected(message) => Err(Error::ActionRejected { id, message }),
        ActionOutcome::Delivered | ActionOutcome::Queued => Ok(()),
    }
}
