// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Human-readable rendering of events, status and queue entries.

use chrono::{DateTime, Utc};
use ts_core::{Event, EventKind, PendingAction};

use crate::board::Board;
use crate::colors;
use crate::sync::{ActionOutcome, ActionReport, SessionState, StatusKind, StatusUpdate};

/// One line for an inbound event, with the board's view after applying it.
pub fn format_event(event: &Event, board: &Board) -> String {
    let summary = match event.kind {
        EventKind::PollCreated | EventKind::VoteUpdate | EventKind::PollClosed => {
            poll_summary(event, board)
        }
        EventKind::TicketScanned | EventKind::ScanUndone => event
            .body
            .get("event_id")
            .and_then(|id| id.as_str())
            .map(|event_id| format!("{} admitted", board.admitted(event_id))),
        _ => None,
    };
    match summary {
        Some(summary) => format!("[{}] {}  {}", event.channel, event.kind, summary),
        None => format!("[{}] {}", event.channel, event.kind),
    }
}

fn poll_summary(event: &Event, board: &Board) -> Option<String> {
    let poll_id = event.body.get("poll_id")?.as_str()?;
    let poll = board.poll(poll_id)?;
    let tallies: Vec<String> = poll
        .options
        .iter()
        .map(|o| format!("{}={}", o, poll.tallies.get(o).copied().unwrap_or(0)))
        .collect();
    let closed = if poll.closed { " (closed)" } else { "" };
    Some(format!("{}{}", tallies.join(" "), closed))
}

/// Status line, colored by connection health.
pub fn format_status(update: &StatusUpdate, colorize: bool) -> String {
    let mut line = format!("status: {}", update.state);
    if let Some(reason) = &update.reason {
        line.push_str(&format!(" ({reason})"));
    }
    if !colorize {
        return line;
    }
    match (update.kind, update.state) {
        (StatusKind::Connected, _) => colors::good(&line),
        (StatusKind::Error, _) => colors::bad(&line),
        (_, SessionState::Reconnecting { .. }) => colors::warn(&line),
        _ => colors::context(&line),
    }
}

pub fn format_report(report: &ActionReport) -> String {
    match report {
        ActionReport::Delivered { id } => format!("delivered {id}"),
        ActionReport::Rejected { id, message } => format!("rejected {id}: {message}"),
        ActionReport::Stuck { id, attempts } => {
            format!("stuck {id}: still queued after {attempts} attempts")
        }
    }
}

pub fn format_outcome(id: &str, outcome: &ActionOutcome) -> String {
    match outcome {
        ActionOutcome::Delivered => format!("delivered {id}"),
        ActionOutcome::Queued => format!("queued {id} (will send when online)"),
        ActionOutcome::Rejected(message) => format!("rejected {id}: {message}"),
    }
}

/// One row of `queue list`.
pub fn format_pending(pending: &PendingAction, now: DateTime<Utc>) -> String {
    format!(
        "{}  {:<11} attempts={}  queued {} ago",
        pending.id(),
        pending.action.action_type,
        pending.attempt_count,
        format_age(now - pending.enqueued_at)
    )
}

fn format_age(age: chrono::Duration) -> String {
    let secs = age.num_seconds().max(0);
    match secs {
        s if s < 60 => format!("{s}s"),
        s if s < 3_600 => format!("{}m", s / 60),
        s if s < 86_400 => format!("{}h", s / 3_600),
        s => format!("{}d", s / 86_400),
    }
}

#[cfg(test)]
#[path = "display_tests.rs"]
mod tests;
