// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Live view of polls and admissions built from inbound events.
//!
//! The board is plain application state: it is only ever updated from a
//! dispatcher handler and knows nothing about connections.

use std::collections::{BTreeMap, BTreeSet};

use ts_core::action::PollRef;
use ts_core::event::{PollSnapshot, TicketScan, VoteTally};
use ts_core::{Event, EventKind, Result};

/// One poll as last reported by the relay.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollView {
    pub question: String,
    pub options: Vec<String>,
    pub tallies: BTreeMap<String, u64>,
    pub closed: bool,
}

impl PollView {
    pub fn total(&self) -> u64 {
        self.tallies.values().sum()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Board {
    polls: BTreeMap<String, PollView>,
    admitted: BTreeMap<String, BTreeSet<String>>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one event into the board. Events of unknown kinds are ignored.
    pub fn apply(&mut self, event: &Event) -> Result<()> {
        match &event.kind {
            EventKind::PollCreated => {
                let snapshot: PollSnapshot = event.body_as()?;
                let view = self.polls.entry(snapshot.poll_id).or_default();
                view.question = snapshot.question;
                view.options = snapshot.options;
            }
            EventKind::VoteUpdate => {
                let tally: VoteTally = event.body_as()?;
                self.polls.entry(tally.poll_id).or_default().tallies = tally.tallies;
            }
            EventKind::PollClosed => {
                let tally: VoteTally = event.body_as()?;
                let view = self.polls.entry(tally.poll_id).or_default();
                view.tallies = tally.tallies;
                view.closed = true;
            }
            EventKind::PollDeleted => {
                let poll: PollRef = event.body_as()?;
                self.polls.remove(&poll.poll_id);
            }
            EventKind::TicketScanned => {
                let scan: TicketScan = event.body_as()?;
                self.admitted
                    .entry(scan.event_id)
                    .or_default()
                    .insert(scan.ticket_id);
            }
            EventKind::ScanUndone => {
                let scan: TicketScan = event.body_as()?;
                if let Some(tickets) = self.admitted.get_mut(&scan.event_id) {
                    tickets.remove(&scan.ticket_id);
                }
            }
            EventKind::Other(kind) => {
                tracing::debug!(%kind, "ignoring unknown event kind");
            }
        }
        Ok(())
    }

    pub fn poll(&self, poll_id: &str) -> Option<&PollView> {
        self.polls.get(poll_id)
    }

    /// Number of tickets currently admitted to an event.
    pub fn admitted(&self, event_id: &str) -> usize {
        self.admitted.get(event_id).map_or(0, BTreeSet::len)
    }

    pub fn is_admitted(&self, event_id: &str, ticket_id: &str) -> bool {
        self.admitted
            .get(event_id)
            .is_some_and(|tickets| tickets.contains(ticket_id))
    }
}

#[cfg(test)]
#[path = "board_tests.rs"]
mod tests;
