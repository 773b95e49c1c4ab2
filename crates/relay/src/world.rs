// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Authoritative state the relay applies actions to.
//!
//! Every action id gets exactly one verdict. Re-submitting an id returns the
//! recorded verdict without touching state, which is what makes client
//! retries after a lost acknowledgement safe.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use ts_core::action::{self, CreatePollPayload, PollRef, TicketRef, VotePayload};
use ts_core::event::{PollSnapshot, TicketScan, VoteTally};
use ts_core::{Action, ActionId, Channel, Event, EventKind};

/// The final answer for one action id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected(String),
}

/// Result of [`World::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// First sighting, accepted. The events describe the change.
    Accepted(Vec<Event>),
    /// First sighting, refused.
    Rejected(String),
    /// Seen before; nothing changed.
    Duplicate(Verdict),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poll {
    pub question: String,
    pub options: Vec<String>,
    pub tallies: BTreeMap<String, u64>,
    pub closed: bool,
}

impl Poll {
    fn tally(&self, poll_id: &str) -> VoteTally {
        VoteTally {
            poll_id: poll_id.to_string(),
            tallies: self.tallies.clone(),
        }
    }
}

#[derive(Debug, Default)]
pub struct World {
    verdicts: HashMap<ActionId, Verdict>,
    polls: BTreeMap<String, Poll>,
    admitted: BTreeMap<String, BTreeSet<String>>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verdict(&self, id: ActionId) -> Option<&Verdict> {
        self.verdicts.get(&id)
    }

    pub fn poll(&self, poll_id: &str) -> Option<&Poll> {
        self.polls.get(poll_id)
    }

    pub fn is_admitted(&self, event_id: &str, ticket_id: &str) -> bool {
        self.admitted
            .get(event_id)
            .is_some_and(|tickets| tickets.contains(ticket_id))
    }

    /// Applies an action once, recording its verdict.
    pub fn apply(&mut self, action: &Action, at: DateTime<Utc>) -> Applied {
        if let Some(verdict) = self.verdicts.get(&action.id) {
            return Applied::Duplicate(verdict.clone());
        }

        match self.evaluate(action, at) {
            Ok(events) => {
                self.verdicts.insert(action.id, Verdict::Accepted);
                Applied::Accepted(events)
            }
            Err(message) => {
                self.verdicts
                    .insert(action.id, Verdict::Rejected(message.clone()));
                Applied::Rejected(message)
            }
        }
    }

    fn evaluate(&mut self, action: &Action, at: DateTime<Utc>) -> Result<Vec<Event>, String> {
        match action.action_type.as_str() {
            action::SCAN => self.scan(payload(action)?, at),
            action::UNDO_SCAN => self.undo_scan(payload(action)?, at),
            action::VOTE => self.vote(payload(action)?),
            action::CREATE_POLL => self.create_poll(payload(action)?),
            action::CLOSE_POLL => self.close_poll(payload(action)?),
            other => Err(format!("unknown action type '{other}'")),
        }
    }

    fn scan(&mut self, t: TicketRef, at: DateTime<Utc>) -> Result<Vec<Event>, String> {
        let channel = event_room(&t.event_id)?;
        if self.is_admitted(&t.event_id, &t.ticket_id) {
            return Err(format!("ticket {} already scanned", t.ticket_id));
        }
        self.admitted
            .entry(t.event_id.clone())
            .or_default()
            .insert(t.ticket_id.clone());
        ticket_event(channel, EventKind::TicketScanned, t, at)
    }

    fn undo_scan(&mut self, t: TicketRef, at: DateTime<Utc>) -> Result<Vec<Event>, String> {
        let channel = event_room(&t.event_id)?;
        let removed = self
            .admitted
            .get_mut(&t.event_id)
            .is_some_and(|tickets| tickets.remove(&t.ticket_id));
        if !removed {
            return Err(format!("ticket {} was not scanned", t.ticket_id));
        }
        ticket_event(channel, EventKind::ScanUndone, t, at)
    }

    fn vote(&mut self, v: VotePayload) -> Result<Vec<Event>, String> {
        let channel = poll_room(&v.poll_id)?;
        let poll = self
            .polls
            .get_mut(&v.poll_id)
            .ok_or_else(|| format!("unknown poll {}", v.poll_id))?;
        if poll.closed {
            return Err(format!("poll {} is closed", v.poll_id));
        }
        let count = poll
            .tallies
            .get_mut(&v.option)
            .ok_or_else(|| format!("poll {} has no option '{}'", v.poll_id, v.option))?;
        *count += 1;
        event(channel, EventKind::VoteUpdate, &poll.tally(&v.poll_id))
    }

    fn create_poll(&mut self, p: CreatePollPayload) -> Result<Vec<Event>, String> {
        let channel = poll_room(&p.poll_id)?;
        if self.polls.contains_key(&p.poll_id) {
            return Err(format!("poll {} already exists", p.poll_id));
        }
        let distinct: BTreeSet<&String> = p.options.iter().collect();
        if distinct.len() < 2 || distinct.len() != p.options.len() {
            return Err("a poll needs at least two distinct options".to_string());
        }

        let poll = Poll {
            question: p.question.clone(),
            options: p.options.clone(),
            tallies: p.options.iter().map(|o| (o.clone(), 0)).collect(),
            closed: false,
        };
        self.polls.insert(p.poll_id.clone(), poll);

        let snapshot = PollSnapshot {
            poll_id: p.poll_id,
            question: p.question,
            options: p.options,
        };
        event(channel, EventKind::PollCreated, &snapshot)
    }

    fn close_poll(&mut self, p: PollRef) -> Result<Vec<Event>, String> {
        let channel = poll_room(&p.poll_id)?;
        let poll = self
            .polls
            .get_mut(&p.poll_id)
            .ok_or_else(|| format!("unknown poll {}", p.poll_id))?;
        if poll.closed {
            return Err(format!("poll {} is already closed", p.poll_id));
        }
        poll.closed = true;
        event(channel, EventKind::PollClosed, &poll.tally(&p.poll_id))
    }
}

fn payload<T: serde::de::DeserializeOwned>(action: &Action) -> Result<T, String> {
    action.payload_as().map_err(|e| e.to_string())
}

fn event_room(id: &str) -> Result<Channel, String> {
    Channel::event_room(id).map_err(|_| format!("invalid event id '{id}'"))
}

fn poll_room(id: &str) -> Result<Channel, String> {
    Channel::poll_room(id).map_err(|_| format!("invalid poll id '{id}'"))
}

fn event<T: serde::Serialize>(
    channel: Channel,
    kind: EventKind,
    body: &T,
) -> Result<Vec<Event>, String> {
    Event::with_body(channel, kind, body)
        .map(|e| vec![e])
        .map_err(|e| e.to_string())
}

fn ticket_event(
    channel: Channel,
    kind: EventKind,
    t: TicketRef,
    at: DateTime<Utc>,
) -> Result<Vec<Event>, String> {
    let body = TicketScan {
        event_id: t.event_id,
        ticket_id: t.ticket_id,
        at,
    };
    event(channel, kind, &body)
}

#[cfg(test)]
#[path = "world_tests.rs"]
mod tests;
