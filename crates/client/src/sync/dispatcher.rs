// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-out of inbound events and session notifications to handlers.
//!
//! Handlers are keyed by a typed [`Topic`]. Delivery is synchronous and in
//! arrival order. For an event, handlers registered for its kind run first,
//! then wildcard handlers, each group in registration order.
//!
//! A handler that returns `Err` or panics is logged and counted; later
//! handlers still run.

use std::panic::{catch_unwind, AssertUnwindSafe};

use ts_core::{Event, EventKind};

use super::state::{ActionReport, StatusUpdate};

/// Error type handlers may return.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Result type for handlers.
pub type HandlerResult = Result<(), HandlerError>;

type EventHandler = Box<dyn FnMut(&Event) -> HandlerResult + Send>;
type StatusHandler = Box<dyn FnMut(&StatusUpdate) -> HandlerResult + Send>;
type ReportHandler = Box<dyn FnMut(&ActionReport) -> HandlerResult + Send>;

/// What a listener is registered for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Topic {
    /// Events of one kind.
    Event(EventKind),
    /// Every event.
    AnyEvent,
    ConnectionStatus,
    ActionReport,
}

/// Handle returned on registration, used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

/// Outcome of one emit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers that returned `Ok`.
    pub delivered: usize,
    /// Handlers that returned `Err` or panicked.
    pub failed: usize,
}

struct Listener<H> {
    id: ListenerId,
    topic: Topic,
    handler: H,
}

#[derive(Default)]
pub struct EventDispatcher {
    next_id: u64,
    events: Vec<Listener<EventHandler>>,
    status: Vec<Listener<StatusHandler>>,
    reports: Vec<Listener<ReportHandler>>,
}

/// Runs one handler, converting errors and panics into a failure count.
fn invoke(topic: &Topic, report: &mut DispatchReport, call: impl FnOnce() -> HandlerResult) {
    match catch_unwind(AssertUnwindSafe(call)) {
        Ok(Ok(())) => report.delivered += 1,
        Ok(Err(e)) => {
            tracing::warn!(?topic, error = %e, "handler failed");
            report.failed += 1;
        }
        Err(panic) => {
            let msg = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            tracing::warn!(?topic, panic = %msg, "handler panicked");
            report.failed += 1;
        }
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate(&mut self) -> ListenerId {
        self.next_id += 1;
        ListenerId(self.next_id)
    }

    /// Registers a handler for events of one kind.
    pub fn on_event<F>(&mut self, kind: EventKind, handler: F) -> ListenerId
    where
        F: FnMut(&Event) -> HandlerResult + Send + 'static,
    {
        let id = self.allocate();
        self.events.push(Listener {
            id,
            topic: Topic::Event(kind),
            handler: Box::new(handler),
        });
        id
    }

    /// Registers a handler for every event.
    pub fn on_any_event<F>(&mut self, handler: F) -> ListenerId
    where
        F: FnMut(&Event) -> HandlerResult + Send + 'static,
    {
        let id = self.allocate();
        self.events.push(Listener {
            id,
            topic: Topic::AnyEvent,
            handler: Box::new(handler),
        });
        id
    }

    pub fn on_status<F>(&mut self, handler: F) -> ListenerId
    where
        F: FnMut(&StatusUpdate) -> HandlerResult + Send + 'static,
    {
        let id = self.allocate();
        self.status.push(Listener {
            id,
            topic: Topic::ConnectionStatus,
            handler: Box::new(handler),
        });
        id
    }

    pub fn on_action_report<F>(&mut self, handler: F) -> ListenerId
    where
        F: FnMut(&ActionReport) -> HandlerResult + Send + 'static,
    {
        let id = self.allocate();
        self.reports.push(Listener {
            id,
            topic: Topic::ActionReport,
            handler: Box::new(handler),
        });
        id
    }

    /// Unregisters a listener. Returns false if the id is unknown.
    pub fn off(&mut self, id: ListenerId) -> bool {
        let before = self.len();
        self.events.retain(|l| l.id != id);
        self.status.retain(|l| l.id != id);
        self.reports.retain(|l| l.id != id);
        self.len() != before
    }

    fn len(&self) -> usize {
        self.events.len() + self.status.len() + self.reports.len()
    }

    /// Number of listeners registered for exactly this topic.
    pub fn listener_count(&self, topic: &Topic) -> usize {
        let topics = self
            .events
            .iter()
            .map(|l| &l.topic)
            .chain(self.status.iter().map(|l| &l.topic))
            .chain(self.reports.iter().map(|l| &l.topic));
        topics.filter(|t| *t == topic).count()
    }

    /// Delivers an inbound event.
    pub fn emit(&mut self, event: &Event) -> DispatchReport {
        let mut report = DispatchReport::default();
        let kind_topic = Topic::Event(event.kind.clone());

        for listener in self.events.iter_mut().filter(|l| l.topic == kind_topic) {
            invoke(&listener.topic, &mut report, || (listener.handler)(event));
        }
        for listener in self.events.iter_mut().filter(|l| l.topic == Topic::AnyEvent) {
            invoke(&listener.topic, &mut report, || (listener.handler)(event));
        }

        tracing::debug!(channel = %event.channel, kind = %event.kind, ?report, "event dispatched");
        report
    }

    /// Delivers a connection status change.
    pub fn emit_status(&mut self, update: &StatusUpdate) -> DispatchReport {
        let mut report = DispatchReport::default();
        for listener in &mut self.status {
            invoke(&listener.topic, &mut report, || (listener.handler)(update));
        }
        report
    }

    /// Delivers the resolution of a queued action.
    pub fn emit_action_report(&mut self, action: &ActionReport) -> DispatchReport {
        let mut report = DispatchReport::default();
        for listener in &mut self.reports {
            invoke(&listener.topic, &mut report, || (listener.handler)(action));
        }
        report
    }
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
