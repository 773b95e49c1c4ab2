// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Offline queue for actions that could not be delivered.
//!
//! Actions are held in enqueue order and persisted through the
//! [`ActionStore`] after every mutation. On reconnect the queue is drained
//! strictly in order: each delivery is awaited before the next begins, and
//! the first network failure stops the drain with the failed action still
//! at the front.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;

use chrono::Utc;
use ts_core::{Action, ActionId, PendingAction};

use super::state::{ActionReport, SessionError};
use super::store::ActionStore;

/// Result of one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    /// The server acknowledged the action.
    Acked,
    /// The server refused the action for good.
    Rejected(String),
    /// Delivery failed at the network boundary; the action must be retried.
    Failed(SessionError),
}

/// Something that can deliver an action and wait for the server's verdict.
pub trait ActionSender: Send {
    fn deliver<'a>(
        &'a mut self,
        action: &'a Action,
    ) -> Pin<Box<dyn Future<Output = Delivery> + Send + 'a>>;
}

/// A definitive rejection seen during a drain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub id: ActionId,
    pub message: String,
}

/// Summary of one drain.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Acknowledged actions, in delivery order.
    pub flushed: Vec<ActionId>,
    /// Actions the server refused. They were removed.
    pub rejected: Vec<Rejection>,
    /// Actions that failed again after reaching the stuck threshold.
    pub stuck: Vec<(ActionId, u32)>,
    /// Every resolution above, in the order it happened.
    pub outcomes: Vec<ActionReport>,
    /// Actions left in the queue.
    pub remaining: usize,
    /// Why the drain ended early, if it did.
    pub stopped: Option<SessionError>,
}

impl DrainReport {
    /// Report for a drain that could not start.
    pub fn not_started(remaining: usize, reason: SessionError) -> Self {
        DrainReport {
            remaining,
            stopped: Some(reason),
            ..Default::default()
        }
    }

    pub fn is_complete(&self) -> bool {
        self.remaining == 0 && self.stopped.is_none()
    }
}

/// FIFO queue of pending actions backed by a durable store.
pub struct OfflineQueue {
    store: ActionStore,
    items: VecDeque<PendingAction>,
    /// Attempt count at which a failing action is reported as stuck. Zero disables.
    stuck_threshold: u32,
}

impl OfflineQueue {
    /// Opens a queue, loading whatever the store holds.
    pub fn open(store: ActionStore, stuck_threshold: u32) -> Self {
        let items: VecDeque<_> = store.load().into();
        if !items.is_empty() {
            tracing::info!(key = store.key(), pending = items.len(), "restored offline queue");
        }
        OfflineQueue {
            store,
            items,
            stuck_threshold,
        }
    }

    fn persist(&mut self) {
        let snapshot: Vec<PendingAction> = self.items.iter().cloned().collect();
        if let Err(e) = self.store.save(&snapshot) {
            // The in-memory queue stays authoritative
            tracing::warn!(key = self.store.key(), error = %e, "failed to persist offline queue");
        }
    }

    /// Appends an action. It is persisted before this returns.
    pub fn enqueue(&mut self, action: Action) -> ActionId {
        let id = action.id;
        if self.items.iter().any(|p| p.id() == id) {
            tracing::debug!(%id, "action already queued");
            return id;
        }
        self.items.push_back(PendingAction::new(action, Utc::now()));
        self.persist();
        tracing::debug!(%id, pending = self.items.len(), "action queued");
        id
    }

    /// A copy of the queue, front first.
    pub fn peek_all(&self) -> Vec<PendingAction> {
        self.items.iter().cloned().collect()
    }

    pub fn contains(&self, id: ActionId) -> bool {
        self.items.iter().any(|p| p.id() == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn stuck_threshold(&self) -> u32 {
        self.stuck_threshold
    }

    /// Removes an action resolved outside a drain, e.g. by a late ack.
    pub fn remove(&mut self, id: ActionId) -> Option<PendingAction> {
        let pos = self.items.iter().position(|p| p.id() == id)?;
        let removed = self.items.remove(pos);
        self.persist();
        removed
    }

    /// Drops every queued action.
    pub fn clear(&mut self) -> usize {
        let n = self.items.len();
        self.items.clear();
        self.persist();
        n
    }

    /// Delivers queued actions in order until the queue is empty or a
    /// delivery fails.
    pub async fn drain<S: ActionSender + ?Sized>(&mut self, sender: &mut S) -> DrainReport {
        let mut report = DrainReport::default();

        while let Some(front) = self.items.front_mut() {
            front.attempt_count = front.attempt_count.saturating_add(1);
            let attempts = front.attempt_count;
            let action = front.action.clone();
            self.persist();

            match sender.deliver(&action).await {
                Delivery::Acked => {
                    self.items.pop_front();
                    self.persist();
                    tracing::debug!(id = %action.id, "queued action delivered");
                    report.flushed.push(action.id);
                    report.outcomes.push(ActionReport::Delivered { id: action.id });
                }
                Delivery::Rejected(message) => {
                    self.items.pop_front();
                    self.persist();
                    tracing::warn!(id = %action.id, %message, "queued action rejected");
                    report.outcomes.push(ActionReport::Rejected {
                        id: action.id,
                        message: message.clone(),
                    });
                    report.rejected.push(Rejection {
                        id: action.id,
                        message,
                    });
                }
                Delivery::Failed(err) => {
                    if self.stuck_threshold > 0 && attempts >= self.stuck_threshold {
                        tracing::warn!(id = %action.id, attempts, "queued action is stuck");
                        report.stuck.push((action.id, attempts));
                        report.outcomes.push(ActionReport::Stuck {
                            id: action.id,
                            attempts,
                        });
                    }
                    report.stopped = Some(err);
                    break;
                }
            }
        }

        report.remaining = self.items.len();
        report
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
