// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connection liveness tracking.
//!
//! While connected the session pings every `interval`. A tick that finds
//! the previous ping unanswered counts as a miss; one miss puts the
//! connection in the degraded sub-state, `max_missed` misses time it out.
//! Any inbound message proves the connection is alive and clears misses.

use std::future::pending;
use std::time::Duration;

use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Heartbeat parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeartbeatPolicy {
    /// Ping period. Zero disables the heartbeat.
    pub interval: Duration,
    pub max_missed: u32,
}

impl Default for HeartbeatPolicy {
    fn default() -> Self {
        HeartbeatPolicy {
            interval: Duration::from_secs(25),
            max_missed: 2,
        }
    }
}

/// Liveness after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeartbeatStatus {
    Healthy,
    /// Pings have gone unanswered but the connection is not yet declared dead.
    Degraded {
        missed: u32,
    },
    TimedOut,
}

pub struct Heartbeat {
    policy: HeartbeatPolicy,
    ticker: Option<Interval>,
    outstanding: Option<u64>,
    missed: u32,
    next_id: u64,
}

impl Heartbeat {
    pub fn new(policy: HeartbeatPolicy) -> Self {
        Heartbeat {
            policy,
            ticker: None,
            outstanding: None,
            missed: 0,
            next_id: 0,
        }
    }

    pub fn policy(&self) -> &HeartbeatPolicy {
        &self.policy
    }

    /// Starts ticking one interval from now.
    pub fn start(&mut self) {
        self.outstanding = None;
        self.missed = 0;
        self.ticker = if self.policy.interval.is_zero() {
            None
        } else {
            let mut ticker = interval_at(Instant::now() + self.policy.interval, self.policy.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            Some(ticker)
        };
    }

    pub fn stop(&mut self) {
        self.ticker = None;
        self.outstanding = None;
        self.missed = 0;
    }

    pub fn is_running(&self) -> bool {
        self.ticker.is_some()
    }

    /// Completes on the next tick. Pends forever while stopped.
    pub async fn tick(&mut self) {
        match self.ticker.as_mut() {
            Some(ticker) => {
                ticker.tick().await;
            }
            None => pending().await,
        }
    }

    /// Accounts for a tick. Returns the new status and, unless timed out,
    /// the id of the ping to send.
    pub fn on_tick(&mut self) -> (HeartbeatStatus, Option<u64>) {
        if self.outstanding.is_some() {
            self.missed = self.missed.saturating_add(1);
        }
        if self.missed >= self.policy.max_missed.max(1) {
            self.outstanding = None;
            return (HeartbeatStatus::TimedOut, None);
        }

        self.next_id = self.next_id.wrapping_add(1);
        self.outstanding = Some(self.next_id);
        let status = if self.missed == 0 {
            HeartbeatStatus::Healthy
        } else {
            HeartbeatStatus::Degraded {
                missed: self.missed,
            }
        };
        (status, Some(self.next_id))
    }

    /// Records a pong. Stale ids are ignored.
    pub fn on_pong(&mut self, id: u64) {
        if self.outstanding == Some(id) {
            self.outstanding = None;
            self.missed = 0;
        }
    }

    /// Records any other inbound message.
    pub fn on_traffic(&mut self) {
        self.outstanding = None;
        self.missed = 0;
    }

    pub fn missed(&self) -> u32 {
        self.missed
    }

    pub fn is_degraded(&self) -> bool {
        self.missed > 0
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
