// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Reconnection scheduling with exponential backoff and jitter.
//!
//! The delay for attempt `n` (0-indexed) is
//! `min(base * 2^n, cap) + random(0..jitter)`. The scheduler owns at most
//! one timer; scheduling again replaces it and cancelling drops it, so a
//! cancelled timer can never fire.

use std::future::pending;
use std::pin::Pin;
use std::time::Duration;

use tokio::time::{Instant, Sleep};

/// Backoff parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub cap: Duration,
    /// Retry budget. Zero means unlimited.
    pub max_attempts: u32,
    /// Upper bound (exclusive) of the random delay added to every attempt.
    pub jitter: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy {
            base: Duration::from_millis(1000),
            cap: Duration::from_millis(30_000),
            max_attempts: 10,
            jitter: Duration::from_millis(1000),
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl BackoffPolicy {
    /// The un-jittered delay for attempt `n`.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let exp = millis(self.base).saturating_mul(1u64.checked_shl(attempt).unwrap_or(u64::MAX));
        Duration::from_millis(exp.min(millis(self.cap)))
    }

    /// The largest delay any attempt can produce.
    pub fn max_delay(&self) -> Duration {
        self.cap + self.jitter
    }

    /// Returns true once `attempt` retries have used up the budget.
    pub fn is_exhausted(&self, attempt: u32) -> bool {
        self.max_attempts != 0 && attempt >= self.max_attempts
    }
}

/// Owns the single outstanding reconnect timer.
pub struct ReconnectScheduler {
    policy: BackoffPolicy,
    attempt: u32,
    rng: fastrand::Rng,
    timer: Option<Pin<Box<Sleep>>>,
    last_delay: Option<Duration>,
}

impl ReconnectScheduler {
    pub fn new(policy: BackoffPolicy) -> Self {
        Self::with_rng(policy, fastrand::Rng::new())
    }

    /// Creates a scheduler whose jitter sequence is reproducible.
    pub fn with_seed(policy: BackoffPolicy, seed: u64) -> Self {
        Self::with_rng(policy, fastrand::Rng::with_seed(seed))
    }

    fn with_rng(policy: BackoffPolicy, rng: fastrand::Rng) -> Self {
        ReconnectScheduler {
            policy,
            attempt: 0,
            rng,
            timer: None,
            last_delay: None,
        }
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Number of retries scheduled since the last reset.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Delay chosen by the most recent `schedule`.
    pub fn last_delay(&self) -> Option<Duration> {
        self.last_delay
    }

    /// Returns true while a timer is armed.
    pub fn is_pending(&self) -> bool {
        self.timer.is_some()
    }

    /// Arms the timer for the next attempt, replacing any armed timer.
    ///
    /// Returns the chosen delay, or `None` once the retry budget is spent.
    pub fn schedule(&mut self) -> Option<Duration> {
        self.timer = None;
        if self.policy.is_exhausted(self.attempt) {
            return None;
        }

        let jitter_ms = millis(self.policy.jitter);
        let jitter = if jitter_ms == 0 {
            0
        } else {
            self.rng.u64(0..jitter_ms)
        };
        let delay = self.policy.base_delay(self.attempt) + Duration::from_millis(jitter);

        self.timer = Some(Box::pin(tokio::time::sleep(delay)));
        self.attempt = self.attempt.saturating_add(1);
        self.last_delay = Some(delay);
        Some(delay)
    }

    /// Drops the armed timer, if any.
    pub fn cancel(&mut self) {
        self.timer = None;
    }

    /// Cancels the timer and starts the next sequence from attempt 0.
    pub fn reset(&mut self) {
        self.cancel();
        self.attempt = 0;
        self.last_delay = None;
    }

    /// Makes an armed timer fire immediately.
    pub fn expedite(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            timer.as_mut().reset(Instant::now());
        }
    }

    /// Completes when the armed timer elapses. Pends forever if none is armed.
    ///
    /// Cancel safe: dropping the future leaves the timer armed.
    pub async fn fired(&mut self) {
        match self.timer.as_mut() {
            Some(timer) => {
                timer.as_mut().await;
                self.timer = None;
            }
            None => pending().await,
        }
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
