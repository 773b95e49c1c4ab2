// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Auth token collaborator.
//!
//! The session never issues tokens. It reads one before each connect and
//! asks the provider to forget it when the server refuses it.

use std::sync::{Mutex, PoisonError};

/// Supplies the bearer token for a session.
pub trait TokenProvider: Send + Sync {
    /// Returns the current token, or `None` if the user is signed out.
    fn token(&self) -> Option<String>;

    /// Forgets the current token after the server rejected it.
    fn clear_token(&self);
}

/// A token held in memory.
#[derive(Debug, Default)]
pub struct StaticToken {
    token: Mutex<Option<String>>,
}

impl StaticToken {
    /// Creates a provider holding `token`. An empty string counts as no token.
    pub fn new(token: Option<String>) -> Self {
        StaticToken {
            token: Mutex::new(token.filter(|t| !t.is_empty())),
        }
    }

    /// Replaces the held token.
    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        let mut slot = self.token.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = if token.is_empty() { None } else { Some(token) };
    }
}

impl TokenProvider for StaticToken {
    fn token(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn clear_token(&self) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

#[cfg(test)]
#[path = "auth_tests.rs"]
mod tests;
