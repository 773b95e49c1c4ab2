// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod action;
pub mod config;
pub mod listen;
pub mod queue;

use std::path::PathBuf;
use std::sync::Arc;

use crate::cli::GlobalArgs;
use crate::config::{resolve_config_path, state_dir, Config};
use crate::env;
use crate::error::{Error, Result};
use crate::sync::{
    ActionStore, FailureReason, KeyValueStore, OfflineQueue, Session, StaticToken,
    WebSocketTransport,
};

/// Everything a command needs: resolved config, paths and credentials.
#[derive(Debug, Clone)]
pub struct Context {
    pub config: Config,
    pub config_path: PathBuf,
    pub state_dir: PathBuf,
    token: Option<String>,
}

impl Context {
    /// Resolves the context from flags and the environment.
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        let state_dir = state_dir();
        let config_path = resolve_config_path(global.config.clone(), env::config_path(), &state_dir);
        Self::from_parts(global, state_dir, config_path, env::token())
    }

    fn from_parts(
        global: &GlobalArgs,
        state_dir: PathBuf,
        config_path: PathBuf,
        env_token: Option<String>,
    ) -> Result<Self> {
        let mut config = Config::load_or_default(&config_path)?;
        if let Some(endpoint) = &global.endpoint {
            config.endpoint = endpoint.clone();
            config.validate()?;
        }
        Ok(Context {
            config,
            config_path,
            state_dir,
            token: global.token.clone().or(env_token),
        })
    }

    pub fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn open_store(&self) -> Result<Box<dyn KeyValueStore>> {
        Ok(self.config.storage.open(&self.state_dir)?)
    }

    /// Opens the durable queue of a stream without connecting.
    pub fn open_queue(&self, stream: &str) -> Result<OfflineQueue> {
        let store = ActionStore::new(self.open_store()?, stream);
        Ok(OfflineQueue::open(store, self.config.stuck_threshold))
    }

    /// Builds an idle WebSocket session for a stream.
    pub fn session(&self, stream: &str) -> Result<Session<WebSocketTransport>> {
        let auth = Arc::new(StaticToken::new(self.token.clone()));
        Ok(Session::new(
            self.config.session_config(stream),
            WebSocketTransport::new(),
            auth,
            self.open_store()?,
        ))
    }
}

/// Maps a terminal session failure to a user-facing error.
pub fn failure_error(reason: FailureReason) -> Error {
    match reason {
        FailureReason::AuthMissing => Error::TokenMissing,
        other => Error::SessionFailed(other),
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
