// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server state management.
//!
//! Wraps the authoritative [`World`] and the optional action log for
//! thread-safe access, and fans accepted events out to connections.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use ts_core::{Action, Event};

use crate::world::{Applied, World};

const LOG_FILE: &str = "actions.jsonl";

/// One line of the action log. Only accepted actions are recorded.
#[derive(Debug, Serialize, Deserialize)]
struct LogEntry {
    at: DateTime<Utc>,
    action: Action,
}

/// Shared server state.
#[derive(Clone)]
pub struct ServerState {
    inner: Arc<ServerStateInner>,
}

struct ServerStateInner {
    /// Token clients must present. `None` accepts any non-empty token.
    token: Option<String>,
    world: Mutex<World>,
    log: Mutex<Option<File>>,
    /// Broadcast channel for notifying connections of new events.
    broadcast_tx: broadcast::Sender<Event>,
    next_session: AtomicU64,
}

impl ServerState {
    /// Creates server state. With a data directory, previously accepted
    /// actions are replayed from its log and new ones are appended.
    pub fn new(data_dir: Option<&Path>, token: Option<String>) -> io::Result<Self> {
        let mut world = World::new();
        let log = match data_dir {
            Some(dir) => {
                std::fs::create_dir_all(dir)?;
                let path = dir.join(LOG_FILE);
                let replayed = replay(&path, &mut world)?;
                if replayed > 0 {
                    info!("Replayed {} actions from {}", replayed, path.display());
                }
                Some(OpenOptions::new().create(true).append(true).open(&path)?)
            }
            None => None,
        };

        let (broadcast_tx, _) = broadcast::channel(1024);

        Ok(ServerState {
            inner: Arc::new(ServerStateInner {
                token,
                world: Mutex::new(world),
                log: Mutex::new(log),
                broadcast_tx,
                next_session: AtomicU64::new(1),
            }),
        })
    }

    /// Checks a `hello` token.
    pub fn authorize(&self, token: &str) -> bool {
        match &self.inner.token {
            Some(expected) => token == expected,
            None => !token.is_empty(),
        }
    }

    /// Allocates an id for a newly authenticated session.
    pub fn next_session_id(&self) -> String {
        let n = self.inner.next_session.fetch_add(1, Ordering::Relaxed);
        format!("conn-{n}")
    }

    /// Applies an action, logs it if accepted, then broadcasts its events.
    ///
    /// Duplicates are answered from the recorded verdict and broadcast nothing.
    pub async fn apply_action(&self, action: Action) -> io::Result<Applied> {
        let at = Utc::now();
        // Held until the events are out so log and broadcast order match apply order
        let mut world = self.inner.world.lock().await;
        let applied = world.apply(&action, at);

        if let Applied::Accepted(events) = &applied {
            self.append_log(&LogEntry { at, action }).await?;
            for event in events {
                // No receivers just means nobody is listening
                let _ = self.inner.broadcast_tx.send(event.clone());
            }
        }

        Ok(applied)
    }

    /// Subscribe to broadcast events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.inner.broadcast_tx.subscribe()
    }

    /// Runs `f` against the current world.
    #[cfg(test)]
    pub async fn inspect<R>(&self, f: impl FnOnce(&World) -> R) -> R {
        let world = self.inner.world.lock().await;
        f(&world)
    }

    async fn append_log(&self, entry: &LogEntry) -> io::Result<()> {
        let mut log = self.inner.log.lock().await;
        if let Some(file) = log.as_mut() {
            let line = serde_json::to_string(entry)?;
            writeln!(file, "{line}")?;
            file.flush()?;
        }
        Ok(())
    }
}

fn replay(path: &Path, world: &mut World) -> io::Result<usize> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut count = 0;
    for (n, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<LogEntry>(&line) {
            Ok(entry) => {
                world.apply(&entry.action, entry.at);
                count += 1;
            }
            Err(e) => warn!("Skipping corrupt log line {}: {}", n + 1, e),
        }
    }
    debug!("Replay finished with {} entries", count);
    Ok(count)
}
