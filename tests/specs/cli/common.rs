// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test files,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]
#![allow(clippy::panic)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::net::TcpListener;
use std::path::PathBuf;

use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// The `turnstile` binary with an environment that cannot leak in from the
/// developer's shell.
pub fn turnstile() -> Command {
    #[allow(deprecated)]
    let mut cmd = Command::cargo_bin("turnstile").unwrap();
    cmd.env_remove("TURNSTILE_TOKEN")
        .env_remove("TURNSTILE_CONFIG")
        .env_remove("RUST_LOG")
        .env("NO_COLOR", "1");
    cmd
}

/// An isolated state directory plus an endpoint nothing listens on.
pub struct Sandbox {
    pub temp: TempDir,
    pub endpoint: String,
}

impl Sandbox {
    pub fn new() -> Self {
        Sandbox {
            temp: TempDir::new().unwrap(),
            endpoint: closed_endpoint(),
        }
    }

    pub fn state_dir(&self) -> PathBuf {
        self.temp.path().to_path_buf()
    }

    /// Command bound to this sandbox, without a token.
    pub fn cmd(&self) -> Command {
        let mut cmd = turnstile();
        cmd.env("TURNSTILE_STATE_DIR", self.temp.path())
            .arg("--endpoint")
            .arg(&self.endpoint);
        cmd
    }

    /// Command bound to this sandbox, with a token.
    pub fn authed(&self) -> Command {
        let mut cmd = self.cmd();
        cmd.env("TURNSTILE_TOKEN", "spec-token");
        cmd
    }

    /// Writes `<state_dir>/config.toml`.
    pub fn write_config(&self, content: &str) {
        std::fs::write(self.temp.path().join("config.toml"), content).unwrap();
    }

    /// Parsed `queue list -o json` for a stream.
    pub fn queued(&self, stream: &str) -> Vec<serde_json::Value> {
        let output = self
            .cmd()
            .args(["queue", "list", "-s", stream, "-o", "json"])
            .output()
            .unwrap();
        assert!(output.status.success(), "queue list failed: {output:?}");
        serde_json::from_slice(&output.stdout).unwrap()
    }
}

/// A `ws://` URL on a port that was free a moment ago, so connects are refused.
pub fn closed_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("ws://127.0.0.1:{port}")
}
