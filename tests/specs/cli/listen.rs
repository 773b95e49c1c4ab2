// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::common::*;

#[test]
fn listen_without_token_fails_fast() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["listen", "poll-room:p1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("status: failed: auth token missing"))
        .stderr(predicate::str::contains("error: no auth token"));
}

#[test]
fn listen_rejects_bad_channel() {
    let sandbox = Sandbox::new();
    sandbox
        .authed()
        .args(["listen", "lobby"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid channel"));
}

#[test]
fn listen_gives_up_after_retry_budget() {
    let sandbox = Sandbox::new();
    sandbox.write_config("[backoff]\nbase_ms = 10\ncap_ms = 20\njitter_ms = 0\nmax_attempts = 2\n");
    sandbox
        .authed()
        .args(["listen", "poll-room:p1"])
        .timeout(std::time::Duration::from_secs(20))
        .assert()
        .failure()
        .stderr(predicate::str::contains("reconnecting (attempt 1)"))
        .stderr(predicate::str::contains("error: session failed: reconnect attempts exhausted"));
}
