// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::common::*;

fn queue_one(sandbox: &Sandbox) {
    sandbox
        .authed()
        .args(["vote", "p1", "yes"])
        .assert()
        .success();
}

#[test]
fn empty_queue_list() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["queue", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No queued actions."));
}

#[test]
fn list_shows_type_and_attempts() {
    let sandbox = Sandbox::new();
    queue_one(&sandbox);
    sandbox
        .cmd()
        .args(["queue", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("vote"))
        .stdout(predicate::str::contains("attempts=0"));
}

#[test]
fn clear_empties_queue() {
    let sandbox = Sandbox::new();
    queue_one(&sandbox);
    queue_one(&sandbox);
    sandbox
        .cmd()
        .args(["queue", "clear"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Cleared 2 queued actions."));
    assert!(sandbox.queued("default").is_empty());
}

#[test]
fn drain_empty_queue_needs_no_relay() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["queue", "drain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No queued actions."));
}

#[test]
fn drain_unreachable_relay_fails_and_keeps_queue() {
    let sandbox = Sandbox::new();
    queue_one(&sandbox);
    sandbox
        .authed()
        .args(["queue", "drain"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: could not reach"));
    assert_eq!(sandbox.queued("default").len(), 1);
}

#[test]
fn drain_without_token_fails_with_hint() {
    let sandbox = Sandbox::new();
    queue_one(&sandbox);
    sandbox
        .cmd()
        .args(["queue", "drain"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("TURNSTILE_TOKEN"));
}

#[test]
fn corrupt_queue_file_reads_as_empty() {
    let sandbox = Sandbox::new();
    let dir = sandbox.state_dir().join("queue");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("queue.default.json"), "{not json").unwrap();

    sandbox
        .cmd()
        .args(["queue", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No queued actions."));
}
