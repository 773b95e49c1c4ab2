// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sending actions while the relay is unreachable.

#![allow(clippy::unwrap_used)]

use super::common::*;

#[test]
fn vote_offline_is_queued() {
    let sandbox = Sandbox::new();
    sandbox
        .authed()
        .args(["vote", "p1", "yes"])
        .assert()
        .success()
        .stdout(predicate::str::contains("queued"));

    let queued = sandbox.queued("default");
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0]["type"], "vote");
    assert_eq!(queued[0]["payload"]["poll_id"], "p1");
    assert_eq!(queued[0]["payload"]["option"], "yes");
}

#[test]
fn actions_queue_in_order() {
    let sandbox = Sandbox::new();
    for ticket in ["t-1", "t-2", "t-3"] {
        sandbox
            .authed()
            .args(["scan", ticket, "--event", "evt_1"])
            .assert()
            .success();
    }

    let tickets: Vec<_> = sandbox
        .queued("default")
        .iter()
        .map(|item| item["payload"]["ticket_id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(tickets, ["t-1", "t-2", "t-3"]);
}

#[test]
fn undo_scan_is_its_own_action() {
    let sandbox = Sandbox::new();
    sandbox
        .authed()
        .args(["scan", "t-9", "-e", "evt_1", "--undo"])
        .assert()
        .success();
    assert_eq!(sandbox.queued("default")[0]["type"], "undo_scan");
}

#[test]
fn action_without_token_is_still_queued() {
    let sandbox = Sandbox::new();
    sandbox
        .cmd()
        .args(["vote", "p1", "no"])
        .assert()
        .success()
        .stdout(predicate::str::contains("queued"));
    assert_eq!(sandbox.queued("default").len(), 1);
}

#[test]
fn streams_have_separate_queues() {
    let sandbox = Sandbox::new();
    sandbox
        .authed()
        .args(["scan", "t-1", "-e", "evt_1", "-s", "door-a"])
        .assert()
        .success();

    assert_eq!(sandbox.queued("door-a").len(), 1);
    assert!(sandbox.queued("door-b").is_empty());
    assert!(sandbox.queued("default").is_empty());
}

#[test]
fn poll_create_and_close_are_queued() {
    let sandbox = Sandbox::new();
    sandbox
        .authed()
        .args(["poll", "create", "p1", "Lunch?", "pizza", "tacos"])
        .assert()
        .success();
    sandbox
        .authed()
        .args(["poll", "close", "p1"])
        .assert()
        .success();

    let types: Vec<_> = sandbox
        .queued("default")
        .iter()
        .map(|item| item["type"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(types, ["create_poll", "close_poll"]);
}

#[test]
fn sqlite_backend_queues_too() {
    let sandbox = Sandbox::new();
    sandbox.write_config("[storage]\nbackend = \"sqlite\"\n");
    sandbox
        .authed()
        .args(["vote", "p1", "yes"])
        .assert()
        .success();

    assert!(sandbox.state_dir().join("queue.db").is_file());
    assert_eq!(sandbox.queued("default").len(), 1);
}
