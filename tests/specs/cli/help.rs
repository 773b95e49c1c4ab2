// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::common::*;
use yare::parameterized;

#[test]
fn help_lists_command_groups() {
    turnstile()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Live:"))
        .stdout(predicate::str::contains("listen"))
        .stdout(predicate::str::contains("Queue & Configuration:"))
        .stdout(predicate::str::contains("Get started:"));
}

#[parameterized(
    long = { "--version" },
    short = { "-v" },
    silent_alias = { "-V" },
)]
fn version_flag_outputs_version(flag: &str) {
    turnstile()
        .arg(flag)
        .assert()
        .success()
        .stdout(predicate::str::starts_with("turnstile "));
}

#[test]
fn no_subcommand_fails_with_usage() {
    turnstile()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[parameterized(
    listen = { "listen" },
    scan = { "scan" },
    queue = { "queue" },
)]
fn subcommand_help_succeeds(cmd: &str) {
    turnstile().args([cmd, "--help"]).assert().success();
}
