// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::common::*;

#[test]
fn show_defaults() {
    let sandbox = Sandbox::new();
    turnstile()
        .env("TURNSTILE_STATE_DIR", sandbox.state_dir())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("endpoint = \"ws://127.0.0.1:7890\""))
        .stdout(predicate::str::contains("[backoff]"))
        .stdout(predicate::str::contains("max_attempts = 10"))
        .stdout(predicate::str::contains("backend = \"file\""));
}

#[test]
fn show_reflects_file_and_endpoint_flag() {
    let sandbox = Sandbox::new();
    sandbox.write_config("stuck_threshold = 7\n\n[heartbeat]\ninterval_ms = 0\n");
    sandbox
        .cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "endpoint = \"{}\"",
            sandbox.endpoint
        )))
        .stdout(predicate::str::contains("stuck_threshold = 7"))
        .stdout(predicate::str::contains("interval_ms = 0"));
}

#[test]
fn path_defaults_to_state_dir() {
    let sandbox = Sandbox::new();
    let expected = sandbox.state_dir().join("config.toml");
    sandbox
        .cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(expected.display().to_string()));
}

#[test]
fn config_env_var_and_flag_precedence() {
    let sandbox = Sandbox::new();
    let from_env = sandbox.state_dir().join("env.toml");
    let from_flag = sandbox.state_dir().join("flag.toml");

    sandbox
        .cmd()
        .env("TURNSTILE_CONFIG", &from_env)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(from_env.display().to_string()));

    sandbox
        .cmd()
        .env("TURNSTILE_CONFIG", &from_env)
        .arg("--config")
        .arg(&from_flag)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains(from_flag.display().to_string()));
}

#[test]
fn invalid_endpoint_in_file_fails() {
    let sandbox = Sandbox::new();
    sandbox.write_config("endpoint = \"http://example.com\"\n");
    turnstile()
        .env("TURNSTILE_STATE_DIR", sandbox.state_dir())
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid endpoint"));
}

#[test]
fn malformed_config_fails() {
    let sandbox = Sandbox::new();
    sandbox.write_config("[backoff\n");
    turnstile()
        .env("TURNSTILE_STATE_DIR", sandbox.state_dir())
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse"));
}
