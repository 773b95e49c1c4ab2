// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use std::path::PathBuf;

#[test]
fn test_vars_constants() {
    assert_eq!(vars::TURNSTILE_TOKEN, "TURNSTILE_TOKEN");
    assert_eq!(vars::TURNSTILE_STATE_DIR, "TURNSTILE_STATE_DIR");
    assert_eq!(vars::TURNSTILE_CONFIG, "TURNSTILE_CONFIG");
    assert_eq!(vars::XDG_STATE_HOME, "XDG_STATE_HOME");
    assert_eq!(vars::NO_COLOR, "NO_COLOR");
    assert_eq!(vars::COLOR, "COLOR");
}

#[test]
fn test_token() {
    std::env::remove_var("TURNSTILE_TOKEN");
    assert_eq!(token(), None);

    std::env::set_var("TURNSTILE_TOKEN", "");
    assert_eq!(token(), None);

    std::env::set_var("TURNSTILE_TOKEN", "secret");
    assert_eq!(token(), Some("secret".to_string()));
    std::env::remove_var("TURNSTILE_TOKEN");
}

#[test]
fn test_state_dir() {
    std::env::remove_var("TURNSTILE_STATE_DIR");
    assert_eq!(state_dir(), None);

    std::env::set_var("TURNSTILE_STATE_DIR", "/tmp/turnstile-test");
    assert_eq!(state_dir(), Some(PathBuf::from("/tmp/turnstile-test")));
    std::env::remove_var("TURNSTILE_STATE_DIR");
}

#[test]
fn test_config_path() {
    std::env::remove_var("TURNSTILE_CONFIG");
    assert_eq!(config_path(), None);

    std::env::set_var("TURNSTILE_CONFIG", "/etc/turnstile.toml");
    assert_eq!(config_path(), Some(PathBuf::from("/etc/turnstile.toml")));
    std::env::remove_var("TURNSTILE_CONFIG");
}

#[test]
fn test_xdg_state_home() {
    std::env::set_var("XDG_STATE_HOME", "/tmp/xdg-test");
    assert_eq!(xdg_state_home(), Some(PathBuf::from("/tmp/xdg-test")));
    std::env::remove_var("XDG_STATE_HOME");
    assert_eq!(xdg_state_home(), None);
}

#[test]
fn test_no_color() {
    std::env::set_var("NO_COLOR", "1");
    assert!(no_color());
    std::env::set_var("NO_COLOR", "true");
    assert!(!no_color());
    std::env::remove_var("NO_COLOR");
    assert!(!no_color());
}

#[test]
fn test_force_color() {
    std::env::set_var("COLOR", "1");
    assert!(force_color());
    std::env::set_var("COLOR", "yes");
    assert!(!force_color());
    std::env::remove_var("COLOR");
    assert!(!force_color());
}
