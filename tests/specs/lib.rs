// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Behavioral specs for the `turnstile` CLI.
//!
//! The specs live in `cli/` and run as the `specs` test target of the
//! `turnstile` package, so that `assert_cmd` can locate the binary:
//!
//! ```text
//! cargo test -p turnstile --test specs
//! ```
