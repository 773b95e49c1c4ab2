// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

mod actions;
mod common;
mod config;
mod help;
mod listen;
mod queue;
