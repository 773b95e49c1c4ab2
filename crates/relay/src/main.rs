// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! turnstile-relay: WebSocket relay server for the turnstile sync layer.
//!
//! This server holds the authoritative poll and admission state, answers
//! actions with ack or rejected, and pushes the resulting events to every
//! connection joined to the affected channel. With `--data` accepted actions
//! are logged and replayed on restart.

mod server;
mod state;
mod world;

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// turnstile-relay: Live event relay server
#[derive(Parser, Debug)]
#[command(name = "turnstile-relay")]
#[command(about = "WebSocket relay server for turnstile live events")]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "0.0.0.0:7890")]
    bind: SocketAddr,

    /// Directory for the action log (state is in-memory when omitted)
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Token clients must send in hello (any non-empty token when omitted)
    #[arg(short, long, env = "TURNSTILE_RELAY_TOKEN")]
    token: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting turnstile-relay");
    info!("  Bind address: {}", args.bind);
    match &args.data {
        Some(dir) => info!("  Data directory: {}", dir.display()),
        None => info!("  Data directory: none (in-memory)"),
    }
    if args.token.is_none() {
        info!("  Auth: any non-empty token");
    }

    let state = state::ServerState::new(args.data.as_deref(), args.token)?;

    tokio::select! {
        result = server::run(args.bind, state) => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down"),
    }

    Ok(())
}
