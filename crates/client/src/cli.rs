// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use ts_core::Channel;

use crate::colors;
use crate::help;

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

fn parse_channel(s: &str) -> Result<Channel, String> {
    s.parse().map_err(|e: ts_core::Error| e.to_string())
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "turnstile")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(disable_version_flag = true)]
#[command(about = "Live event and poll updates that survive a flaky network")]
#[command(
    long_about = "Live event and poll updates that survive a flaky network.\n\n\
    Keeps a session to a turnstile relay alive with backoff and heartbeats, and queues \
    scans and votes on disk while offline so they are sent, in order, once the relay is reachable."
)]
#[command(help_template = help::template())]
#[command(before_help = help::commands())]
#[command(after_help = help::quickstart())]
#[command(styles = help::styles())]
// Allow the unit type field pattern which is required for clap's ArgAction::Version/Help
#[allow(clippy::manual_non_exhaustive)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Print version
    #[arg(short = 'v', short_alias = 'V', long = "version", action = clap::ArgAction::Version)]
    version: (),

    #[command(subcommand)]
    pub command: Command,
}

/// Flags accepted by every command.
#[derive(Args, Clone, Debug, Default)]
pub struct GlobalArgs {
    /// Config file (default: $TURNSTILE_CONFIG or <state dir>/config.toml)
    #[arg(long, global = true, value_name = "path")]
    pub config: Option<PathBuf>,

    /// Relay URL, overriding the config file
    #[arg(long, global = true, value_name = "url")]
    pub endpoint: Option<String>,

    /// Auth token (default: $TURNSTILE_TOKEN)
    #[arg(long, global = true, value_name = "token", value_parser = non_empty_string)]
    pub token: Option<String>,

    /// Log debug output to stderr
    #[arg(long, global = true)]
    pub verbose: bool,
}

/// Selects the offline queue to use.
#[derive(Args, Clone, Debug)]
pub struct StreamArgs {
    /// Stream name; each stream has its own offline queue
    #[arg(long, short = 's', default_value = "default", value_parser = non_empty_string)]
    pub stream: String,
}

#[derive(Subcommand)]
pub enum Command {
    /// Connect and print events for channels until interrupted
    #[command(after_help = colors::examples("\
Examples:
  turnstile listen poll-room:p1                  Watch one poll
  turnstile listen event-room:evt_1 -s door-a    Watch check-ins at a door"))]
    Listen {
        /// Channels to join (kind:id)
        #[arg(required = true, value_parser = parse_channel)]
        channels: Vec<Channel>,

        #[command(flatten)]
        stream: StreamArgs,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Scan a ticket, or undo a scan
    #[command(after_help = colors::examples("\
Examples:
  turnstile scan t-42 --event evt_1           Admit ticket t-42
  turnstile scan t-42 --event evt_1 --undo    Revert a mistaken scan"))]
    Scan {
        /// Ticket id
        #[arg(value_parser = non_empty_string)]
        ticket: String,

        /// Event the ticket belongs to
        #[arg(long, short = 'e', value_parser = non_empty_string)]
        event: String,

        /// Undo a previous scan of the ticket
        #[arg(long)]
        undo: bool,

        #[command(flatten)]
        stream: StreamArgs,
    },

    /// Vote in a poll
    Vote {
        /// Poll id
        #[arg(value_parser = non_empty_string)]
        poll: String,

        /// Option to vote for
        #[arg(value_parser = non_empty_string)]
        option: String,

        #[command(flatten)]
        stream: StreamArgs,
    },

    /// Open or close polls
    #[command(subcommand)]
    Poll(PollCommand),

    /// Inspect or flush the offline queue
    #[command(subcommand)]
    Queue(QueueCommand),

    /// Show configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// Poll management commands.
#[derive(Subcommand)]
pub enum PollCommand {
    /// Open a new poll
    #[command(after_help = colors::examples("\
Examples:
  turnstile poll create p1 \"Lunch?\" pizza tacos    Open poll p1 with two options"))]
    Create {
        /// Poll id
        #[arg(value_parser = non_empty_string)]
        poll: String,

        /// Question shown to voters
        #[arg(value_parser = non_empty_string)]
        question: String,

        /// Options to choose from
        #[arg(required = true, num_args = 2..)]
        options: Vec<String>,

        #[command(flatten)]
        stream: StreamArgs,
    },

    /// Close a poll to further votes
    Close {
        /// Poll id
        #[arg(value_parser = non_empty_string)]
        poll: String,

        #[command(flatten)]
        stream: StreamArgs,
    },
}

/// Offline queue commands.
#[derive(Subcommand)]
pub enum QueueCommand {
    /// List actions waiting to be sent
    List {
        #[command(flatten)]
        stream: StreamArgs,

        /// Output format
        #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Text)]
        output: OutputFormat,
    },

    /// Connect once and send every queued action
    Drain {
        #[command(flatten)]
        stream: StreamArgs,
    },

    /// Discard every queued action
    Clear {
        #[command(flatten)]
        stream: StreamArgs,
    },
}

/// Configuration commands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration as TOML
    Show,

    /// Print the config file location
    Path,
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
