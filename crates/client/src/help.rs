// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Help text generation with colorization support.

use crate::colors;
use clap::builder::styling::Styles;

/// Generate clap Styles for help output.
pub fn styles() -> Styles {
    if !colors::should_colorize() {
        return Styles::plain();
    }

    use anstyle::{Ansi256Color, Color, Style};

    let header = Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(colors::codes::HEADER))));
    let literal = Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(colors::codes::LITERAL))));
    let context = Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(colors::codes::CONTEXT))));

    Styles::styled()
        .header(header)
        .usage(header)
        .literal(literal)
        .placeholder(context)
        .valid(context)
}

/// Main help template with colorized Options header.
pub fn template() -> String {
    format!(
        "{{about-with-newline}}
{{usage-heading}} {{usage}}

{{before-help}}{}
{{options}}{{after-help}}",
        colors::header("Options:")
    )
}

/// Commands list shown before options in main help.
pub fn commands() -> String {
    format!(
        "\
{header_live}
  {listen}      Connect and print events for channels
  {scan}        Scan a ticket (queued while offline)
  {vote}        Vote in a poll (queued while offline)
  {poll}        Open or close polls

{header_setup}
  {queue}       Inspect or flush the offline queue
  {config}      Show configuration
",
        header_live = colors::header("Live:"),
        header_setup = colors::header("Queue & Configuration:"),
        listen = colors::literal("listen"),
        scan = colors::literal("scan"),
        vote = colors::literal("vote"),
        poll = colors::literal("poll"),
        queue = colors::literal("queue"),
        config = colors::literal("config"),
    )
}

/// Quickstart help shown after options in main help.
pub fn quickstart() -> String {
    colors::examples(
        "\
Get started:
  turnstile listen poll-room:p1         Watch a poll live
  turnstile vote p1 yes                 Cast a vote
  turnstile scan t-42 --event evt_1     Scan a ticket at the door
  turnstile queue list                  Show actions waiting to be sent",
    )
}

#[cfg(test)]
#[path = "help_tests.rs"]
mod tests;
