// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use crate::cli::ConfigCommand;
use crate::error::Result;

use super::Context;

/// Execute a config subcommand.
pub fn run(ctx: &Context, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show => {
            print!("{}", ctx.config.to_toml()?);
        }
        ConfigCommand::Path => {
            println!("{}", ctx.config_path.display());
        }
    }
    Ok(())
}
