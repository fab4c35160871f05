use super::capture::cmd_capture;
use super::config::cmd_config;
use super::env::CliArgs;
use super::locate::cmd_locate;
use super::place::cmd_place;
use super::signature::cmd_signature;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::{Context, Result};

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    // `config` reports on invalid files itself
    if !matches!(cli.command, Commands::Config(_)) {
        ctx.config()
            .validate()
            .with_context(|| format!("invalid configuration {}", ctx.config_path().display()))?;
    }

    match cli.command.clone() {
        Commands::Capture(args) => cmd_capture(args, ctx).await,
        Commands::Locate(args) => cmd_locate(args, ctx).await,
        Commands::Signature(args) => cmd_signature(args, ctx).await,
        Commands::Place(args) => cmd_place(args, ctx).await,
        Commands::Config(args) => cmd_config(args, ctx).await,
    }
}
