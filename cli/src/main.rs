// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! # linkboards CLI
//!
//! The `linkboards` binary runs one board operation per invocation against
//! the configured local store, on behalf of the user named by `--user-id`.
//!
//! ## Commands
//!
//! - `linkboards board create|show|list|edit|delete`
//! - `linkboards invite create|accept|decline|delete|list`
//! - `linkboards member remove|edit`
//! - `linkboards link create|show|list|delete`
//! - `linkboards overview` - the caller's boards and invites together
//! - `linkboards config show|validate|generate`
//!
//! Results are printed as JSON on stdout; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

use linkboards_cli::commands::{
    self, BoardCommand, ConfigCommand, InviteCommand, LinkCommand, MemberCommand,
};
use linkboards_cli::embedded::EmbeddedBoards;
use linkboards_cli::output::{print_json, public, report_error};
use linkboards_core::application::RequestContext;
use linkboards_core::domain::config::LinkboardsConfig;
use linkboards_core::domain::user::User;

/// linkboards - shared link boards with members, roles and invites
#[derive(Parser)]
#[command(name = "linkboards")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (overrides discovery)
    #[arg(
        short,
        long,
        global = true,
        env = "LINKBOARDS_CONFIG_PATH",
        value_name = "FILE"
    )]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "LINKBOARDS_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Id of the user the command runs as
    #[arg(long, global = true, env = "LINKBOARDS_USER_ID", default_value = "")]
    user_id: String,

    /// Display name of the calling user (default: the user id)
    #[arg(long, global = true, env = "LINKBOARDS_USER_NAME")]
    user_name: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Board operations
    #[command(name = "board")]
    Board {
        #[command(subcommand)]
        command: BoardCommand,
    },

    /// Invite operations
    #[command(name = "invite")]
    Invite {
        #[command(subcommand)]
        command: InviteCommand,
    },

    /// Membership operations
    #[command(name = "member")]
    Member {
        #[command(subcommand)]
        command: MemberCommand,
    },

    /// Link operations
    #[command(name = "link")]
    Link {
        #[command(subcommand)]
        command: LinkCommand,
    },

    /// The caller's boards and pending invites
    #[command(name = "overview")]
    Overview,

    /// Configuration management
    #[command(name = "config")]
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = init_logging(&cli.log_level) {
        report_error(&err);
        std::process::exit(1);
    }

    if let Err(err) = run(cli).await {
        report_error(&err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    if let Commands::Config { command } = cli.command {
        return commands::config::handle_command(command, cli.config).await;
    }

    let config = LinkboardsConfig::load_or_default(cli.config)
        .context("Failed to load configuration")?;
    let boards = EmbeddedBoards::new(&config)?;

    let name = cli.user_name.unwrap_or_else(|| cli.user_id.clone());
    let ctx = RequestContext::new(User::new(cli.user_id, name));

    let result = match cli.command {
        Commands::Board { command } => commands::board::handle_command(command, &boards, &ctx).await,
        Commands::Invite { command } => commands::invite::handle_command(command, &boards, &ctx).await,
        Commands::Member { command } => commands::member::handle_command(command, &boards, &ctx).await,
        Commands::Link { command } => commands::link::handle_command(command, &boards, &ctx).await,
        Commands::Overview => match boards.access().boards_and_invites(&ctx).await {
            Ok(overview) => print_json(&overview),
            Err(err) => Err(public(err)),
        },
        Commands::Config { .. } => Ok(()),
    };

    let events = boards.shutdown().await?;
    debug!(published = events.len(), "Command finished");
    result
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    Ok(())
}
