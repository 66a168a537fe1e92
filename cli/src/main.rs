// Copyright (c) 2026 Monocrat Contributors
// SPDX-License-Identifier: AGPL-3.0

//! # Monocrat CLI
//!
//! The `monocrat` binary runs the GitHub App webhook service and offers a
//! local, read-only view of what a release would rebuild.
//!
//! ## Commands
//!
//! - `monocrat serve` - Receive check-suite, check-run and deployment
//!   protection webhooks and drive the Lint / Release / Deploy check runs
//! - `monocrat plan --repo <dir> --before <sha> --after <sha>` - Print the
//!   build plan for a local checkout as JSON

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

mod commands;

use commands::{PlanCommand, ServeCommand};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Compact,
    Json,
}

/// Monocrat - change-aware CI for Go monorepos
#[derive(Parser)]
#[command(name = "monocrat")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, global = true, env = "MONOCRAT_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Log output format
    #[arg(long, global = true, env = "MONOCRAT_LOG_FORMAT", value_enum, default_value = "compact")]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook service
    Serve(ServeCommand),

    /// Resolve the build plan between two commits of a local repository
    Plan(PlanCommand),
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine; variables may come from the environment.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.log_format)?;

    match cli.command {
        Commands::Serve(command) => commands::serve::execute(command).await,
        Commands::Plan(command) => commands::plan::execute(command).await,
    }
}

/// Initialize tracing subscriber for logging
fn init_logging(level: &str, format: LogFormat) -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(level))
        .context("Failed to create log filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
    }

    Ok(())
}
