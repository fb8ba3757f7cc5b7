//! Tubegrab CLI - Command-line interface
//!
//! Runs the web front-end or performs one-off lookups and downloads.

mod commands;

use std::path::PathBuf;

use clap::Parser;
use tubegrab_core::RuntimeMode;
use tubegrab_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "tubegrab")]
#[command(about = "Download videos or their audio track from a URL")]
struct Cli {
    /// Use real yt-dlp/ffmpeg (production) or offline fakes (development)
    #[arg(long, global = true, default_value = "production")]
    mode: RuntimeMode,

    /// Console log level
    #[arg(long, global = true, value_enum, default_value_t = CliLogLevel::Info)]
    log_level: CliLogLevel,

    /// Directory for the full trace log of the last run
    #[arg(long, global = true)]
    logs_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_tracing_level(), cli.logs_dir.as_deref())?;

    commands::handle_command(cli.command, cli.mode).await
}
