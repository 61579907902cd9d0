//! Flotilla CLI - Command-line interface
//!
//! Runs the addon server or a single aggregation from the terminal.

mod commands;

use clap::Parser;
use flotilla_core::tracing_setup::{CliLogLevel, init_tracing};

#[derive(Parser)]
#[command(name = "flotilla")]
#[command(about = "A Stremio addon aggregating streams from many sources")]
#[command(version)]
struct Cli {
    /// Console log level; the log file always records everything
    #[arg(long, value_enum, default_value_t = CliLogLevel::Info, global = true)]
    log_level: CliLogLevel,

    #[command(subcommand)]
    command: commands::Commands,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_level.as_tracing_level(), None)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {e}"))?;

    commands::handle_command(cli.command).await
}
