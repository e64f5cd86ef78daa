//! `OdysseyKit` CLI - Command-line interface for Odyssey engine file tools

pub mod commands;

use clap::Parser;
use commands::Commands;

#[derive(Parser)]
#[command(name = "odysseykit")]
#[command(about = "OdysseyKit: GFF, DLG, SSF and TLK tools for KotOR I/II", long_about = None)]
struct Cli {
    /// Most verbose log level written to stderr (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info")]
    log_level: tracing::Level,

    #[command(subcommand)]
    command: Commands,
}

/// Run the `OdysseyKit` CLI
///
/// # Errors
/// Returns an error if the selected command fails.
pub fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so tree and JSON output on stdout stay clean
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    cli.command.execute()?;

    Ok(())
}
