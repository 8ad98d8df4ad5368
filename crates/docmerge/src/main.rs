//! docmerge CLI - fill merge fields in WordprocessingML parts.
//!
//! Provides commands for:
//! - `fields`: List the merge fields found in a document part
//! - `merge`: Replace merge fields with values from a JSON file

mod commands;
mod error;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{FieldsArgs, MergeArgs};
use output::Output;

/// docmerge - Merge field filling for WordprocessingML.
#[derive(Parser)]
#[command(name = "docmerge", version, about)]
struct Cli {
    /// Enable verbose output (scan and merge logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List merge fields in a document part.
    Fields(FieldsArgs),
    /// Fill merge fields from a JSON data file.
    Merge(MergeArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Fields(args) => args.execute(),
        Commands::Merge(args) => args.execute(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output.error(&format!("Error: {err}"));
            ExitCode::FAILURE
        }
    }
}
