//! # langnet CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use langnet_cli::codec::{run_decode, run_encode, CodecArgs};
use langnet_cli::conformance::{run_conformance, ConformanceArgs};
use langnet_cli::inspect::{run_inspect, InspectArgs};
use langnet_cli::samples::{run_write_samples, WriteSamplesArgs};
use langnet_cli::{load_registry, EXIT_ERROR};

/// LangNet message tool.
///
/// Encodes and decodes LangNet messages in the binary wire format and the
/// JSON text form, and checks other implementations against this one.
#[derive(Parser, Debug)]
#[command(name = "langnet", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Schema descriptor (YAML, or JSON by extension). Defaults to the
    /// built-in LangNet schema.
    #[arg(long, global = true)]
    schema: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Read a message in JSON form and write it as a payload.
    Encode(CodecArgs),

    /// Read a payload and write the message in JSON form.
    Decode(CodecArgs),

    /// List the raw fields of a binary payload without a schema.
    Inspect(InspectArgs),

    /// Write the sample messages as .bin and .json files.
    WriteSamples(WriteSamplesArgs),

    /// Run the conformance suites against this and other implementations.
    Conformance(ConformanceArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // stdout carries payloads, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let schema = cli.schema.as_deref();
    let result = match &cli.command {
        Commands::Encode(args) => load_registry(schema).and_then(|r| run_encode(args, &r)),
        Commands::Decode(args) => load_registry(schema).and_then(|r| run_decode(args, &r)),
        Commands::Inspect(args) => run_inspect(args),
        Commands::WriteSamples(args) => run_write_samples(args),
        Commands::Conformance(args) => run_conformance(args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(EXIT_ERROR)
        }
    }
}
