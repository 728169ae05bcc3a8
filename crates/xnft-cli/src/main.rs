//! # xnft CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use xnft_cli::codec::{run_codec, run_payload, CodecArgs, PayloadArgs};
use xnft_cli::simulate::{run_simulate, SimulateArgs};

/// xnft bridge toolchain.
///
/// Encodes asset ids and transfer payloads the way the bridge puts them on
/// the wire, and replays scripted bridge scenarios in memory.
#[derive(Parser, Debug)]
#[command(name = "xnft", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Split or join 256-bit asset ids.
    Codec(CodecArgs),

    /// Encode a transfer payload.
    Payload(PayloadArgs),

    /// Run a scenario against an in-memory deployment.
    Simulate(SimulateArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // Events go to stdout; logs stay on stderr.
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("xnft CLI starting");

    let result = match cli.command {
        Commands::Codec(args) => run_codec(&args),
        Commands::Payload(args) => run_payload(&args),
        Commands::Simulate(args) => run_simulate(&args),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
