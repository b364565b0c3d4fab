//! Command-line entry point for the wick interpreter (specification §6, §4.7).
//!
//! This is the only external collaborator the core specification calls
//! "not part of the core": it opens a source file, runs it through
//! `wick_interp::run_file`, and on a fatal `WickError` formats a single
//! located diagnostic and terminates with a nonzero exit status. There is no
//! recovery path — the error reporter's entire contract is "print and exit".

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use log::error;

use wick_common::Diagnostic;

/// Run a wick source file.
#[derive(Parser)]
#[command(name = "wick")]
#[command(about = "Run a wick source file")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    /// Path to the source file to run
    file: PathBuf,

    /// Dump the live-object registry to object.dsv on exit (spec §6)
    #[arg(long)]
    debug: bool,

    /// Enable verbose (debug-level) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Suppress all but error-level logging
    #[arg(short, long, global = true)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        log::LevelFilter::Debug
    } else if cli.quiet {
        log::LevelFilter::Error
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    match wick_interp::run_file(&cli.file, cli.debug) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let diagnostic = Diagnostic::from(err);
            error!("{diagnostic}");
            ExitCode::FAILURE
        }
    }
}
