//! # svn-migrate CLI
//!
//! This is the binary entry point for the `svn-migrate` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Running the migration.
//! - Translating errors into a single diagnostic line and exit status 1.
//!
//! The migration logic lives in the `lib.rs` library crate, so the binary is
//! a thin wrapper around it.

mod cli;

use clap::error::ErrorKind;
use clap::Parser;

use svn_migrate::exit_codes;

fn main() {
    let cli = match cli::Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            // Wrong argument counts render with the usage line
            let _ = e.print();
            std::process::exit(exit_codes::ERROR);
        }
    };

    let code = match cli.execute() {
        Ok(()) => exit_codes::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            exit_codes::ERROR
        }
    };
    std::process::exit(code);
}
