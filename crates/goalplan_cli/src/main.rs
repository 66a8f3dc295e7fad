//! goalplan command-line front end.
//!
//! # Responsibility
//! - Map subcommands onto `goalplan_core` services and planners.
//! - Print results as text tables or JSON and exit non-zero on failure.

use clap::Parser;

mod commands;
mod output;

use commands::Cli;

fn main() {
    let cli = Cli::parse();

    if let Err(err) = cli.run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
