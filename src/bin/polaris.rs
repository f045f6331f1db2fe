//! Polaris CLI Binary
//!
//! Command-line interface for the Polaris conversation backend.

use clap::Parser;
use polaris::logging::init_logging;
use polaris::tooling::cli::{Cli, CliContext};
use std::process;

fn main() {
    let cli = Cli::parse();

    let context = match CliContext::new(&cli) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = init_logging(&context.config().logging) {
        eprintln!("Warning: failed to initialize logging: {}", e);
    }

    match context.execute(&cli.command) {
        Ok(output) => {
            println!("{}", output);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
