//! Main entry point for recdiff CLI

use clap::Parser;

mod cli;
mod commands;
mod loader;
mod output;
mod progress;

use cli::Cli;
use commands::execute_command;

/// Exit status for usage, configuration and I/O failures
const EXIT_FAILURE: i32 = 2;

fn main() {
    // Load environment variables from .env file if present
    if std::path::Path::new(".env").exists() {
        if let Err(e) = dotenv::dotenv() {
            eprintln!("Warning: Failed to load .env file: {e}");
        }
    }

    let cli = Cli::parse();

    // Reports go to stdout, so only warnings are logged by default
    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    match execute_command(cli.command, cli.config.as_deref()) {
        Ok(status) => std::process::exit(status),
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::exit(EXIT_FAILURE);
        }
    }
}
