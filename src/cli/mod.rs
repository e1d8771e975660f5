//! `dctl`, a read-only inspection tool for the engine's on-disk artifacts.
//!
//! There's no live, already-running service for this tool to attach to — a
//! [`crate::radio::RadioFacade`] is supplied by the platform integrator, not
//! bundled here. Every subcommand instead reads local state: the
//! [`crate::config::ConfigStore`] on disk and, for `apns`, an APN database
//! file passed on the command line.

mod commands;
mod error;
pub mod formatting;

pub use error::CliError;

use clap::{Parser, Subcommand};

use crate::config::ConfigStore;

#[derive(Debug, Parser)]
#[command(name = "dctl", about = "Inspect dcplane configuration and APN data on disk")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Show the resolved operating mode, logging config, and carrier overrides.
    Status {
        /// HAL major version to resolve the operating mode against.
        #[arg(long, default_value_t = 0)]
        hal_major_version: u32,
    },
    /// Parse and list the entries of an APN database file.
    Apns {
        /// Path to the APN database file.
        path: std::path::PathBuf,
    },
    /// Show the configured apn-type priority order.
    Requests,
}

/// Runs a parsed [`Cli`] invocation against the on-disk config store,
/// returning the rendered output.
pub fn run(cli: Cli, config: &ConfigStore) -> Result<String, CliError> {
    let snapshot = config.get_current();
    match cli.command {
        Commands::Status { hal_major_version } => Ok(commands::status::render(&snapshot, hal_major_version)),
        Commands::Apns { path } => {
            let records = commands::apns::load_database(&path)?;
            Ok(commands::apns::render(&records))
        }
        Commands::Requests => Ok(commands::requests::render(&snapshot)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_command_renders_without_error() {
        let config = ConfigStore::with_defaults();
        let cli = Cli { command: Commands::Status { hal_major_version: 0 } };
        let out = run(cli, &config).expect("renders");
        assert!(out.contains("operating mode"));
    }

    #[test]
    fn requests_command_renders_without_error() {
        let config = ConfigStore::with_defaults();
        let cli = Cli { command: Commands::Requests };
        let out = run(cli, &config).expect("renders");
        assert!(out.contains("priority order"));
    }
}
