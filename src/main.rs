//! `dctl` binary entry point.

use std::fs;

use clap::Parser;
use dcplane::config::{ConfigPaths, ConfigStore};
use dcplane::cli::{self, Cli};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    ensure_config_dir()?;
    let cli = Cli::parse();
    let config = ConfigStore::load()?;

    match cli::run(cli, &config) {
        Ok(output) => {
            if !output.trim().is_empty() {
                println!("{output}");
            }
            Ok(())
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}

fn ensure_config_dir() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = ConfigPaths::config_dir()?;
    fs::create_dir_all(&config_dir)?;
    Ok(())
}
