//! Configuration management CLI commands.
//!
//! Provides `config path`, `config show`, and `config init`.

use clap::Subcommand;
use console::style;

use geotrack::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Print the effective configuration (file values over defaults)
    Show,

    /// Write a default configuration file if none exists
    Init,
}

/// Run a config subcommand.
pub fn run(command: ConfigCommands) -> Result<(), CliError> {
    match command {
        ConfigCommands::Path => run_path(),
        ConfigCommands::Show => run_show(),
        ConfigCommands::Init => run_init(),
    }
}

fn run_path() -> Result<(), CliError> {
    let path = config_file_path();
    println!("{}", path.display());
    if !path.exists() {
        println!("(file does not exist, defaults are in effect)");
    }
    Ok(())
}

fn run_show() -> Result<(), CliError> {
    let config = ConfigFile::load()?;
    print!("{}", config.to_ini_string());
    Ok(())
}

fn run_init() -> Result<(), CliError> {
    let path = config_file_path();
    if ConfigFile::init_at(&path)? {
        println!("{} {}", style("Created").green().bold(), path.display());
    } else {
        println!("{} already exists, left unchanged", path.display());
    }
    Ok(())
}
