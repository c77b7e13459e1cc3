//! geotrack CLI - Command-line interface
//!
//! This binary drives the geotrack library: it runs the periodic tracker,
//! triggers manual updates, and manages the device identity and safe zones.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};

use commands::config::ConfigCommands;
use commands::device::DeviceCommands;
use commands::zones::ZoneCommands;
use error::CliError;

#[derive(Parser)]
#[command(name = "geotrack")]
#[command(version = geotrack::VERSION)]
#[command(about = "Location telemetry with offline buffering", long_about = None)]
struct Cli {
    /// Enable debug logging (overrides RUST_LOG)
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tracker until interrupted (Ctrl+C)
    Run,

    /// Capture and send one sample now, bypassing zone throttling
    Update,

    /// Upload queued samples
    Drain,

    /// Show device identity, queue depth and zone count
    Status,

    /// Manage the device registration
    Device {
        #[command(subcommand)]
        command: DeviceCommands,
    },

    /// Manage safe zones
    Zones {
        #[command(subcommand)]
        command: ZoneCommands,
    },

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = dispatch(cli) {
        e.exit();
    }
}

fn dispatch(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Commands::Run => commands::run::run(cli.debug),
        Commands::Update => commands::update::run(cli.debug),
        Commands::Drain => commands::drain::run(cli.debug),
        Commands::Status => commands::status::run(cli.debug),
        Commands::Device { command } => commands::device::run(command, cli.debug),
        Commands::Zones { command } => commands::zones::run(command, cli.debug),
        // Config commands work on the file itself and never start logging.
        Commands::Config { command } => commands::config::run(command),
    }
}
