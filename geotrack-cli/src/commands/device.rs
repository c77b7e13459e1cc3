//! Device registration commands.

use clap::Subcommand;
use console::style;

use geotrack::device::{DeviceProfile, Verification};

use crate::error::CliError;
use crate::runner::CliRunner;

/// Device subcommands.
#[derive(Debug, Subcommand)]
pub enum DeviceCommands {
    /// Register this device with the collector
    Register {
        /// Display name for the device
        #[arg(long)]
        name: String,

        /// Manufacturer
        #[arg(long)]
        brand: Option<String>,

        /// Model
        #[arg(long)]
        model: Option<String>,
    },

    /// Check the stored identity against the collector
    Verify,

    /// Show the stored identity
    Show,

    /// Forget the stored identity (local only)
    Forget,
}

/// Run a device subcommand.
pub fn run(command: DeviceCommands, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(debug, false)?;
    runner.log_startup("device");
    let app = runner.open_app()?;
    let devices = app.devices();

    match command {
        DeviceCommands::Register { name, brand, model } => {
            let mut profile = DeviceProfile::new(name);
            if let Some(brand) = brand {
                profile = profile.with_brand(brand);
            }
            if let Some(model) = model {
                profile = profile.with_model(model);
            }

            if let Some(existing) = devices.current()? {
                println!("Replacing existing identity {}", existing);
            }
            let identity = runner.block_on(devices.register(&profile))?;
            println!("{} as {}", style("Registered").green().bold(), identity);
        }
        DeviceCommands::Verify => match runner.block_on(devices.verify())? {
            Verification::Registered(remote) => {
                println!(
                    "{} {} (collector id {}, {})",
                    style("Registered").green().bold(),
                    remote.device_id,
                    remote.id,
                    remote.name.as_deref().unwrap_or("unnamed")
                );
            }
            Verification::Cleared(identity) => {
                println!(
                    "{} the collector does not know {}; local identity cleared",
                    style("Unknown:").yellow().bold(),
                    identity
                );
            }
        },
        DeviceCommands::Show => match devices.current()? {
            Some(identity) => println!("{}", identity),
            None => println!("(not registered)"),
        },
        DeviceCommands::Forget => match devices.forget()? {
            Some(identity) => println!("Forgot {}", identity),
            None => println!("(not registered)"),
        },
    }

    Ok(())
}
