//! Safe zone management commands.

use clap::Subcommand;
use console::style;

use geotrack::geofence::{NewZone, Zone, DEFAULT_RADIUS_M};
use geotrack::position::CaptureMode;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Zone subcommands.
#[derive(Debug, Subcommand)]
pub enum ZoneCommands {
    /// List locally stored zones
    List,

    /// Add a zone (at the current position unless --lat/--lon are given)
    Add {
        /// Zone name
        #[arg(long)]
        name: String,

        /// Center latitude in decimal degrees
        #[arg(long, requires = "lon", allow_negative_numbers = true)]
        lat: Option<f64>,

        /// Center longitude in decimal degrees
        #[arg(long, requires = "lat", allow_negative_numbers = true)]
        lon: Option<f64>,

        /// Radius in meters
        #[arg(long)]
        radius: Option<f64>,
    },

    /// Remove a zone here and on the collector
    Remove {
        /// Zone id as shown by `zones list`
        id: String,
    },

    /// Upload all local zones and take the collector's list
    Sync,

    /// Replace local zones with the collector's list
    Pull,
}

/// Run a zones subcommand.
pub fn run(command: ZoneCommands, debug: bool) -> Result<(), CliError> {
    let runner = CliRunner::new(debug, false)?;
    runner.log_startup("zones");
    let app = runner.open_app()?;

    match command {
        ZoneCommands::List => print_zones(&app.zones().list()?),
        ZoneCommands::Add {
            name,
            lat,
            lon,
            radius,
        } => {
            let (latitude, longitude) = match (lat, lon) {
                (Some(lat), Some(lon)) => (lat, lon),
                _ => {
                    let fix = runner.block_on(app.position().capture(CaptureMode::PreferCached))?;
                    println!("Using current position {:.6}, {:.6}", fix.latitude, fix.longitude);
                    fix.position()
                }
            };
            let zone = app.zones().add(
                NewZone::new(name, latitude, longitude)
                    .with_radius(radius.unwrap_or(DEFAULT_RADIUS_M)),
            )?;
            println!("{} zone {} ({})", style("Added").green().bold(), zone.name, zone.id);
            println!("Run 'geotrack zones sync' to upload it.");
        }
        ZoneCommands::Remove { id } => {
            runner.block_on(app.zone_sync().delete(&id))?;
            println!("{} zone {}", style("Removed").green().bold(), id);
        }
        ZoneCommands::Sync => {
            let zones = runner.block_on(app.zone_sync().sync())?;
            println!("{} {} zone(s)", style("Synced").green().bold(), zones.len());
            print_zones(&zones);
        }
        ZoneCommands::Pull => {
            let zones = runner.block_on(app.zone_sync().fetch())?;
            println!("{} {} zone(s)", style("Fetched").green().bold(), zones.len());
            print_zones(&zones);
        }
    }

    Ok(())
}

fn print_zones(zones: &[Zone]) {
    if zones.is_empty() {
        println!("(no zones)");
        return;
    }

    println!(
        "{:<16} {:<20} {:>11} {:>12} {:>8}",
        "ID", "NAME", "LATITUDE", "LONGITUDE", "RADIUS"
    );
    for zone in zones {
        let id = if zone.is_synced() {
            style(zone.id.as_str())
        } else {
            style(zone.id.as_str()).dim()
        };
        println!(
            "{:<16} {:<20} {:>11.6} {:>12.6} {:>7.0}m",
            id, zone.name, zone.latitude, zone.longitude, zone.radius
        );
    }
}
