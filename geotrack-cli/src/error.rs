//! CLI error handling with user-friendly messages.
//!
//! Centralizes error handling for the CLI, providing consistent formatting
//! and appropriate exit codes.

use std::fmt;
use std::process;

use geotrack::app::AppError;
use geotrack::config::ConfigFileError;
use geotrack::device::DeviceError;
use geotrack::geofence::GeofenceError;
use geotrack::position::PositionError;
use geotrack::sync::SyncError;
use geotrack::tracker::TrackerError;

/// CLI-specific errors with user-friendly messages.
#[derive(Debug)]
pub enum CliError {
    /// Failed to initialize logging
    LoggingInit(String),
    /// Configuration error
    Config(String),
    /// Failed to create the Tokio runtime
    Runtime(String),
    /// Failed to build or start the application
    App(AppError),
    /// Tracking error
    Tracker(TrackerError),
    /// Delivery error
    Sync(SyncError),
    /// Device registration error
    Device(DeviceError),
    /// Zone error
    Geofence(GeofenceError),
    /// No position fix available
    Position(PositionError),
    /// A manual update could not be delivered (the sample was queued)
    NotDelivered(String),
}

impl CliError {
    /// Exit the process with an appropriate error message and code.
    pub fn exit(&self) -> ! {
        eprintln!("Error: {}", self);

        match self {
            CliError::Device(DeviceError::NotRegistered)
            | CliError::Geofence(GeofenceError::NoIdentity)
            | CliError::Sync(SyncError::NoIdentity) => {
                eprintln!();
                eprintln!("Register this device first:");
                eprintln!("  geotrack device register --name <NAME>");
            }
            CliError::Tracker(TrackerError::PermissionDenied)
            | CliError::App(AppError::Tracker(TrackerError::PermissionDenied)) => {
                eprintln!();
                eprintln!("Common issues:");
                eprintln!("  1. gpsd socket not readable by this user");
                eprintln!("  2. Wrong gpsd_address in the [position] section of config.ini");
            }
            CliError::Position(_) => {
                eprintln!();
                eprintln!("Pass --lat and --lon explicitly, or check that gpsd has a fix.");
            }
            CliError::NotDelivered(_) => {
                eprintln!();
                eprintln!("The sample is queued and will be sent by the next successful");
                eprintln!("update, 'geotrack drain', or a running tracker.");
            }
            _ => {}
        }

        process::exit(1)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::LoggingInit(msg) => write!(f, "Failed to initialize logging: {}", msg),
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Runtime(msg) => write!(f, "Failed to create async runtime: {}", msg),
            CliError::App(e) => write!(f, "{}", e),
            CliError::Tracker(e) => write!(f, "{}", e),
            CliError::Sync(e) => write!(f, "Delivery failed: {}", e),
            CliError::Device(e) => write!(f, "{}", e),
            CliError::Geofence(e) => write!(f, "{}", e),
            CliError::Position(e) => write!(f, "No position available: {}", e),
            CliError::NotDelivered(reason) => write!(f, "Update not delivered: {}", reason),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::App(e) => Some(e),
            CliError::Tracker(e) => Some(e),
            CliError::Sync(e) => Some(e),
            CliError::Device(e) => Some(e),
            CliError::Geofence(e) => Some(e),
            CliError::Position(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigFileError> for CliError {
    fn from(e: ConfigFileError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<AppError> for CliError {
    fn from(e: AppError) -> Self {
        CliError::App(e)
    }
}

impl From<TrackerError> for CliError {
    fn from(e: TrackerError) -> Self {
        CliError::Tracker(e)
    }
}

impl From<SyncError> for CliError {
    fn from(e: SyncError) -> Self {
        CliError::Sync(e)
    }
}

impl From<DeviceError> for CliError {
    fn from(e: DeviceError) -> Self {
        CliError::Device(e)
    }
}

impl From<GeofenceError> for CliError {
    fn from(e: GeofenceError) -> Self {
        CliError::Geofence(e)
    }
}

impl From<PositionError> for CliError {
    fn from(e: PositionError) -> Self {
        CliError::Position(e)
    }
}
