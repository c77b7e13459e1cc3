//! Settings structs, one per `[section]` of the config file.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::config_directory;
use crate::collector::{DEFAULT_BASE_URL, DEFAULT_HTTP_TIMEOUT};
use crate::position::{DEFAULT_FRESHNESS, DEFAULT_GPSD_ADDRESS};
use crate::store::DEFAULT_MAX_QUEUED;
use crate::throttle::DEFAULT_THROTTLE_WINDOW;
use crate::tracker::DEFAULT_INTERVAL;

/// Default location acquisition timeout (seconds).
pub const DEFAULT_LOCATION_TIMEOUT_SECS: u64 = 20;

/// Complete configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub collector: CollectorSettings,
    pub tracking: TrackingSettings,
    pub position: PositionSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

/// `[collector]`
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorSettings {
    /// Base URL of the collector API
    pub base_url: String,
    /// HTTP request timeout in seconds
    pub timeout: u64,
}

/// `[tracking]`, all values in seconds.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackingSettings {
    pub interval: u64,
    pub throttle_window: u64,
    /// Maximum age of a cached fix reused by a manual update
    pub freshness: u64,
    pub location_timeout: u64,
}

/// Which position source to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionSourceKind {
    Gpsd,
    Static,
}

impl PositionSourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionSourceKind::Gpsd => "gpsd",
            PositionSourceKind::Static => "static",
        }
    }
}

impl fmt::Display for PositionSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PositionSourceKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gpsd" => Ok(PositionSourceKind::Gpsd),
            "static" => Ok(PositionSourceKind::Static),
            _ => Err(()),
        }
    }
}

/// `[position]`
#[derive(Debug, Clone, PartialEq)]
pub struct PositionSettings {
    pub source: PositionSourceKind,
    /// gpsd `host:port`
    pub gpsd_address: String,
    /// Fixed position for the static source
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// `[storage]`
#[derive(Debug, Clone, PartialEq)]
pub struct StorageSettings {
    /// SQLite database file
    pub database: PathBuf,
    /// Retention cap for the offline queue
    pub max_queued: usize,
}

/// `[logging]`
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}

impl Default for ConfigFile {
    fn default() -> Self {
        let dir = config_directory();
        Self {
            collector: CollectorSettings {
                base_url: DEFAULT_BASE_URL.to_string(),
                timeout: DEFAULT_HTTP_TIMEOUT.as_secs(),
            },
            tracking: TrackingSettings {
                interval: DEFAULT_INTERVAL.as_secs(),
                throttle_window: DEFAULT_THROTTLE_WINDOW.as_secs(),
                freshness: DEFAULT_FRESHNESS.as_secs(),
                location_timeout: DEFAULT_LOCATION_TIMEOUT_SECS,
            },
            position: PositionSettings {
                source: PositionSourceKind::Gpsd,
                gpsd_address: DEFAULT_GPSD_ADDRESS.to_string(),
                latitude: None,
                longitude: None,
            },
            storage: StorageSettings {
                database: dir.join("geotrack.db"),
                max_queued: DEFAULT_MAX_QUEUED,
            },
            logging: LoggingSettings {
                file: dir.join("geotrack.log"),
            },
        }
    }
}
