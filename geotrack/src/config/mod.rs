//! User configuration in `~/.geotrack/config.ini`.
//!
//! The file is optional: every key has a default, and a missing file loads as
//! all defaults. [`ConfigFile`] mirrors the INI sections one struct per
//! section; the library's typed configs ([`crate::collector::CollectorConfig`],
//! [`crate::tracker::TrackerConfig`], [`crate::app::AppConfig`]) are built
//! from it.
//!
//! # Example
//!
//! ```ignore
//! use geotrack::config::ConfigFile;
//!
//! let config = ConfigFile::load()?;
//! println!("collector: {}", config.collector.base_url);
//! ```

mod file;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    CollectorSettings, ConfigFile, LoggingSettings, PositionSettings, PositionSourceKind,
    StorageSettings, TrackingSettings, DEFAULT_LOCATION_TIMEOUT_SECS,
};
