//! Application configuration for TrackerApp.
//!
//! `AppConfig` combines everything needed to bootstrap the application and
//! is normally built from the user's `ConfigFile`.

use std::path::PathBuf;
use std::time::Duration;

use super::error::AppError;
use crate::collector::CollectorConfig;
use crate::config::{ConfigFile, PositionSourceKind};
use crate::position::{DEFAULT_FRESHNESS, DEFAULT_GPSD_ADDRESS};
use crate::store::DEFAULT_MAX_QUEUED;
use crate::tracker::TrackerConfig;

/// Application configuration combining all component configs.
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Collector endpoint and timeout.
    pub collector: CollectorConfig,

    /// Tick interval and throttle window.
    pub tracker: TrackerConfig,

    /// Where fixes come from.
    pub position: PositionConfig,

    /// Maximum age of a cached fix reused by a manual update.
    pub freshness: Duration,

    /// Local database.
    pub storage: StorageConfig,
}

/// Position source selection.
#[derive(Clone, Debug, PartialEq)]
pub enum PositionConfig {
    /// gpsd daemon at `address`, waiting at most `timeout` for a fix.
    Gpsd { address: String, timeout: Duration },
    /// Fixed installation position.
    Static { latitude: f64, longitude: f64 },
}

impl Default for PositionConfig {
    fn default() -> Self {
        PositionConfig::Gpsd {
            address: DEFAULT_GPSD_ADDRESS.to_string(),
            timeout: Duration::from_secs(crate::config::DEFAULT_LOCATION_TIMEOUT_SECS),
        }
    }
}

/// Local storage configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct StorageConfig {
    /// SQLite database file.
    pub database: PathBuf,

    /// Retention cap for the offline queue.
    pub max_queued: usize,
}

impl StorageConfig {
    pub fn new(database: PathBuf) -> Self {
        Self {
            database,
            max_queued: DEFAULT_MAX_QUEUED,
        }
    }

    pub fn with_max_queued(mut self, max_queued: usize) -> Self {
        self.max_queued = max_queued;
        self
    }
}

impl AppConfig {
    /// Create a config with default tracking settings.
    pub fn new(collector: CollectorConfig, storage: StorageConfig) -> Self {
        Self {
            collector,
            tracker: TrackerConfig::default(),
            position: PositionConfig::default(),
            freshness: DEFAULT_FRESHNESS,
            storage,
        }
    }

    /// Build the application config from the user's configuration file.
    pub fn from_config_file(config: &ConfigFile) -> Result<Self, AppError> {
        let collector = CollectorConfig::new(config.collector.base_url.clone())
            .with_timeout(Duration::from_secs(config.collector.timeout));

        let tracker = TrackerConfig::new()
            .with_interval(Duration::from_secs(config.tracking.interval))
            .with_throttle_window(Duration::from_secs(config.tracking.throttle_window));

        let position = match config.position.source {
            PositionSourceKind::Gpsd => PositionConfig::Gpsd {
                address: config.position.gpsd_address.clone(),
                timeout: Duration::from_secs(config.tracking.location_timeout),
            },
            PositionSourceKind::Static => {
                match (config.position.latitude, config.position.longitude) {
                    (Some(latitude), Some(longitude)) => PositionConfig::Static {
                        latitude,
                        longitude,
                    },
                    _ => {
                        return Err(AppError::Config(
                            "position.latitude and position.longitude are required \
                             when position.source = static"
                                .to_string(),
                        ))
                    }
                }
            }
        };

        Ok(Self {
            collector,
            tracker,
            position,
            freshness: Duration::from_secs(config.tracking.freshness),
            storage: StorageConfig::new(config.storage.database.clone())
                .with_max_queued(config.storage.max_queued),
        })
    }

    pub fn with_tracker(mut self, tracker: TrackerConfig) -> Self {
        self.tracker = tracker;
        self
    }

    pub fn with_position(mut self, position: PositionConfig) -> Self {
        self.position = position;
        self
    }

    pub fn with_freshness(mut self, freshness: Duration) -> Self {
        self.freshness = freshness;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_default_config_file() {
        let config = AppConfig::from_config_file(&ConfigFile::default()).unwrap();

        assert_eq!(config.collector.base_url, "http://127.0.0.1:8000");
        assert_eq!(config.collector.timeout, Duration::from_secs(15));
        assert_eq!(config.tracker.interval(), Duration::from_secs(30));
        assert_eq!(config.freshness, Duration::from_secs(30));
        assert_eq!(config.position, PositionConfig::default());
        assert_eq!(config.storage.max_queued, 10_000);
    }

    #[test]
    fn test_static_position() {
        let mut file = ConfigFile::default();
        file.position.source = PositionSourceKind::Static;
        file.position.latitude = Some(19.4);
        file.position.longitude = Some(-99.1);

        let config = AppConfig::from_config_file(&file).unwrap();
        assert_eq!(
            config.position,
            PositionConfig::Static {
                latitude: 19.4,
                longitude: -99.1
            }
        );
    }

    #[test]
    fn test_static_position_requires_coordinates() {
        let mut file = ConfigFile::default();
        file.position.source = PositionSourceKind::Static;

        assert!(matches!(
            AppConfig::from_config_file(&file),
            Err(AppError::Config(_))
        ));
    }

    #[test]
    fn test_builders() {
        let config = AppConfig::new(
            CollectorConfig::new("http://localhost:9000"),
            StorageConfig::new(PathBuf::from("/tmp/geotrack.db")).with_max_queued(50),
        )
        .with_freshness(Duration::from_secs(5))
        .with_position(PositionConfig::Static {
            latitude: 1.0,
            longitude: 2.0,
        });

        assert_eq!(config.storage.max_queued, 50);
        assert_eq!(config.freshness, Duration::from_secs(5));
    }
}
