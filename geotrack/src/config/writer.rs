//! INI serialization: `ConfigFile` to the commented text written to disk.

use std::path::Path;

use super::settings::ConfigFile;

/// Convert a `ConfigFile` to a commented INI string for saving.
pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let latitude = config
        .position
        .latitude
        .map(|v| v.to_string())
        .unwrap_or_default();
    let longitude = config
        .position
        .longitude
        .map(|v| v.to_string())
        .unwrap_or_default();

    format!(
        r#"[collector]
; Base URL of the collector API
base_url = {}
; HTTP request timeout in seconds (default: 15)
timeout = {}

[tracking]
; Seconds between position captures (default: 30)
interval = {}
; Inside a zone, minimum seconds between uploads (default: 600)
throttle_window = {}
; A manual update reuses a fix younger than this many seconds (default: 30)
freshness = {}
; Seconds to wait for a position fix (default: 20)
location_timeout = {}

[position]
; Position source:
;   gpsd   - gpsd daemon over TCP
;   static - fixed coordinates below
source = {}
; gpsd host:port (default: 127.0.0.1:2947)
gpsd_address = {}
; Fixed position in degrees (only used when source = static)
latitude = {}
longitude = {}

[storage]
; SQLite database holding the offline queue, identity and zones
database = {}
; Maximum queued samples; the oldest are dropped beyond this (default: 10000)
max_queued = {}

[logging]
; Log file path
file = {}
"#,
        config.collector.base_url,
        config.collector.timeout,
        config.tracking.interval,
        config.tracking.throttle_window,
        config.tracking.freshness,
        config.tracking.location_timeout,
        config.position.source,
        config.position.gpsd_address,
        latitude,
        longitude,
        path_to_string(&config.storage.database),
        config.storage.max_queued,
        path_to_string(&config.logging.file),
    )
}

/// Render a path, abbreviating the home directory as `~`.
fn path_to_string(path: &Path) -> String {
    if let Some(home) = dirs::home_dir() {
        if let Ok(stripped) = path.strip_prefix(&home) {
            return format!("~/{}", stripped.display());
        }
    }
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::super::settings::{ConfigFile, PositionSourceKind};
    use tempfile::TempDir;

    #[test]
    fn test_saved_file_loads_back() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.ini");

        let mut config = ConfigFile::default();
        config.collector.base_url = "https://collector.example.com".to_string();
        config.tracking.interval = 45;
        config.position.source = PositionSourceKind::Static;
        config.position.latitude = Some(19.4326);
        config.position.longitude = Some(-99.1332);
        config.storage.database = temp_dir.path().join("track.db");
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_default_file_is_commented() {
        let text = super::to_config_string(&ConfigFile::default());

        assert!(text.contains("; Position source:"));
        assert!(text.contains("source = gpsd"));
        assert!(text.contains("latitude = \n"));
    }
}
