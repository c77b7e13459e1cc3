//! INI parsing: `Ini` to `ConfigFile`.
//!
//! The single place where INI key names are mapped to struct fields.

use std::path::PathBuf;
use std::str::FromStr;

use ini::{Ini, Properties};

use super::file::ConfigFileError;
use super::settings::{ConfigFile, PositionSourceKind};
use crate::geo::is_valid_coordinate;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [collector] section
    if let Some(section) = ini.section(Some("collector")) {
        if let Some(v) = section.get("base_url") {
            let v = v.trim();
            if !v.starts_with("http://") && !v.starts_with("https://") {
                return Err(invalid(
                    "collector",
                    "base_url",
                    v,
                    "must start with http:// or https://",
                ));
            }
            config.collector.base_url = v.to_string();
        }
        if let Some(v) = positive_secs(section, "collector", "timeout")? {
            config.collector.timeout = v;
        }
    }

    // [tracking] section
    if let Some(section) = ini.section(Some("tracking")) {
        if let Some(v) = positive_secs(section, "tracking", "interval")? {
            config.tracking.interval = v;
        }
        if let Some(v) = positive_secs(section, "tracking", "throttle_window")? {
            config.tracking.throttle_window = v;
        }
        if let Some(v) = positive_secs(section, "tracking", "freshness")? {
            config.tracking.freshness = v;
        }
        if let Some(v) = positive_secs(section, "tracking", "location_timeout")? {
            config.tracking.location_timeout = v;
        }
    }

    // [position] section
    if let Some(section) = ini.section(Some("position")) {
        if let Some(v) = section.get("source") {
            config.position.source = PositionSourceKind::from_str(v)
                .map_err(|_| invalid("position", "source", v, "must be 'gpsd' or 'static'"))?;
        }
        if let Some(v) = section.get("gpsd_address") {
            let v = v.trim();
            if !v.is_empty() {
                config.position.gpsd_address = v.to_string();
            }
        }
        config.position.latitude = optional_degrees(section, "latitude")?;
        config.position.longitude = optional_degrees(section, "longitude")?;
    }

    if config.position.source == PositionSourceKind::Static {
        match (config.position.latitude, config.position.longitude) {
            (Some(lat), Some(lon)) if is_valid_coordinate(lat, lon) => {}
            (Some(lat), Some(lon)) => {
                return Err(invalid(
                    "position",
                    "latitude",
                    &format!("{}, {}", lat, lon),
                    "not a usable coordinate (zero or out of range)",
                ));
            }
            _ => {
                return Err(invalid(
                    "position",
                    "latitude",
                    "",
                    "latitude and longitude are required when source = static",
                ));
            }
        }
    }

    // [storage] section
    if let Some(section) = ini.section(Some("storage")) {
        if let Some(v) = section.get("database") {
            let v = v.trim();
            if !v.is_empty() {
                config.storage.database = expand_tilde(v);
            }
        }
        if let Some(v) = section.get("max_queued") {
            config.storage.max_queued = v
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| invalid("storage", "max_queued", v, "must be a positive integer"))?;
        }
    }

    // [logging] section
    if let Some(section) = ini.section(Some("logging")) {
        if let Some(v) = section.get("file") {
            let v = v.trim();
            if !v.is_empty() {
                config.logging.file = expand_tilde(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn positive_secs(
    section: &Properties,
    section_name: &str,
    key: &str,
) -> Result<Option<u64>, ConfigFileError> {
    let Some(v) = section.get(key) else {
        return Ok(None);
    };
    v.trim()
        .parse::<u64>()
        .ok()
        .filter(|n| *n > 0)
        .map(Some)
        .ok_or_else(|| invalid(section_name, key, v, "must be a positive integer (seconds)"))
}

fn optional_degrees(section: &Properties, key: &str) -> Result<Option<f64>, ConfigFileError> {
    match section.get(key).map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => v
            .parse::<f64>()
            .ok()
            .filter(|d| d.is_finite())
            .map(Some)
            .ok_or_else(|| invalid("position", key, v, "must be a number (degrees)")),
    }
}

/// Expand a leading `~/` to the home directory.
pub(super) fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
