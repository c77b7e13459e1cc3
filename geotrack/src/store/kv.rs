//! Key-value state: device identity, throttle state and the zone list.

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::error::{StoreError, StoreResult};
use super::queue::parse_timestamp;
use super::Database;
use crate::geofence::Zone;
use crate::throttle::ThrottleState;

/// Key holding the registered device id.
pub const KEY_DEVICE_ID: &str = "device_unique_id";

/// Key holding the last in-zone send time.
pub const KEY_LAST_SENT: &str = "last_sent_timestamp";

/// Key holding the JSON-serialized zone list.
pub const KEY_ZONES: &str = "zones";

/// Typed access to the `kv` table.
#[derive(Clone)]
pub struct StateStore {
    db: Database,
}

impl StateStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    pub fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.db.with_conn(|conn| {
            Ok(conn
                .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                    row.get(0)
                })
                .optional()?)
        })
    }

    pub fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO kv (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value],
            )?;
            Ok(())
        })
    }

    pub fn delete(&self, key: &str) -> StoreResult<()> {
        self.db.with_conn(|conn| {
            conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
            Ok(())
        })
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> StoreResult<Option<T>> {
        match self.get(key)? {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|source| StoreError::Corrupt {
                    key: key.to_string(),
                    source,
                }),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> StoreResult<()> {
        let raw = serde_json::to_string(value).map_err(|source| StoreError::Corrupt {
            key: key.to_string(),
            source,
        })?;
        self.set(key, &raw)
    }

    // -------------------------------------------------------------------------
    // Device identity
    // -------------------------------------------------------------------------

    /// The registered device id, if any.
    pub fn device_id(&self) -> StoreResult<Option<String>> {
        Ok(self.get(KEY_DEVICE_ID)?.filter(|id| !id.trim().is_empty()))
    }

    pub fn set_device_id(&self, device_id: &str) -> StoreResult<()> {
        self.set(KEY_DEVICE_ID, device_id)
    }

    pub fn clear_device_id(&self) -> StoreResult<()> {
        self.delete(KEY_DEVICE_ID)
    }

    // -------------------------------------------------------------------------
    // Throttle state
    // -------------------------------------------------------------------------

    /// Load the persisted throttle state (absent = never sent in a zone).
    pub fn throttle_state(&self) -> StoreResult<ThrottleState> {
        let last_sent_at = match self.get(KEY_LAST_SENT)? {
            Some(raw) => Some(parse_timestamp(&raw)?),
            None => None,
        };
        Ok(ThrottleState { last_sent_at })
    }

    /// Persist the throttle state; `None` deletes the key.
    pub fn set_throttle_state(&self, state: &ThrottleState) -> StoreResult<()> {
        match state.last_sent_at {
            Some(at) => self.set(KEY_LAST_SENT, &at.to_rfc3339()),
            None => self.delete(KEY_LAST_SENT),
        }
    }

    /// Convenience accessor for the last in-zone send time.
    pub fn last_sent_at(&self) -> StoreResult<Option<DateTime<Utc>>> {
        Ok(self.throttle_state()?.last_sent_at)
    }

    // -------------------------------------------------------------------------
    // Zones
    // -------------------------------------------------------------------------

    /// The persisted zone list (empty if never saved).
    pub fn zones(&self) -> StoreResult<Vec<Zone>> {
        Ok(self.get_json(KEY_ZONES)?.unwrap_or_default())
    }

    pub fn set_zones(&self, zones: &[Zone]) -> StoreResult<()> {
        self.set_json(KEY_ZONES, zones)
    }
}
