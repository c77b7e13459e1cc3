//! Local persistence on an embedded SQLite database.
//!
//! One database file holds everything that must survive a process restart:
//!
//! ```text
//! samples(id, latitude, longitude, timestamp)   ← DurableQueue
//! kv(key, value)                                ← StateStore
//!   device_unique_id
//!   last_sent_timestamp
//!   zones (JSON)
//! ```
//!
//! All access goes through a single connection guarded by a mutex, so every
//! statement or transaction is atomic with respect to every other one.

mod error;
mod kv;
mod queue;

pub use error::{StoreError, StoreResult};
pub use kv::{StateStore, KEY_DEVICE_ID, KEY_LAST_SENT, KEY_ZONES};
pub use queue::{DurableQueue, QueuedSample, SampleId, DEFAULT_MAX_QUEUED};

use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::Connection;
use tracing::debug;

/// Shared handle to the local database.
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database file at `path`.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| StoreError::CreateDir {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let conn = Connection::open(path)?;
        let mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "FULL")?;
        debug!(path = %path.display(), journal_mode = %mode, "Opened database");

        Self::from_connection(conn)
    }

    /// Open a private in-memory database (for testing).
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> StoreResult<Self> {
        Self::init_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn init_schema(conn: &Connection) -> StoreResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS samples (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                timestamp TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Run `f` with exclusive access to the connection.
    pub(crate) fn with_conn<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> StoreResult<T>,
    ) -> StoreResult<T> {
        let mut conn = self.conn.lock();
        f(&mut conn)
    }
}
