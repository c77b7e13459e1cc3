//! Durable, insert-ordered queue of samples awaiting acknowledgement.

use std::fmt;

use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, OptionalExtension};
use tracing::{debug, warn};

use super::error::{StoreError, StoreResult};
use super::Database;
use crate::position::Sample;

/// Default retention cap for queued samples.
///
/// At a 30 s capture cadence this holds roughly 3.5 days of outage.
pub const DEFAULT_MAX_QUEUED: usize = 10_000;

/// Row id assigned to a sample when it is queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SampleId(pub i64);

impl fmt::Display for SampleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A sample together with its queue id.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QueuedSample {
    pub id: SampleId,
    pub sample: Sample,
}

/// Crash-safe queue of samples that the collector has not acknowledged yet.
///
/// Samples come back from [`peek_all`](Self::peek_all) in insertion order and
/// leave only through [`remove_batch`](Self::remove_batch) or the retention
/// cap.
#[derive(Clone)]
pub struct DurableQueue {
    db: Database,
    max_samples: usize,
}

impl DurableQueue {
    /// Create a queue with the default retention cap.
    pub fn new(db: Database) -> Self {
        Self::with_capacity(db, DEFAULT_MAX_QUEUED)
    }

    /// Create a queue that keeps at most `max_samples` entries.
    pub fn with_capacity(db: Database, max_samples: usize) -> Self {
        Self {
            db,
            max_samples: max_samples.max(1),
        }
    }

    /// Persist a sample. The oldest entries are evicted if the cap is exceeded.
    pub fn append(&self, sample: &Sample) -> StoreResult<QueuedSample> {
        let max = self.max_samples as i64;
        let (id, evicted) = self.db.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO samples (latitude, longitude, timestamp) VALUES (?1, ?2, ?3)",
                params![
                    sample.latitude,
                    sample.longitude,
                    sample.captured_at.to_rfc3339()
                ],
            )?;
            let id = tx.last_insert_rowid();
            let evicted = tx.execute(
                "DELETE FROM samples WHERE id IN (
                    SELECT id FROM samples ORDER BY id DESC LIMIT -1 OFFSET ?1
                )",
                params![max],
            )?;
            tx.commit()?;
            Ok((id, evicted))
        })?;

        if evicted > 0 {
            warn!(
                evicted,
                max_samples = self.max_samples,
                "Queue retention cap reached, dropped oldest samples"
            );
        }
        debug!(id, "Sample queued");

        Ok(QueuedSample {
            id: SampleId(id),
            sample: *sample,
        })
    }

    /// All queued samples in insertion order.
    ///
    /// Rows whose timestamp cannot be read are deleted and logged so they
    /// never block the rest of the queue.
    pub fn peek_all(&self) -> StoreResult<Vec<QueuedSample>> {
        self.db.with_conn(|conn| {
            let rows = {
                let mut stmt = conn.prepare(
                    "SELECT id, latitude, longitude, timestamp FROM samples ORDER BY id ASC",
                )?;
                let rows = stmt.query_map([], |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, f64>(1)?,
                        row.get::<_, f64>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                })?;
                let collected = rows.collect::<Result<Vec<_>, _>>()?;
                collected
            };

            let mut samples = Vec::with_capacity(rows.len());
            let mut unreadable = Vec::new();
            for (id, latitude, longitude, timestamp) in rows {
                match parse_timestamp(&timestamp) {
                    Ok(captured_at) => samples.push(QueuedSample {
                        id: SampleId(id),
                        sample: Sample::new(latitude, longitude, captured_at),
                    }),
                    Err(e) => {
                        warn!(id, error = %e, "Dropping unreadable queued sample");
                        unreadable.push(id);
                    }
                }
            }

            if !unreadable.is_empty() {
                let placeholders = vec!["?"; unreadable.len()].join(",");
                let sql = format!("DELETE FROM samples WHERE id IN ({})", placeholders);
                conn.execute(&sql, params_from_iter(unreadable.iter()))?;
            }

            Ok(samples)
        })
    }

    /// Remove the given samples in one transaction. Unknown ids are ignored.
    pub fn remove_batch(&self, ids: &[SampleId]) -> StoreResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        self.db.with_conn(|conn| {
            let tx = conn.transaction()?;
            // Chunked to stay under SQLite's bound-parameter limit
            for chunk in ids.chunks(500) {
                let placeholders = vec!["?"; chunk.len()].join(",");
                let sql = format!("DELETE FROM samples WHERE id IN ({})", placeholders);
                tx.execute(&sql, params_from_iter(chunk.iter().map(|id| id.0)))?;
            }
            tx.commit()?;
            Ok(())
        })?;

        debug!(count = ids.len(), "Removed acknowledged samples");
        Ok(())
    }

    /// Number of queued samples.
    pub fn len(&self) -> StoreResult<usize> {
        self.db.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM samples", [], |row| row.get(0))?;
            Ok(count as usize)
        })
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> StoreResult<bool> {
        self.db.with_conn(|conn| {
            let first: Option<i64> = conn
                .query_row("SELECT id FROM samples LIMIT 1", [], |row| row.get(0))
                .optional()?;
            Ok(first.is_none())
        })
    }

    /// Configured retention cap.
    pub fn max_samples(&self) -> usize {
        self.max_samples
    }
}

pub(super) fn parse_timestamp(value: &str) -> StoreResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| StoreError::InvalidTimestamp(value.to_string()))
}
