//! Delivery of samples to the collector.
//!
//! Two paths reach the collector:
//!
//! - [`SyncEngine::send_now`] uploads a freshly captured sample once, with no
//!   retry. The caller decides what to do on failure (the tracker queues it).
//! - [`SyncEngine::drain`] replays the durable queue in insertion order and
//!   stops at the first failure, so delivery order is preserved and nothing
//!   is skipped.
//!
//! Delivery is at-least-once: a sample acknowledged by the collector but not
//! yet removed from the queue when the process dies is uploaded again on the
//! next drain.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::collector::{CollectorClient, CollectorError, LocationUpload};
use crate::position::Sample;
use crate::store::{DurableQueue, SampleId, StateStore, StoreError};

/// Errors from the delivery paths.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No device identity has been registered yet.
    #[error("No device identity registered")]
    NoIdentity,

    /// The collector could not be reached or rejected the upload.
    #[error(transparent)]
    Collector(#[from] CollectorError),

    /// Local storage failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Uploads samples and flushes the offline backlog.
pub struct SyncEngine {
    collector: Arc<dyn CollectorClient>,
    queue: DurableQueue,
    state: StateStore,
    drain_lock: Mutex<()>,
}

impl SyncEngine {
    pub fn new(collector: Arc<dyn CollectorClient>, queue: DurableQueue, state: StateStore) -> Self {
        Self {
            collector,
            queue,
            state,
            drain_lock: Mutex::new(()),
        }
    }

    /// The backlog this engine drains.
    pub fn queue(&self) -> &DurableQueue {
        &self.queue
    }

    /// Upload a single sample right away.
    pub async fn send_now(&self, sample: &Sample) -> Result<(), SyncError> {
        let device_id = self.state.device_id()?.ok_or(SyncError::NoIdentity)?;
        let upload = LocationUpload::new(sample, &device_id);
        self.collector.post_location(&upload).await?;

        debug!(
            latitude = sample.latitude,
            longitude = sample.longitude,
            timestamp = %upload.timestamp,
            "Sample delivered"
        );
        Ok(())
    }

    /// Flush the queue in insertion order, returning how many were delivered.
    ///
    /// Stops at the first failed upload; that sample and everything after it
    /// stay queued. An empty queue returns 0 without touching the network or
    /// the identity. Without an identity nothing is sent and the queue is left
    /// intact. Concurrent calls run one after another.
    pub async fn drain(&self) -> Result<usize, SyncError> {
        let _guard = self.drain_lock.lock().await;

        let pending = self.queue.peek_all()?;
        if pending.is_empty() {
            return Ok(0);
        }

        let Some(device_id) = self.state.device_id()? else {
            debug!(pending = pending.len(), "Drain skipped, no device identity");
            return Ok(0);
        };

        let mut delivered: Vec<SampleId> = Vec::with_capacity(pending.len());
        for item in &pending {
            let upload = LocationUpload::new(&item.sample, &device_id);
            match self.collector.post_location(&upload).await {
                Ok(()) => delivered.push(item.id),
                Err(e) => {
                    warn!(
                        sample_id = item.id.0,
                        delivered = delivered.len(),
                        remaining = pending.len() - delivered.len(),
                        error = %e,
                        "Drain stopped at failed upload"
                    );
                    break;
                }
            }
        }

        if !delivered.is_empty() {
            self.queue.remove_batch(&delivered)?;
            info!(
                delivered = delivered.len(),
                remaining = pending.len() - delivered.len(),
                "Queued samples delivered"
            );
        }

        Ok(delivered.len())
    }
}
