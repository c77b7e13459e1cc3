//! Zone reconciliation with the collector.

use std::sync::Arc;

use tracing::{info, warn};

use super::error::GeofenceError;
use super::store::GeofenceStore;
use super::zone::Zone;
use crate::collector::{CollectorClient, ZoneUpload};
use crate::store::StateStore;

/// Server-side zone operations.
pub struct ZoneSync {
    collector: Arc<dyn CollectorClient>,
    zones: GeofenceStore,
    state: StateStore,
}

impl ZoneSync {
    pub fn new(
        collector: Arc<dyn CollectorClient>,
        zones: GeofenceStore,
        state: StateStore,
    ) -> Self {
        Self {
            collector,
            zones,
            state,
        }
    }

    fn device_id(&self) -> Result<String, GeofenceError> {
        self.state.device_id()?.ok_or(GeofenceError::NoIdentity)
    }

    /// Upload the current local set, then adopt the collector's list.
    ///
    /// Nothing changes locally if the upload fails.
    pub async fn sync(&self) -> Result<Vec<Zone>, GeofenceError> {
        let device_id = self.device_id()?;
        let local = self.zones.list()?;
        let payload: Vec<ZoneUpload> = local
            .iter()
            .map(|zone| ZoneUpload::new(zone, &device_id))
            .collect();

        let remote = self.collector.sync_zones(&device_id, &payload).await?;
        info!(
            uploaded = payload.len(),
            received = remote.len(),
            "Zones synced with collector"
        );

        self.zones
            .reconcile(remote.into_iter().map(Zone::from).collect())
    }

    /// Adopt the collector's list without uploading anything.
    pub async fn fetch(&self) -> Result<Vec<Zone>, GeofenceError> {
        let device_id = self.device_id()?;
        let remote = self.collector.fetch_zones(&device_id).await?;
        self.zones
            .reconcile(remote.into_iter().map(Zone::from).collect())
    }

    /// Delete a zone on the collector (when it knows it) and locally.
    ///
    /// A zone the collector no longer has is still removed locally. Any other
    /// remote failure leaves the local set untouched so the delete can be
    /// retried.
    pub async fn delete(&self, id: &str) -> Result<(), GeofenceError> {
        let is_synced = self
            .zones
            .list()?
            .iter()
            .any(|zone| zone.id == id && zone.is_synced());

        if is_synced {
            if let Some(device_id) = self.state.device_id()? {
                match self.collector.delete_zone(&device_id, id).await {
                    Ok(()) => {}
                    Err(e) if e.is_not_found() => {
                        warn!(id, "Zone already gone from collector");
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        self.zones.remove(id)
    }
}
