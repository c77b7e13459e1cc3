//! Application bootstrap implementation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;

use super::config::{AppConfig, PositionConfig};
use super::error::AppError;
use crate::collector::{CollectorClient, ReqwestCollector};
use crate::device::DeviceRegistry;
use crate::geofence::{GeofenceStore, ZoneSync};
use crate::position::{
    CachingPositionSource, GpsdPositionSource, PositionSource, StaticPositionSource,
};
use crate::store::{Database, DurableQueue, StateStore};
use crate::sync::SyncEngine;
use crate::tracker::TrackingController;

/// Snapshot of the locally persisted state.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusReport {
    pub device_id: Option<String>,
    pub queued: usize,
    pub max_queued: usize,
    pub last_sent_at: Option<DateTime<Utc>>,
    pub zones: usize,
    pub running: bool,
}

/// geotrack application with every component wired once.
///
/// Build with [`open`](Self::open) for one-shot operations (manual update,
/// drain, zone and device management) or [`start`](Self::start) to also run
/// the periodic tracker.
pub struct TrackerApp {
    state: StateStore,
    queue: DurableQueue,
    zones: GeofenceStore,
    source: Arc<CachingPositionSource>,
    sync: Arc<SyncEngine>,
    zone_sync: ZoneSync,
    devices: DeviceRegistry,
    controller: TrackingController,

    /// Application configuration (retained for accessors).
    config: AppConfig,
}

impl TrackerApp {
    /// Build all components from configuration without starting the tracker.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or the HTTP client
    /// cannot be created.
    pub fn open(config: AppConfig) -> Result<Self, AppError> {
        let database = Database::open(&config.storage.database)?;
        let collector: Arc<dyn CollectorClient> =
            Arc::new(ReqwestCollector::new(config.collector.clone())?);
        let source = Self::create_position_source(&config.position);

        info!(
            database = %config.storage.database.display(),
            collector = %config.collector.base_url,
            source = source.name(),
            "geotrack components created"
        );

        Ok(Self::from_parts(config, database, collector, source))
    }

    /// Build the application and start periodic tracking.
    ///
    /// # Errors
    ///
    /// In addition to [`open`](Self::open) errors, fails if location
    /// permission is refused.
    pub async fn start(config: AppConfig) -> Result<Self, AppError> {
        let app = Self::open(config)?;
        app.controller.start().await?;
        Ok(app)
    }

    /// Wire the application around explicit collaborators.
    pub fn from_parts(
        config: AppConfig,
        database: Database,
        collector: Arc<dyn CollectorClient>,
        source: Arc<dyn PositionSource>,
    ) -> Self {
        let state = StateStore::new(database.clone());
        let queue = DurableQueue::with_capacity(database, config.storage.max_queued);
        let zones = GeofenceStore::new(state.clone());

        let source = Arc::new(CachingPositionSource::new(source, config.freshness));
        let sync = Arc::new(SyncEngine::new(
            Arc::clone(&collector),
            queue.clone(),
            state.clone(),
        ));
        let zone_sync = ZoneSync::new(Arc::clone(&collector), zones.clone(), state.clone());
        let devices = DeviceRegistry::new(collector, state.clone());

        let controller = TrackingController::new(
            Arc::clone(&source),
            zones.clone(),
            state.clone(),
            Arc::clone(&sync),
            config.tracker,
        );

        Self {
            state,
            queue,
            zones,
            source,
            sync,
            zone_sync,
            devices,
            controller,
            config,
        }
    }

    fn create_position_source(config: &PositionConfig) -> Arc<dyn PositionSource> {
        match config {
            PositionConfig::Gpsd { address, timeout } => {
                Arc::new(GpsdPositionSource::new(address.clone(), *timeout))
            }
            PositionConfig::Static {
                latitude,
                longitude,
            } => Arc::new(StaticPositionSource::new(*latitude, *longitude)),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn controller(&self) -> &TrackingController {
        &self.controller
    }

    pub fn position(&self) -> &CachingPositionSource {
        &self.source
    }

    pub fn sync(&self) -> &SyncEngine {
        &self.sync
    }

    pub fn zones(&self) -> &GeofenceStore {
        &self.zones
    }

    pub fn zone_sync(&self) -> &ZoneSync {
        &self.zone_sync
    }

    pub fn devices(&self) -> &DeviceRegistry {
        &self.devices
    }

    /// Read the persisted state for display.
    pub fn status(&self) -> Result<StatusReport, AppError> {
        Ok(StatusReport {
            device_id: self.state.device_id()?,
            queued: self.queue.len()?,
            max_queued: self.queue.max_samples(),
            last_sent_at: self.state.last_sent_at()?,
            zones: self.state.zones()?.len(),
            running: self.controller.is_running(),
        })
    }

    /// Stop tracking and release everything.
    pub async fn shutdown(self) {
        info!("Shutting down geotrack");
        self.controller.stop().await;
        info!("geotrack shutdown complete");
    }
}
