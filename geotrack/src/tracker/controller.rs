//! Tracking lifecycle and the capture tick.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::config::TrackerConfig;
use super::error::TrackerError;
use crate::geofence::GeofenceStore;
use crate::position::{CachingPositionSource, CaptureMode, PositionError, Sample};
use crate::store::{QueuedSample, StateStore};
use crate::sync::SyncEngine;
use crate::throttle::{Decision, ThrottleDecider, ThrottleState};

/// Lifecycle state of the periodic task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    Stopped,
    Running,
}

/// What one tick did with its sample.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// Delivered live; `drained` queued samples followed it.
    Sent { drained: usize },
    /// Live delivery failed; the sample is in the queue.
    Queued { sample: QueuedSample, reason: String },
    /// Inside a zone and sent recently; the sample was discarded.
    Suppressed { zone_id: String },
    /// No fix and no cached fallback.
    CaptureFailed(PositionError),
    /// Live delivery failed and the sample could not be queued either.
    Lost { reason: String },
}

/// Result of a manual update.
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    /// The collector acknowledged the sample.
    Sent { sample: Sample, drained: usize },
    /// The collector could not be reached; the sample waits in the queue.
    Queued { sample: QueuedSample, reason: String },
}

impl Delivery {
    pub fn is_sent(&self) -> bool {
        matches!(self, Delivery::Sent { .. })
    }
}

/// Everything a tick needs, shared with the background task.
struct TrackerCore {
    source: Arc<CachingPositionSource>,
    zones: GeofenceStore,
    state: StateStore,
    sync: Arc<SyncEngine>,
    decider: ThrottleDecider,
}

struct RunningTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the periodic capture cycle.
///
/// Built once at startup with its collaborators injected. [`start`](Self::start)
/// spawns the capture task on the current tokio runtime and
/// [`stop`](Self::stop) tears it down.
pub struct TrackingController {
    core: Arc<TrackerCore>,
    config: TrackerConfig,
    task: Mutex<Option<RunningTask>>,
}

impl TrackingController {
    pub fn new(
        source: Arc<CachingPositionSource>,
        zones: GeofenceStore,
        state: StateStore,
        sync: Arc<SyncEngine>,
        config: TrackerConfig,
    ) -> Self {
        let core = TrackerCore {
            source,
            zones,
            state,
            sync,
            decider: ThrottleDecider::new(config.throttle_window()),
        };

        Self {
            core: Arc::new(core),
            config,
            task: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn state(&self) -> TrackerState {
        match self.task.lock().as_ref() {
            Some(task) if !task.handle.is_finished() => TrackerState::Running,
            _ => TrackerState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == TrackerState::Running
    }

    /// Request location access and spawn the capture task.
    ///
    /// Starting while already running does nothing. A refused permission
    /// leaves the tracker stopped. Other permission-probe failures are logged
    /// and tracking starts anyway, since the source may recover by the next
    /// tick.
    pub async fn start(&self) -> Result<(), TrackerError> {
        if self.is_running() {
            debug!("Tracker already running");
            return Ok(());
        }

        match self.core.source.request_permission().await {
            Ok(()) => {}
            Err(PositionError::PermissionDenied) => {
                warn!(source = self.core.source.name(), "Location permission denied");
                return Err(TrackerError::PermissionDenied);
            }
            Err(e) => {
                warn!(
                    source = self.core.source.name(),
                    error = %e,
                    "Location source not ready, starting anyway"
                );
            }
        }

        let mut task = self.task.lock();
        if matches!(task.as_ref(), Some(t) if !t.handle.is_finished()) {
            return Ok(());
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_loop(
            Arc::clone(&self.core),
            self.config,
            cancel.clone(),
        ));
        *task = Some(RunningTask { cancel, handle });

        Ok(())
    }

    /// Cancel the capture task and wait for it to finish.
    ///
    /// A tick in progress completes first. Stopping a stopped tracker does
    /// nothing.
    pub async fn stop(&self) {
        let task = self.task.lock().take();
        let Some(task) = task else {
            return;
        };

        task.cancel.cancel();
        if let Err(e) = task.handle.await {
            error!(error = %e, "Tracking task ended abnormally");
        }
    }

    /// Run one capture tick now.
    pub async fn tick_once(&self) -> TickOutcome {
        self.core.tick_at(Utc::now()).await
    }

    /// Run one capture tick with an explicit clock.
    pub async fn tick_at(&self, now: DateTime<Utc>) -> TickOutcome {
        self.core.tick_at(now).await
    }

    /// Capture and send one sample immediately, ignoring the throttle.
    ///
    /// A fix younger than the freshness threshold is reused. If the upload
    /// fails the sample is queued and [`Delivery::Queued`] carries the reason.
    pub async fn update_now(&self) -> Result<Delivery, TrackerError> {
        let sample = self
            .core
            .source
            .capture(CaptureMode::PreferCached)
            .await
            .map_err(|e| match e {
                PositionError::PermissionDenied => TrackerError::PermissionDenied,
                other => TrackerError::Position(other),
            })?;

        match self.core.sync.send_now(&sample).await {
            Ok(()) => {
                let drained = self.core.drain_after_send().await;
                info!(
                    latitude = sample.latitude,
                    longitude = sample.longitude,
                    drained,
                    "Manual update delivered"
                );
                Ok(Delivery::Sent { sample, drained })
            }
            Err(e) => {
                let queued = self.core.sync.queue().append(&sample)?;
                warn!(
                    sample_id = %queued.id,
                    error = %e,
                    "Manual update failed, sample queued"
                );
                Ok(Delivery::Queued {
                    sample: queued,
                    reason: e.to_string(),
                })
            }
        }
    }
}

impl Drop for TrackingController {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.cancel.cancel();
        }
    }
}

async fn run_loop(core: Arc<TrackerCore>, config: TrackerConfig, cancel: CancellationToken) {
    info!(
        source = core.source.name(),
        interval_secs = config.interval().as_secs(),
        throttle_window_secs = config.throttle_window().as_secs(),
        "Tracking started"
    );

    // Samples left over from a previous run go first.
    match core.sync.drain().await {
        Ok(0) => {}
        Ok(n) => info!(delivered = n, "Recovered queued samples"),
        Err(e) => warn!(error = %e, "Startup drain failed"),
    }

    let mut ticker = tokio::time::interval(config.interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            _ = ticker.tick() => {
                let outcome = core.tick_at(Utc::now()).await;
                debug!(outcome = ?outcome, "Tick complete");
            }
        }
    }

    info!("Tracking stopped");
}

impl TrackerCore {
    async fn tick_at(&self, now: DateTime<Utc>) -> TickOutcome {
        let sample = match self.source.capture_at(CaptureMode::Fresh, now).await {
            Ok(sample) => sample,
            Err(e) => {
                warn!(source = self.source.name(), error = %e, "Capture failed");
                return TickOutcome::CaptureFailed(e);
            }
        };

        let zones = self.zones.list().unwrap_or_else(|e| {
            error!(error = %e, "Failed to load zones, treating as outside all zones");
            Vec::new()
        });
        let previous = self.state.throttle_state().unwrap_or_else(|e| {
            error!(error = %e, "Failed to load throttle state");
            ThrottleState::default()
        });

        let outcome = self
            .decider
            .decide(sample.position(), &zones, &previous, now);

        if outcome.state_changed(&previous) {
            if let Err(e) = self.state.set_throttle_state(&outcome.next_state) {
                error!(error = %e, "Failed to persist throttle state");
            }
        }

        debug!(
            latitude = sample.latitude,
            longitude = sample.longitude,
            decision = %outcome.decision,
            zone = ?outcome.zone_id,
            "Throttle decision"
        );

        match outcome.decision {
            Decision::Suppress => TickOutcome::Suppressed {
                zone_id: outcome.zone_id.unwrap_or_default(),
            },
            Decision::Send => self.deliver(&sample).await,
        }
    }

    async fn deliver(&self, sample: &Sample) -> TickOutcome {
        match self.sync.send_now(sample).await {
            Ok(()) => TickOutcome::Sent {
                drained: self.drain_after_send().await,
            },
            Err(send_err) => match self.sync.queue().append(sample) {
                Ok(queued) => {
                    info!(
                        sample_id = %queued.id,
                        reason = %send_err,
                        "Sample queued for later delivery"
                    );
                    TickOutcome::Queued {
                        sample: queued,
                        reason: send_err.to_string(),
                    }
                }
                Err(store_err) => {
                    error!(
                        latitude = sample.latitude,
                        longitude = sample.longitude,
                        send_error = %send_err,
                        store_error = %store_err,
                        "Sample lost"
                    );
                    TickOutcome::Lost {
                        reason: store_err.to_string(),
                    }
                }
            },
        }
    }

    /// The collector is reachable right now; flush whatever is waiting.
    async fn drain_after_send(&self) -> usize {
        self.sync.drain().await.unwrap_or_else(|e| {
            warn!(error = %e, "Drain after send failed");
            0
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::TimeZone;

    use crate::collector::{CollectorError, MockCollector};
    use crate::geo::offset_north;
    use crate::geofence::{NewZone, Zone};
    use crate::position::ScriptedPositionSource;
    use crate::store::{Database, DurableQueue};

    const ZONE: (f64, f64) = (10.0, 10.0);

    struct Harness {
        controller: TrackingController,
        source: Arc<ScriptedPositionSource>,
        collector: Arc<MockCollector>,
        state: StateStore,
        queue: DurableQueue,
        zone: Zone,
    }

    fn t(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap()
    }

    fn at_distance(meters: f64, when: DateTime<Utc>) -> Result<Sample, PositionError> {
        let (lat, lon) = offset_north(ZONE, meters);
        Ok(Sample::new(lat, lon, when))
    }

    fn harness_with(source: ScriptedPositionSource, registered: bool) -> Harness {
        let config = TrackerConfig::new().with_interval(Duration::from_secs(30));
        harness_with_config(source, registered, config)
    }

    fn harness_with_config(
        source: ScriptedPositionSource,
        registered: bool,
        config: TrackerConfig,
    ) -> Harness {
        let db = Database::open_in_memory().unwrap();
        let state = StateStore::new(db.clone());
        if registered {
            state.set_device_id("device-1").unwrap();
        }
        let zones = GeofenceStore::new(state.clone());
        let zone = zones
            .add(NewZone::new("Yard", ZONE.0, ZONE.1).with_radius(100.0))
            .unwrap();

        let queue = DurableQueue::new(db);
        let collector = Arc::new(MockCollector::new());
        let sync = Arc::new(SyncEngine::new(collector.clone(), queue.clone(), state.clone()));

        let source = Arc::new(source);
        let caching = Arc::new(CachingPositionSource::new(
            source.clone(),
            Duration::from_secs(30),
        ));
        let controller = TrackingController::new(
            caching,
            zones,
            state.clone(),
            sync,
            config,
        );

        Harness {
            controller,
            source,
            collector,
            state,
            queue,
            zone,
        }
    }

    fn harness(script: Vec<Result<Sample, PositionError>>) -> Harness {
        harness_with(ScriptedPositionSource::new(script), true)
    }

    #[tokio::test]
    async fn test_first_tick_in_zone_sends_and_records() {
        let h = harness(vec![at_distance(50.0, t(0))]);

        let outcome = h.controller.tick_at(t(0)).await;

        assert_eq!(outcome, TickOutcome::Sent { drained: 0 });
        assert_eq!(h.collector.uploads().len(), 1);
        assert_eq!(h.state.last_sent_at().unwrap(), Some(t(0)));
    }

    #[tokio::test]
    async fn test_in_zone_within_window_is_suppressed() {
        let h = harness(vec![at_distance(50.0, t(0)), at_distance(50.0, t(5))]);

        h.controller.tick_at(t(0)).await;
        let outcome = h.controller.tick_at(t(5)).await;

        assert_eq!(
            outcome,
            TickOutcome::Suppressed {
                zone_id: h.zone.id.clone()
            }
        );
        assert_eq!(h.collector.uploads().len(), 1);
        assert!(h.queue.is_empty().unwrap());
        assert_eq!(h.state.last_sent_at().unwrap(), Some(t(0)));
    }

    #[tokio::test]
    async fn test_in_zone_after_window_sends_again() {
        let h = harness(vec![at_distance(50.0, t(0)), at_distance(50.0, t(11))]);

        h.controller.tick_at(t(0)).await;
        let outcome = h.controller.tick_at(t(11)).await;

        assert_eq!(outcome, TickOutcome::Sent { drained: 0 });
        assert_eq!(h.collector.uploads().len(), 2);
        assert_eq!(h.state.last_sent_at().unwrap(), Some(t(11)));
    }

    #[tokio::test]
    async fn test_leaving_zone_clears_throttle() {
        let h = harness(vec![at_distance(50.0, t(0)), at_distance(150.0, t(1))]);

        h.controller.tick_at(t(0)).await;
        let outcome = h.controller.tick_at(t(1)).await;

        assert_eq!(outcome, TickOutcome::Sent { drained: 0 });
        assert_eq!(h.state.last_sent_at().unwrap(), None);
    }

    #[tokio::test]
    async fn test_offline_tick_queues_then_next_send_drains() {
        let h = harness(vec![at_distance(500.0, t(0)), at_distance(500.0, t(1))]);
        h.collector.set_offline(true);

        let outcome = h.controller.tick_at(t(0)).await;
        assert!(matches!(outcome, TickOutcome::Queued { .. }));
        assert_eq!(h.queue.len().unwrap(), 1);

        h.collector.set_offline(false);
        let outcome = h.controller.tick_at(t(1)).await;

        assert_eq!(outcome, TickOutcome::Sent { drained: 1 });
        assert!(h.queue.is_empty().unwrap());
        assert_eq!(h.collector.uploads().len(), 2);
    }

    #[tokio::test]
    async fn test_unregistered_device_queues() {
        let h = harness_with(
            ScriptedPositionSource::new(vec![at_distance(500.0, t(0))]),
            false,
        );

        let outcome = h.controller.tick_at(t(0)).await;

        assert!(
            matches!(outcome, TickOutcome::Queued { ref reason, .. } if reason.contains("identity"))
        );
        assert_eq!(h.collector.calls(), 0);
    }

    #[tokio::test]
    async fn test_capture_failure_without_cache() {
        let h = harness(vec![Err(PositionError::Unavailable("no fix".into()))]);

        let outcome = h.controller.tick_at(t(0)).await;

        assert!(matches!(outcome, TickOutcome::CaptureFailed(_)));
        assert_eq!(h.collector.calls(), 0);
    }

    #[tokio::test]
    async fn test_capture_failure_falls_back_to_cached_fix() {
        let h = harness(vec![
            at_distance(500.0, t(0)),
            Err(PositionError::Timeout(Duration::from_secs(20))),
        ]);

        h.controller.tick_at(t(0)).await;
        let outcome = h.controller.tick_at(t(1)).await;

        assert_eq!(outcome, TickOutcome::Sent { drained: 0 });
        assert_eq!(h.collector.uploads().len(), 2);
    }

    #[tokio::test]
    async fn test_update_now_bypasses_throttle() {
        let h = harness(vec![at_distance(50.0, t(0)), at_distance(50.0, t(0))]);
        h.controller.tick_at(t(0)).await;

        let delivery = h.controller.update_now().await.unwrap();

        assert!(delivery.is_sent());
        assert_eq!(h.collector.uploads().len(), 2);
    }

    #[tokio::test]
    async fn test_update_now_reuses_fresh_cached_fix() {
        let now = Utc::now();
        let h = harness(vec![at_distance(500.0, now)]);
        h.controller.tick_at(now).await;

        h.controller.update_now().await.unwrap();

        assert_eq!(h.source.requests(), 1);
        assert_eq!(h.collector.uploads().len(), 2);
    }

    #[tokio::test]
    async fn test_update_now_failure_queues_with_reason() {
        let h = harness(vec![at_distance(500.0, t(0))]);
        h.collector
            .script_locations(vec![Err(CollectorError::Network("timed out".into()))]);

        let delivery = h.controller.update_now().await.unwrap();

        match delivery {
            Delivery::Queued { reason, sample } => {
                assert!(reason.contains("timed out"));
                assert_eq!(h.queue.peek_all().unwrap(), vec![sample]);
            }
            other => panic!("expected queued, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_update_now_without_fix() {
        let h = harness(Vec::new());

        let result = h.controller.update_now().await;

        assert!(matches!(result, Err(TrackerError::Position(_))));
    }

    #[tokio::test]
    async fn test_start_denied_stays_stopped() {
        let h = harness_with(ScriptedPositionSource::denied(), true);

        let result = h.controller.start().await;

        assert!(matches!(result, Err(TrackerError::PermissionDenied)));
        assert_eq!(h.controller.state(), TrackerState::Stopped);
    }

    #[tokio::test]
    async fn test_start_drains_backlog_and_ticks() {
        let h = harness(vec![at_distance(500.0, Utc::now())]);
        h.queue.append(&Sample::new(11.0, 11.0, t(0))).unwrap();

        h.controller.start().await.unwrap();
        assert!(h.controller.is_running());

        for _ in 0..100 {
            if h.collector.uploads().len() >= 2 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        h.controller.stop().await;

        assert_eq!(h.controller.state(), TrackerState::Stopped);
        assert!(h.queue.is_empty().unwrap());
        let uploads = h.collector.uploads();
        assert_eq!(uploads.len(), 2);
        assert_eq!(uploads[0].latitude, 11.0);
    }

    #[tokio::test]
    async fn test_start_twice_and_stop_twice() {
        let h = harness(Vec::new());

        h.controller.start().await.unwrap();
        h.controller.start().await.unwrap();
        assert!(h.controller.is_running());

        h.controller.stop().await;
        h.controller.stop().await;
        assert!(!h.controller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_follow_interval() {
        let h = harness(Vec::new());

        h.controller.start().await.unwrap();
        tokio::time::sleep(Duration::from_secs(95)).await;
        h.controller.stop().await;

        // Immediate first tick plus one every 30 s.
        assert_eq!(h.source.requests(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_interval_keeps_task_alive() {
        let config = TrackerConfig::new().with_interval(Duration::ZERO);
        let h = harness_with_config(ScriptedPositionSource::new(Vec::new()), true, config);

        h.controller.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(3_500)).await;

        assert!(h.controller.is_running());
        // Ticks at 0, 1, 2 and 3 s.
        assert_eq!(h.source.requests(), 4);
        h.controller.stop().await;
    }
}
