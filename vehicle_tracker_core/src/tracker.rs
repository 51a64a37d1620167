use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use vehicle_tracker_lib::{
    location_fix::LocationFix, metrics::LiveMetrics, sensor_report::SensorReport, trip::TripRecord,
};

use crate::{
    DEFAULT_BACKEND_URL,
    accumulator::TripAccumulator,
    backend::BackendClient,
    error::TrackerError,
    location::{LocationSource, WatchConfig},
    telemetry::{BackendTelemetry, TelemetrySink},
};

#[derive(Debug, Clone)]
pub struct TrackerConfig {
    pub base_url: String,
    pub user_id: i64,
}

impl TrackerConfig {
    pub fn new(user_id: i64) -> Self {
        Self {
            base_url: DEFAULT_BACKEND_URL.to_string(),
            user_id,
        }
    }
}

/// What `end` resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum EndOutcome {
    /// Nothing was running; no backend call was made.
    NoActiveTrip,
    /// Trip terminated; metrics are the reconciled (or, if reconciliation
    /// failed, the locally frozen) final stats.
    Ended { trip_id: i64, metrics: LiveMetrics },
}

struct TrackerState {
    accumulator: TripAccumulator,
    driver_score: Option<f64>,
}

/// Orchestrates trip start/end against the backend and funnels location
/// fixes into the accumulator. The one mutex here is the single owner of
/// trip state; both the per-fix path and the lifecycle path go through it,
/// so a report can never pick up a stale trip id.
pub struct TripTracker {
    backend: BackendClient,
    telemetry: Arc<dyn TelemetrySink>,
    state: Arc<Mutex<TrackerState>>,
    user_id: i64,
}

impl TripTracker {
    pub fn new(config: TrackerConfig) -> Self {
        let backend = BackendClient::new(&config.base_url);
        let telemetry = Arc::new(BackendTelemetry::new(backend.clone()));
        Self::with_sink(config, telemetry)
    }

    /// Same tracker with a custom telemetry sink.
    pub fn with_sink(config: TrackerConfig, telemetry: Arc<dyn TelemetrySink>) -> Self {
        Self {
            backend: BackendClient::new(&config.base_url),
            telemetry,
            state: Arc::new(Mutex::new(TrackerState {
                accumulator: TripAccumulator::new(),
                driver_score: None,
            })),
            user_id: config.user_id,
        }
    }

    /// Registers a new trip with the backend and goes Active. On failure
    /// nothing changes locally.
    pub async fn begin(&self) -> Result<i64, TrackerError> {
        let trip_id = self.backend.start_trip(self.user_id).await?;

        let mut state = self.state.lock().await;
        state.accumulator.begin(trip_id, Utc::now());
        state.driver_score = None;
        tracing::info!("trip {trip_id} started");

        Ok(trip_id)
    }

    /// Terminates the active trip, then reconciles the local estimates with
    /// the backend's final numbers, best effort.
    pub async fn end(&self) -> Result<EndOutcome, TrackerError> {
        let Some(trip_id) = self.state.lock().await.accumulator.trip_id() else {
            return Ok(EndOutcome::NoActiveTrip);
        };

        // Until termination succeeds the trip stays active.
        self.backend.end_trip(trip_id).await?;
        self.state.lock().await.accumulator.end(Utc::now());
        tracing::info!("trip {trip_id} ended");

        match self.backend.driver_score(trip_id).await {
            Ok(score) => self.state.lock().await.driver_score = Some(score),
            Err(err) => tracing::warn!("score fetch for trip {trip_id} failed: {err}"),
        }

        match self.backend.trips(self.user_id).await {
            Ok(trips) => match trips.iter().find(|trip| trip.trip_id == trip_id) {
                Some(record) => {
                    let mut state = self.state.lock().await;
                    state.accumulator.reconcile(record.distance, record.avg_speed);
                }
                None => {
                    tracing::debug!("trip {trip_id} not in history yet, keeping local stats");
                }
            },
            Err(err) => tracing::warn!("trip history fetch failed: {err}"),
        }

        let metrics = self.metrics().await;
        Ok(EndOutcome::Ended { trip_id, metrics })
    }

    /// Per-fix entry point. Runs the filter and accumulator, then hands any
    /// accepted fix to the telemetry sink. The report is built while the
    /// lock is held; the send happens after it is released.
    pub async fn handle_fix(&self, fix: &LocationFix) {
        let accepted = {
            let mut state = self.state.lock().await;
            state.accumulator.observe(fix)
        };

        if let Some(accepted) = accepted {
            self.telemetry.report(SensorReport {
                trip_id: accepted.trip_id,
                speed: accepted.speed_kph,
                latitude: accepted.latitude,
                longitude: accepted.longitude,
            });
        }
    }

    /// Subscribes to the location source and pumps fixes until the watch is
    /// stopped or the source goes away.
    pub async fn run(&self, source: &dyn LocationSource) -> Result<(), TrackerError> {
        let mut watch = source.watch(WatchConfig::default())?;
        while let Some(fix) = watch.next().await {
            self.handle_fix(&fix).await;
        }
        Ok(())
    }

    pub async fn metrics(&self) -> LiveMetrics {
        self.state.lock().await.accumulator.metrics(Utc::now())
    }

    pub async fn driver_score(&self) -> Option<f64> {
        self.state.lock().await.driver_score
    }

    pub async fn trip_id(&self) -> Option<i64> {
        self.state.lock().await.accumulator.trip_id()
    }

    pub async fn is_active(&self) -> bool {
        self.state.lock().await.accumulator.is_active()
    }

    /// The user's finished trips, in whatever order the backend returns.
    pub async fn trip_history(&self) -> Result<Vec<TripRecord>, TrackerError> {
        self.backend.trips(self.user_id).await
    }
}
