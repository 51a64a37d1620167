use chrono::{DateTime, Utc};
use vehicle_tracker_lib::{location_fix::LocationFix, metrics::LiveMetrics, units};

use crate::fix_filter::{FilterVerdict, FixFilter};

#[derive(Debug, Clone, Copy, PartialEq)]
enum TripPhase {
    Idle,
    Active {
        trip_id: i64,
        started_at: DateTime<Utc>,
    },
}

/// Running distance/speed/elapsed state for the active trip.
///
/// Two phases: Idle (fixes are ignored, metrics frozen) and Active (accepted
/// fixes grow the metrics). The local average speed is cumulative distance
/// over elapsed time; the backend-confirmed average replaces it after the
/// trip ends.
#[derive(Debug, Clone)]
pub struct TripAccumulator {
    phase: TripPhase,
    filter: FixFilter,
    metrics: LiveMetrics,
}

/// A fix that survived the filter while a trip was active, ready to be
/// turned into a sensor report. Speed is already km/h; a fix without a
/// reported speed counts as 0.
#[derive(Debug, Clone, PartialEq)]
pub struct AcceptedFix {
    pub trip_id: i64,
    pub speed_kph: f64,
    pub latitude: f64,
    pub longitude: f64,
}

impl TripAccumulator {
    pub fn new() -> Self {
        Self {
            phase: TripPhase::Idle,
            filter: FixFilter::new(),
            metrics: LiveMetrics::zero(),
        }
    }

    pub fn trip_id(&self) -> Option<i64> {
        match self.phase {
            TripPhase::Active { trip_id, .. } => Some(trip_id),
            TripPhase::Idle => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self.phase, TripPhase::Active { .. })
    }

    /// Starts a fresh trip, discarding whatever came before.
    pub fn begin(&mut self, trip_id: i64, started_at: DateTime<Utc>) {
        self.phase = TripPhase::Active { trip_id, started_at };
        self.filter.reset();
        self.metrics = LiveMetrics::zero();
    }

    /// Feeds one fix through the filter. Returns the accepted fix when it
    /// should also be reported as telemetry, None when it was dropped or no
    /// trip is active.
    pub fn observe(&mut self, fix: &LocationFix) -> Option<AcceptedFix> {
        let TripPhase::Active { trip_id, started_at } = self.phase else {
            return None;
        };

        let verdict = self.filter.accept(fix);
        match verdict {
            FilterVerdict::FirstFix => {}
            FilterVerdict::Moved { km } => {
                self.metrics.distance_km += km;
                let elapsed = (fix.timestamp - started_at).num_seconds().max(0);
                self.metrics.elapsed_sec = elapsed;
                let hours = elapsed as f64 / 3600.0;
                self.metrics.avg_speed_kph = if hours > 0.0 {
                    self.metrics.distance_km / hours
                } else {
                    0.0
                };
            }
            FilterVerdict::Stationary => return None,
        }

        Some(AcceptedFix {
            trip_id,
            speed_kph: units::mps_to_kph(fix.speed_mps.unwrap_or(0.0)),
            latitude: fix.latitude(),
            longitude: fix.longitude(),
        })
    }

    /// Freezes the metrics and goes back to Idle. Returns the frozen
    /// snapshot; later reconciliation may still overwrite it.
    pub fn end(&mut self, ended_at: DateTime<Utc>) -> LiveMetrics {
        if let TripPhase::Active { started_at, .. } = self.phase {
            self.metrics.elapsed_sec = (ended_at - started_at).num_seconds().max(0);
        }
        self.phase = TripPhase::Idle;
        self.filter.reset();
        self.metrics
    }

    /// Wholesale overwrite with backend-confirmed final stats.
    pub fn reconcile(&mut self, distance_km: f64, avg_speed_kph: f64) {
        self.metrics.distance_km = distance_km;
        self.metrics.avg_speed_kph = avg_speed_kph;
    }

    /// Published metrics; elapsed time tracks the wall clock while active.
    pub fn metrics(&self, now: DateTime<Utc>) -> LiveMetrics {
        let mut metrics = self.metrics;
        if let TripPhase::Active { started_at, .. } = self.phase {
            metrics.elapsed_sec = (now - started_at).num_seconds().max(0);
        }
        metrics
    }
}

impl Default for TripAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
