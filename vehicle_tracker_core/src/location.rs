use std::time::Duration;

use tokio::sync::{mpsc, watch};
use vehicle_tracker_lib::location_fix::LocationFix;

use crate::{MIN_DISTANCE_HINT_M, SAMPLE_INTERVAL, error::TrackerError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Accuracy {
    Balanced,
    High,
}

/// Parameters handed to the platform location source when subscribing.
/// The distance hint only throttles how often the device reports; the fix
/// filter stays the authoritative movement gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchConfig {
    pub accuracy: Accuracy,
    pub interval: Duration,
    pub min_distance_m: f64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            accuracy: Accuracy::High,
            interval: SAMPLE_INTERVAL,
            min_distance_m: MIN_DISTANCE_HINT_M,
        }
    }
}

/// Platform glue implements this; permission refusal surfaces as
/// TrackerError::PermissionDenied and tracking never starts.
pub trait LocationSource: Send + Sync {
    fn watch(&self, config: WatchConfig) -> Result<LocationWatch, TrackerError>;
}

/// Receiving end of a location subscription. Fixes are consumed one at a
/// time; the consumer finishes each before the next is handed out.
pub struct LocationWatch {
    fixes: mpsc::Receiver<LocationFix>,
    stop: watch::Receiver<bool>,
}

/// Stopping the watch is the only cancellation primitive. Idempotent.
#[derive(Clone)]
pub struct StopHandle {
    stop: watch::Sender<bool>,
}

impl StopHandle {
    pub fn stop(&self) {
        let _ = self.stop.send(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.stop.borrow()
    }
}

impl LocationWatch {
    /// Channel a location source feeds fixes into. The sender half goes to
    /// the producer, the StopHandle to whoever controls the subscription.
    pub fn channel(capacity: usize) -> (mpsc::Sender<LocationFix>, StopHandle, LocationWatch) {
        let (tx, rx) = mpsc::channel(capacity);
        let (stop_tx, stop_rx) = watch::channel(false);
        (
            tx,
            StopHandle { stop: stop_tx },
            LocationWatch {
                fixes: rx,
                stop: stop_rx,
            },
        )
    }

    /// Next fix, or None once the watch is stopped or the source is gone.
    pub async fn next(&mut self) -> Option<LocationFix> {
        if *self.stop.borrow() {
            return None;
        }
        tokio::select! {
            stopped = self.stop.wait_for(|stopped| *stopped) => {
                let _ = stopped;
                None
            }
            fix = self.fixes.recv() => fix,
        }
    }
}
