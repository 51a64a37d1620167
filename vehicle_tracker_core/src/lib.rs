use std::time::Duration;

pub mod accumulator;
pub mod backend;
pub mod error;
pub mod fix_filter;
pub mod location;
pub mod telemetry;
mod tracker;

pub use error::TrackerError;
pub use tracker::*;

/// Deployment-time constant; override through TrackerConfig.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:5000";

/// Movement below this haversine distance is GPS jitter, not driving.
pub const MIN_MOVEMENT_KM: f64 = 0.001;

/// Requested sampling interval for the device location source.
pub const SAMPLE_INTERVAL: Duration = Duration::from_secs(2);

/// Reported-movement hint for the location source. Coarser than the
/// authoritative MIN_MOVEMENT_KM gate in the fix filter.
pub const MIN_DISTANCE_HINT_M: f64 = 1.0;
