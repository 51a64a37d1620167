use serde::{Deserialize, Serialize};

/// Published live state of the current (or just-ended) trip.
///
/// While a trip is active `distance_km` only grows, one accepted fix at a
/// time. After the trip ends the whole struct may be overwritten by the
/// backend-confirmed numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LiveMetrics {
    pub distance_km: f64,
    pub avg_speed_kph: f64,
    pub elapsed_sec: i64,
}

impl LiveMetrics {
    pub fn zero() -> Self {
        Self {
            distance_km: 0.0,
            avg_speed_kph: 0.0,
            elapsed_sec: 0,
        }
    }

    pub fn distance_miles(&self) -> f64 {
        super::units::km_to_miles(self.distance_km)
    }

    pub fn avg_speed_mph(&self) -> f64 {
        super::units::kph_to_mph(self.avg_speed_kph)
    }
}

impl Default for LiveMetrics {
    fn default() -> Self {
        Self::zero()
    }
}
