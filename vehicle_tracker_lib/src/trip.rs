use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A finished trip as the backend reports it. Read-only on this side;
/// the only construction path is deserializing a backend response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRecord {
    #[serde(rename = "tripID")]
    pub trip_id: i64,
    pub distance: f64,
    #[serde(rename = "avgSpeed")]
    pub avg_speed: f64,
    #[serde(rename = "startTime")]
    pub start_time: DateTime<Utc>,
}
