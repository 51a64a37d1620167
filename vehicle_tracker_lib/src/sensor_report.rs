use serde::{Deserialize, Serialize};

/// One outbound telemetry sample, produced per accepted fix.
///
/// Field names follow the backend's JSON contract. Speed is already
/// converted to km/h by the time a report is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReport {
    #[serde(rename = "tripID")]
    pub trip_id: i64,
    pub speed: f64,
    pub latitude: f64,
    pub longitude: f64,
}
