use vehicle_tracker_lib::sensor_report::SensorReport;

use crate::backend::BackendClient;

/// Outbound telemetry seam. Reports are at-most-once and lossy on purpose:
/// a failed send is permanently gone and must never interrupt live
/// tracking, so implementations may not block, fail, or panic.
pub trait TelemetrySink: Send + Sync {
    fn report(&self, report: SensorReport);
}

/// Posts reports to the backend from a spawned task. Failures are logged
/// and swallowed; the fix path never hears about them.
pub struct BackendTelemetry {
    backend: BackendClient,
}

impl BackendTelemetry {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }
}

impl TelemetrySink for BackendTelemetry {
    fn report(&self, report: SensorReport) {
        let backend = self.backend.clone();
        tokio::spawn(async move {
            if let Err(err) = backend.send_sensor(&report).await {
                tracing::debug!("dropped sensor report for trip {}: {err}", report.trip_id);
            }
        });
    }
}
