pub mod location_fix;
pub mod metrics;
pub mod sensor_report;
pub mod trip;
pub mod units;
