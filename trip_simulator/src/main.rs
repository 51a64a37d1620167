use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vehicle_tracker_core::{
    DEFAULT_BACKEND_URL, EndOutcome, TrackerConfig, TrackerError, TripTracker,
    location::{LocationSource, LocationWatch, StopHandle, WatchConfig},
};
use vehicle_tracker_lib::{location_fix::LocationFix, units};

/// Drives a synthetic trip through the tracker against a live backend.
#[derive(Parser)]
#[command(name = "TripSimulator")]
#[command(about = "Simulates a vehicle trip and relays it to the scoring backend", long_about = None)]
struct Cli {
    /// Backend base URL
    #[arg(long, default_value = DEFAULT_BACKEND_URL)]
    backend: String,

    /// User to book the trip on
    #[arg(long, default_value_t = 1)]
    user_id: i64,

    /// Start latitude in degrees
    #[arg(long, default_value_t = 55.6761)]
    latitude: f64,

    /// Start longitude in degrees
    #[arg(long, default_value_t = 12.5683)]
    longitude: f64,

    /// Vehicle speed in km/h
    #[arg(long, default_value_t = 50.0)]
    speed_kph: f64,

    /// Trip duration in seconds
    #[arg(long, default_value_t = 30)]
    duration_secs: u64,
}

/// Emits fixes along a constant-bearing path (due east) at a fixed speed,
/// at the configured sampling interval.
struct SimulatedRoute {
    start_latitude: f64,
    start_longitude: f64,
    speed_kph: f64,
    stop: Mutex<Option<StopHandle>>,
}

impl SimulatedRoute {
    fn new(start_latitude: f64, start_longitude: f64, speed_kph: f64) -> Self {
        Self {
            start_latitude,
            start_longitude,
            speed_kph,
            stop: Mutex::new(None),
        }
    }

    fn stop(&self) {
        if let Some(stop) = self.stop.lock().unwrap().as_ref() {
            stop.stop();
        }
    }
}

impl LocationSource for SimulatedRoute {
    fn watch(&self, config: WatchConfig) -> Result<LocationWatch, TrackerError> {
        let (tx, stop, watch) = LocationWatch::channel(16);
        self.stop.lock().unwrap().replace(stop.clone());

        let latitude = self.start_latitude;
        let mut longitude = self.start_longitude;
        let speed_mps = self.speed_kph / units::KPH_PER_MPS;
        let interval = config.interval;

        tokio::spawn(async move {
            // degrees of longitude covered per sample at this latitude
            let meters_per_degree = 111_320.0 * latitude.to_radians().cos();
            let step = speed_mps * interval.as_secs_f64() / meters_per_degree;

            while !stop.is_stopped() {
                let fix = LocationFix::new(latitude, longitude, Some(speed_mps), Utc::now());
                if tx.send(fix).await.is_err() {
                    break;
                }
                longitude += step;
                tokio::time::sleep(interval).await;
            }
        });

        Ok(watch)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let tracker = Arc::new(TripTracker::new(TrackerConfig {
        base_url: cli.backend.clone(),
        user_id: cli.user_id,
    }));

    let trip_id = tracker.begin().await?;
    tracing::info!("trip {trip_id} registered with {}", cli.backend);

    let route = Arc::new(SimulatedRoute::new(cli.latitude, cli.longitude, cli.speed_kph));

    let pump = {
        let tracker = tracker.clone();
        let route = route.clone();
        tokio::spawn(async move { tracker.run(route.as_ref()).await })
    };

    tokio::time::sleep(Duration::from_secs(cli.duration_secs)).await;
    route.stop();
    pump.await??;

    match tracker.end().await? {
        EndOutcome::Ended { trip_id, metrics } => {
            println!("Trip {trip_id} finished");
            println!(
                "  distance:  {:.2} km ({:.2} mi)",
                metrics.distance_km,
                metrics.distance_miles()
            );
            println!(
                "  avg speed: {:.1} km/h ({:.1} mph)",
                metrics.avg_speed_kph,
                metrics.avg_speed_mph()
            );
            println!("  duration:  {} s", metrics.elapsed_sec);
            match tracker.driver_score().await {
                Some(score) => println!("  score:     {score:.0}/100"),
                None => println!("  score:     not available"),
            }
        }
        EndOutcome::NoActiveTrip => println!("No active trip"),
    }

    Ok(())
}
