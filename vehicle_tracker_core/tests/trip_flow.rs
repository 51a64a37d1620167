use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde_json::json;
use vehicle_tracker_core::{EndOutcome, TrackerConfig, TrackerError, TripTracker};
use vehicle_tracker_lib::{location_fix::LocationFix, sensor_report::SensorReport, trip::TripRecord};

/// In-process stand-in for the scoring backend, serving the same REST
/// surface on an ephemeral port.
#[derive(Default)]
struct StubBackend {
    start_calls: AtomicUsize,
    end_calls: AtomicUsize,
    score_calls: AtomicUsize,
    trips_calls: AtomicUsize,
    sensor_reports: Mutex<Vec<SensorReport>>,
    trips: Mutex<Vec<TripRecord>>,
    reject_start: bool,
    fail_sensor: bool,
    fail_score: bool,
}

async fn start_trip(State(stub): State<Arc<StubBackend>>) -> Response {
    stub.start_calls.fetch_add(1, Ordering::SeqCst);
    if stub.reject_start {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "Failed to start trip"})),
        )
            .into_response();
    }
    Json(json!({"message": "Trip started", "tripID": 42})).into_response()
}

async fn end_trip(State(stub): State<Arc<StubBackend>>) -> Response {
    stub.end_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({"message": "Trip ended"})).into_response()
}

async fn sensor(State(stub): State<Arc<StubBackend>>, Json(report): Json<SensorReport>) -> Response {
    if stub.fail_sensor {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "Failed to save sensor data"})),
        )
            .into_response();
    }
    stub.sensor_reports.lock().unwrap().push(report);
    Json(json!({"status": "ok"})).into_response()
}

async fn driver_score(State(stub): State<Arc<StubBackend>>, Path(_trip_id): Path<i64>) -> Response {
    stub.score_calls.fetch_add(1, Ordering::SeqCst);
    if stub.fail_score {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({"message": "No sensor data found"})),
        )
            .into_response();
    }
    Json(json!({"score": 87})).into_response()
}

async fn trips(State(stub): State<Arc<StubBackend>>, Path(_user_id): Path<i64>) -> Response {
    stub.trips_calls.fetch_add(1, Ordering::SeqCst);
    Json(stub.trips.lock().unwrap().clone()).into_response()
}

async fn spawn_backend(stub: Arc<StubBackend>) -> String {
    let app = Router::new()
        .route("/trip/start", post(start_trip))
        .route("/trip/end", post(end_trip))
        .route("/sensor", post(sensor))
        .route("/driver/score/{trip_id}", get(driver_score))
        .route("/trips/{user_id}", get(trips))
        .with_state(stub);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

fn tracker_for(base_url: String) -> TripTracker {
    TripTracker::new(TrackerConfig {
        base_url,
        user_id: 1,
    })
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not met within 2s");
}

#[tokio::test]
async fn full_trip_flow_reconciles_with_backend() {
    let stub = Arc::new(StubBackend::default());
    stub.trips.lock().unwrap().push(TripRecord {
        trip_id: 42,
        distance: 9.5,
        avg_speed: 30.2,
        start_time: Utc::now(),
    });
    let tracker = tracker_for(spawn_backend(stub.clone()).await);

    let trip_id = tracker.begin().await.unwrap();
    assert_eq!(trip_id, 42);

    // first fix plus ~2.2 m of movement
    tracker
        .handle_fix(&LocationFix::new(0.0, 0.0, Some(5.0), Utc::now()))
        .await;
    tracker
        .handle_fix(&LocationFix::new(0.0, 0.00002, Some(1.0), Utc::now()))
        .await;

    wait_until(|| stub.sensor_reports.lock().unwrap().len() == 2).await;
    {
        let reports = stub.sensor_reports.lock().unwrap();
        assert!(reports.iter().all(|report| report.trip_id == 42));
        assert!(reports.iter().any(|report| {
            (report.speed - 3.6).abs() < 1e-9 && (report.longitude - 0.00002).abs() < 1e-12
        }));
    }

    let local = tracker.metrics().await;
    assert!((local.distance_km - 0.0022239).abs() < 1e-6);

    // backend-confirmed stats replace the local estimate
    match tracker.end().await.unwrap() {
        EndOutcome::Ended { trip_id, metrics } => {
            assert_eq!(trip_id, 42);
            assert_eq!(metrics.distance_km, 9.5);
            assert_eq!(metrics.avg_speed_kph, 30.2);
        }
        EndOutcome::NoActiveTrip => panic!("trip was active"),
    }

    assert_eq!(stub.end_calls.load(Ordering::SeqCst), 1);
    assert_eq!(tracker.driver_score().await, Some(87.0));
    assert_eq!(tracker.trip_id().await, None);
}

#[tokio::test]
async fn end_without_active_trip_makes_no_backend_calls() {
    let stub = Arc::new(StubBackend::default());
    let tracker = tracker_for(spawn_backend(stub.clone()).await);

    assert_eq!(tracker.end().await.unwrap(), EndOutcome::NoActiveTrip);

    assert_eq!(stub.end_calls.load(Ordering::SeqCst), 0);
    assert_eq!(stub.score_calls.load(Ordering::SeqCst), 0);
    assert_eq!(stub.trips_calls.load(Ordering::SeqCst), 0);
    assert_eq!(tracker.metrics().await.distance_km, 0.0);
}

#[tokio::test]
async fn rejected_begin_surfaces_backend_message() {
    let stub = Arc::new(StubBackend {
        reject_start: true,
        ..Default::default()
    });
    let tracker = tracker_for(spawn_backend(stub).await);

    match tracker.begin().await.unwrap_err() {
        TrackerError::BackendRejected { status, message } => {
            assert_eq!(status, 500);
            assert_eq!(message, "Failed to start trip");
        }
        other => panic!("expected BackendRejected, got {other:?}"),
    }
    assert!(!tracker.is_active().await);
}

#[tokio::test]
async fn begin_network_failure_leaves_tracker_idle() {
    // unroutable port, nothing listening
    let tracker = tracker_for("http://127.0.0.1:1".to_string());

    let err = tracker.begin().await.unwrap_err();
    assert!(matches!(err, TrackerError::Network(_)));
    assert!(!tracker.is_active().await);
    assert_eq!(tracker.metrics().await.distance_km, 0.0);
}

#[tokio::test]
async fn failing_telemetry_never_interrupts_tracking() {
    let stub = Arc::new(StubBackend {
        fail_sensor: true,
        ..Default::default()
    });
    let tracker = tracker_for(spawn_backend(stub.clone()).await);

    tracker.begin().await.unwrap();
    tracker
        .handle_fix(&LocationFix::new(0.0, 0.0, None, Utc::now()))
        .await;
    tracker
        .handle_fix(&LocationFix::new(0.0, 0.00002, None, Utc::now()))
        .await;
    tracker
        .handle_fix(&LocationFix::new(0.0, 0.00004, None, Utc::now()))
        .await;

    // give the fire-and-forget sends time to fail
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert!(tracker.is_active().await);
    let metrics = tracker.metrics().await;
    assert!((metrics.distance_km - 2.0 * 0.0022239).abs() < 1e-6);
}

#[tokio::test]
async fn reconciliation_keeps_local_stats_when_trip_missing() {
    let stub = Arc::new(StubBackend::default()); // empty trip list
    let tracker = tracker_for(spawn_backend(stub.clone()).await);

    tracker.begin().await.unwrap();
    tracker
        .handle_fix(&LocationFix::new(0.0, 0.0, None, Utc::now()))
        .await;
    tracker
        .handle_fix(&LocationFix::new(0.0, 0.00002, None, Utc::now()))
        .await;

    let local = tracker.metrics().await;
    match tracker.end().await.unwrap() {
        EndOutcome::Ended { metrics, .. } => {
            assert_eq!(metrics.distance_km, local.distance_km);
        }
        EndOutcome::NoActiveTrip => panic!("trip was active"),
    }
    assert_eq!(stub.trips_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn score_failure_is_swallowed_and_list_still_reconciles() {
    let stub = Arc::new(StubBackend {
        fail_score: true,
        ..Default::default()
    });
    stub.trips.lock().unwrap().push(TripRecord {
        trip_id: 42,
        distance: 12.25,
        avg_speed: 44.0,
        start_time: Utc::now(),
    });
    let tracker = tracker_for(spawn_backend(stub.clone()).await);

    tracker.begin().await.unwrap();
    match tracker.end().await.unwrap() {
        EndOutcome::Ended { metrics, .. } => {
            assert_eq!(metrics.distance_km, 12.25);
            assert_eq!(metrics.avg_speed_kph, 44.0);
        }
        EndOutcome::NoActiveTrip => panic!("trip was active"),
    }
    assert_eq!(tracker.driver_score().await, None);
}

#[tokio::test]
async fn trip_history_returns_backend_records() {
    let stub = Arc::new(StubBackend::default());
    let record = TripRecord {
        trip_id: 7,
        distance: 3.5,
        avg_speed: 28.0,
        start_time: Utc::now(),
    };
    stub.trips.lock().unwrap().push(record.clone());
    let tracker = tracker_for(spawn_backend(stub).await);

    let history = tracker.trip_history().await.unwrap();
    assert_eq!(history, vec![record]);
}
