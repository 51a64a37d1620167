use std::time::Duration;

use serde::{Deserialize, Serialize};
use vehicle_tracker_lib::{sensor_report::SensorReport, trip::TripRecord};

use crate::error::TrackerError;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// REST client for the scoring backend.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct StartTripRequest {
    user_id: i64,
}

#[derive(Deserialize)]
struct StartTripResponse {
    #[serde(rename = "tripID")]
    trip_id: i64,
}

#[derive(Serialize)]
struct EndTripRequest {
    #[serde(rename = "tripID")]
    trip_id: i64,
}

#[derive(Deserialize)]
struct ScoreResponse {
    score: f64,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl BackendClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            http,
            base_url: base_url.into(),
        }
    }

    pub async fn start_trip(&self, user_id: i64) -> Result<i64, TrackerError> {
        let response = self
            .http
            .post(format!("{}/trip/start", self.base_url))
            .json(&StartTripRequest { user_id })
            .send()
            .await?;

        let response = check_status(response).await?;
        let body: StartTripResponse = response.json().await?;
        Ok(body.trip_id)
    }

    pub async fn end_trip(&self, trip_id: i64) -> Result<(), TrackerError> {
        let response = self
            .http
            .post(format!("{}/trip/end", self.base_url))
            .json(&EndTripRequest { trip_id })
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    /// The response body is ignored on purpose; the caller only cares that
    /// the request completed.
    pub async fn send_sensor(&self, report: &SensorReport) -> Result<(), TrackerError> {
        let response = self
            .http
            .post(format!("{}/sensor", self.base_url))
            .json(report)
            .send()
            .await?;

        check_status(response).await?;
        Ok(())
    }

    pub async fn driver_score(&self, trip_id: i64) -> Result<f64, TrackerError> {
        let response = self
            .http
            .get(format!("{}/driver/score/{}", self.base_url, trip_id))
            .send()
            .await?;

        let response = check_status(response).await?;
        let body: ScoreResponse = response.json().await?;
        Ok(body.score)
    }

    pub async fn trips(&self, user_id: i64) -> Result<Vec<TripRecord>, TrackerError> {
        let response = self
            .http
            .get(format!("{}/trips/{}", self.base_url, user_id))
            .send()
            .await?;

        let response = check_status(response).await?;
        let trips = response.json().await?;
        Ok(trips)
    }
}

/// Maps non-2xx responses to BackendRejected, pulling the user-facing text
/// out of the optional `message` field.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, TrackerError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = match response.json::<ErrorBody>().await {
        Ok(ErrorBody { message: Some(msg) }) => msg,
        _ => format!("backend returned {}", status),
    };

    Err(TrackerError::BackendRejected {
        status: status.as_u16(),
        message,
    })
}
