use thiserror::Error;

/// Everything a backend call or the location source can fail with.
///
/// All of these surface as user-visible notices at the call site; none of
/// them propagate as panics and nothing is retried anywhere in the core.
#[derive(Debug, Clone, Error)]
pub enum TrackerError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response. The message is shown to the user verbatim.
    #[error("{message}")]
    BackendRejected { status: u16, message: String },
}

impl From<reqwest::Error> for TrackerError {
    fn from(err: reqwest::Error) -> Self {
        TrackerError::Network(err.to_string())
    }
}
