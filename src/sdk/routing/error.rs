use serde::Deserialize;
use thiserror::Error;

// OSRM error body, e.g. {"code":"NoRoute","message":"Impossible route between points"}
#[derive(Deserialize, Debug)]
pub struct OsrmErrorPayload {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("No emergency facilities configured")]
    EmptyFacilitySet,

    #[error("API Error (HTTP {status}, {code}): {message}")]
    ApiError {
        status: u16,
        code: String,
        message: String,
    },

    // Non-success status whose body is not an OSRM error object
    #[error("Unstructured API Error (HTTP {status}): {body}")]
    RawApiError { status: u16, body: String },

    #[error("No route found between the requested points")]
    NoRoute,

    #[error("Malformed routing response: {0}")]
    Malformed(String),

    #[error("Routing service disabled (offline mode)")]
    Offline,

    #[error("Underlying request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl RoutingError {
    /// True for errors meaning the routing service could not give a usable answer.
    /// These are absorbed by the fallback policy and never reach callers.
    pub fn is_service_unavailable(&self) -> bool {
        !matches!(self, RoutingError::EmptyFacilitySet)
    }
}
