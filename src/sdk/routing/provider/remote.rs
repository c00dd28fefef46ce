use super::parse::{parse_directions, DirectionsOutcome};
use crate::sdk::geo::Coordinate;
use crate::sdk::routing::error::{OsrmErrorPayload, RoutingError};
use crate::sdk::routing::route::RouteResult;
use crate::sdk::routing::service::RoutingProvider;
use crate::sdk::util::rate_limit::Limiter;
use reqwest::blocking::Client;
use std::time::Duration;

pub const DEFAULT_OSRM_BASE_URL: &str = "https://router.project-osrm.org/route/v1/driving";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(8);

pub struct RemoteOsrmProvider {
    client: Client,
    base_url: String,
    limiter: Option<Limiter>,
}

impl RemoteOsrmProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, RoutingError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("hazard-router/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            limiter: None,
        })
    }

    /// Throttles every request made through this provider, batch or not.
    pub fn with_limiter(mut self, limiter: Limiter) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn route_url(&self, start: Coordinate, end: Coordinate) -> String {
        format!(
            "{}/{},{};{},{}?overview=full&geometries=geojson&steps=true",
            self.base_url, start.lon, start.lat, end.lon, end.lat
        )
    }
}

impl RoutingProvider for RemoteOsrmProvider {
    fn get_directions(&self, start: Coordinate, end: Coordinate) -> Result<RouteResult, RoutingError> {
        if start == end {
            log::debug!("Start and end coordinates are identical. Returning zero route.");
            return Ok(RouteResult::stationary(start));
        }

        if let Some(limiter) = &self.limiter {
            limiter.wait();
        }

        let url = self.route_url(start, end);
        log::debug!("[PROVIDER] Calling OSRM for {} -> {}", start, end);

        let response = match self.client.get(&url).send() {
            Ok(resp) => resp,
            Err(e) => {
                log::warn!("Failed to send routing request. URL: {}\nError: {}", url, e);
                return Err(RoutingError::RequestError(e));
            }
        };

        let status = response.status();
        let text = response.text()?;

        if !status.is_success() {
            // Try to parse the structured error first
            if let Ok(payload) = serde_json::from_str::<OsrmErrorPayload>(&text) {
                return Err(RoutingError::ApiError {
                    status: status.as_u16(),
                    code: payload.code,
                    message: payload.message.unwrap_or_default(),
                });
            }
            log::warn!(
                "Routing API returned non-success status: {}. Unparseable Body: {}",
                status,
                text
            );
            return Err(RoutingError::RawApiError {
                status: status.as_u16(),
                body: text,
            });
        }

        match parse_directions(&text) {
            DirectionsOutcome::Success(route) => {
                log::debug!(
                    "Route calculated: {:.2} km, {} min, {} points",
                    route.distance_km,
                    route.duration_min,
                    route.polyline.len()
                );
                Ok(route.anchor_to(start, end))
            }
            DirectionsOutcome::Empty => Err(RoutingError::NoRoute),
            DirectionsOutcome::Malformed(reason) => {
                log::warn!("Failed to parse routing response. URL: {}\nError: {}", url, reason);
                Err(RoutingError::Malformed(reason))
            }
        }
    }
}
