use crate::sdk::geo::Coordinate;
use crate::sdk::routing::error::RoutingError;
use crate::sdk::routing::route::RouteResult;
use crate::sdk::routing::service::RoutingProvider;

/// Provider for demos without network access: every request reports the service
/// as unavailable, so routers fall back to straight-line estimates.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineProvider;

impl RoutingProvider for OfflineProvider {
    fn get_directions(&self, start: Coordinate, end: Coordinate) -> Result<RouteResult, RoutingError> {
        log::debug!("[PROVIDER] Offline mode, no route for {} -> {}", start, end);
        Err(RoutingError::Offline)
    }
}
