use super::error::RoutingError;
use super::route::RouteResult;
use crate::sdk::geo::Coordinate;

pub trait RoutingProvider: Send + Sync {
    /// Gets a driving route between two points.
    ///
    /// Errors mean the service could not answer; callers that must always render
    /// something wrap the provider in a `FallbackRouter`.
    fn get_directions(&self, start: Coordinate, end: Coordinate) -> Result<RouteResult, RoutingError>;
}

impl<P: RoutingProvider + ?Sized> RoutingProvider for &P {
    fn get_directions(&self, start: Coordinate, end: Coordinate) -> Result<RouteResult, RoutingError> {
        (**self).get_directions(start, end)
    }
}

impl<P: RoutingProvider + ?Sized> RoutingProvider for Box<P> {
    fn get_directions(&self, start: Coordinate, end: Coordinate) -> Result<RouteResult, RoutingError> {
        (**self).get_directions(start, end)
    }
}
