pub mod sdk;

pub use sdk::config::{RouterConfig, RoutingBackend};
pub use sdk::facilities::{Facility, FacilityCategory, FacilityRegistry};
pub use sdk::geo::{distance, Coordinate, GeoError};
pub use sdk::hazards::{Confidence, HazardFeed, HazardPoint};
pub use sdk::routing::{
    nearest, BatchScheduler, FallbackRouter, NearestFacilityMatch, RouteResult, RoutingError, RoutingProvider,
};
