pub mod batch;
pub mod error;
pub mod matches;
pub mod nearest;
pub mod provider;
pub mod route;
pub mod router;
pub mod service;

pub use batch::{BatchOutcome, BatchPolicy, BatchScheduler, CancelToken};
pub use error::RoutingError;
pub use matches::{latest_per_hazard, MatchBoard, QueryTicket};
pub use nearest::{match_hazard, nearest, NearestFacilityMatch};
pub use provider::{OfflineProvider, RemoteOsrmProvider};
pub use route::{FallbackPolicy, RouteResult, RouteStep};
pub use router::{BatchFailure, BatchReport, FallbackRouter};
pub use service::RoutingProvider;
