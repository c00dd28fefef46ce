use serde::Serialize;

use super::error::RoutingError;
use super::route::RouteResult;
use crate::sdk::facilities::Facility;
use crate::sdk::geo::{self, Coordinate};
use crate::sdk::hazards::HazardPoint;

/// A hazard paired with its closest facility and, once resolved, the route between them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NearestFacilityMatch {
    pub hazard: HazardPoint,
    pub facility: Facility,
    pub distance_km: f64,
    pub route: Option<RouteResult>,
}

impl NearestFacilityMatch {
    pub fn is_approximate(&self) -> bool {
        self.route.as_ref().map_or(true, |r| r.is_fallback)
    }
}

/// Linear scan for the facility closest to `point`.
///
/// Ties go to the facility that comes first in `facilities`. Only the minimum is
/// observable, so a spatial index would be a drop-in replacement for large sets.
pub fn nearest(point: Coordinate, facilities: &[Facility]) -> Result<(&Facility, f64), RoutingError> {
    let mut best: Option<(&Facility, f64)> = None;

    for facility in facilities {
        let d = geo::distance(point, facility.location);
        match best {
            Some((_, best_d)) if d >= best_d => {}
            _ => best = Some((facility, d)),
        }
    }

    best.ok_or(RoutingError::EmptyFacilitySet)
}

/// Selects the nearest facility for a hazard, without a route yet.
pub fn match_hazard(hazard: &HazardPoint, facilities: &[Facility]) -> Result<NearestFacilityMatch, RoutingError> {
    let (facility, distance_km) = nearest(hazard.location, facilities)?;
    log::debug!(
        "Hazard {} at {} -> nearest facility: {} ({:.2} km away)",
        hazard.id,
        hazard.location,
        facility.name,
        distance_km
    );
    Ok(NearestFacilityMatch {
        hazard: hazard.clone(),
        facility: facility.clone(),
        distance_km,
        route: None,
    })
}
