use super::types::{DirectionsResponse, Route, Step};
use crate::sdk::geo::Coordinate;
use crate::sdk::routing::route::{minutes, round_2dp, RouteResult, RouteStep};

/// What a successful HTTP response from the routing service actually contained.
#[derive(Debug, Clone, PartialEq)]
pub enum DirectionsOutcome {
    Success(RouteResult),
    /// Well-formed payload without any candidate route.
    Empty,
    Malformed(String),
}

/// Turns an OSRM JSON body into a typed outcome. Only the first route is used.
pub fn parse_directions(body: &str) -> DirectionsOutcome {
    let response: DirectionsResponse = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => return DirectionsOutcome::Malformed(e.to_string()),
    };

    match response.routes.into_iter().next() {
        Some(route) => match convert_route(route) {
            Ok(result) => DirectionsOutcome::Success(result),
            Err(reason) => DirectionsOutcome::Malformed(reason),
        },
        None => {
            log::debug!(
                "Routing response has no routes (code: {})",
                response.code.as_deref().unwrap_or("none")
            );
            DirectionsOutcome::Empty
        }
    }
}

fn convert_route(route: Route) -> Result<RouteResult, String> {
    if !(route.distance.is_finite() && route.distance >= 0.0) {
        return Err(format!("invalid route distance {}", route.distance));
    }
    if !(route.duration.is_finite() && route.duration >= 0.0) {
        return Err(format!("invalid route duration {}", route.duration));
    }
    if route.geometry.coordinates.is_empty() {
        return Err("route geometry has no coordinates".to_string());
    }

    // GeoJSON is [lon, lat]; everything downstream is (lat, lon).
    let polyline = route
        .geometry
        .coordinates
        .iter()
        .map(|&[lon, lat]| Coordinate::new(lat, lon).map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?;

    let steps = route
        .legs
        .into_iter()
        .next()
        .map(|leg| leg.steps.into_iter().map(convert_step).collect())
        .unwrap_or_default();

    Ok(RouteResult {
        polyline,
        distance_km: round_2dp(route.distance / 1000.0),
        duration_min: minutes(route.duration / 60.0),
        is_fallback: false,
        steps,
    })
}

fn convert_step(step: Step) -> RouteStep {
    let mut instruction = step.maneuver.kind.replace('_', " ");
    if let Some(modifier) = &step.maneuver.modifier {
        instruction.push(' ');
        instruction.push_str(modifier);
    }
    if !step.name.is_empty() {
        instruction.push_str(" onto ");
        instruction.push_str(&step.name);
    }

    RouteStep {
        instruction,
        name: step.name,
        distance_m: step.distance,
        duration_s: step.duration,
    }
}
