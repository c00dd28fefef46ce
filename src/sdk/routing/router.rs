use super::batch::{BatchOutcome, BatchScheduler, CancelToken};
use super::error::RoutingError;
use super::nearest::{match_hazard, NearestFacilityMatch};
use super::route::{FallbackPolicy, RouteResult};
use super::service::RoutingProvider;
use crate::sdk::facilities::Facility;
use crate::sdk::geo::Coordinate;
use crate::sdk::hazards::{Confidence, HazardPoint};
use serde::Serialize;

/// Wraps a provider so route acquisition always yields a result.
///
/// When the provider fails for any reason (network, timeout, HTTP status, empty or
/// malformed payload) the router synthesizes a straight-line route flagged with
/// `is_fallback`. Failures are logged, never returned.
pub struct FallbackRouter<P> {
    provider: P,
    policy: FallbackPolicy,
}

#[derive(Debug, Serialize)]
pub struct BatchFailure {
    pub hazard_id: String,
    pub reason: String,
}

/// Everything a batch produced. A batch stopped halfway still carries its finished matches.
#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub matches: Vec<NearestFacilityMatch>,
    pub failures: Vec<BatchFailure>,
    pub cancelled: bool,
}

impl<P: RoutingProvider> FallbackRouter<P> {
    pub fn new(provider: P, policy: FallbackPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    pub fn get_route(&self, origin: Coordinate, destination: Coordinate) -> RouteResult {
        match self.provider.get_directions(origin, destination) {
            Ok(route) => route,
            Err(err) => {
                log::warn!(
                    "Routing service unavailable for {} -> {} ({}). Using straight-line fallback.",
                    origin,
                    destination,
                    err
                );
                self.policy.straight_line(origin, destination)
            }
        }
    }

    /// Nearest facility plus the route to it. Fails only when `facilities` is empty.
    pub fn route_to_nearest(
        &self,
        hazard: &HazardPoint,
        facilities: &[Facility],
    ) -> Result<NearestFacilityMatch, RoutingError> {
        let mut matched = match_hazard(hazard, facilities)?;
        matched.route = Some(self.get_route(hazard.location, matched.facility.location));
        Ok(matched)
    }

    /// Routes every hazard through `scheduler`, one nearest-facility match each.
    pub fn route_all(
        &self,
        scheduler: &BatchScheduler,
        hazards: &[HazardPoint],
        facilities: &[Facility],
        cancel: Option<&CancelToken>,
    ) -> BatchReport {
        let outcome = scheduler.run(hazards, cancel, |hazard| self.route_to_nearest(hazard, facilities));
        collect_report(hazards, outcome)
    }

    /// Batch over high-confidence hazards only.
    pub fn auto_route_high_confidence(
        &self,
        scheduler: &BatchScheduler,
        hazards: &[HazardPoint],
        facilities: &[Facility],
        cancel: Option<&CancelToken>,
    ) -> BatchReport {
        let high: Vec<HazardPoint> = hazards
            .iter()
            .filter(|h| h.confidence() == Some(Confidence::High))
            .cloned()
            .collect();
        log::info!("Generating routes for {} high confidence hazards", high.len());
        self.route_all(scheduler, &high, facilities, cancel)
    }
}

fn collect_report(hazards: &[HazardPoint], outcome: BatchOutcome<NearestFacilityMatch, RoutingError>) -> BatchReport {
    let mut report = BatchReport {
        cancelled: outcome.cancelled,
        ..Default::default()
    };
    for (hazard, result) in hazards.iter().zip(outcome.results) {
        match result {
            Some(Ok(matched)) => report.matches.push(matched),
            Some(Err(err)) => report.failures.push(BatchFailure {
                hazard_id: hazard.id.clone(),
                reason: err.to_string(),
            }),
            None => {}
        }
    }
    report
}
