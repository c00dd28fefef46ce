use super::nearest::NearestFacilityMatch;
use std::collections::HashMap;

/// Proof that a query for a hazard was started. Only the newest ticket per hazard
/// may publish a result.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryTicket {
    pub hazard_id: String,
    generation: u64,
}

#[derive(Default)]
struct Slot {
    generation: u64,
    current: Option<NearestFacilityMatch>,
}

/// Live matches keyed by hazard id, at most one per hazard, last query wins.
#[derive(Default)]
pub struct MatchBoard {
    slots: HashMap<String, Slot>,
}

impl MatchBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new query for `hazard_id`, superseding any older one still in flight.
    pub fn begin(&mut self, hazard_id: &str) -> QueryTicket {
        let slot = self.slots.entry(hazard_id.to_string()).or_default();
        slot.generation += 1;
        QueryTicket {
            hazard_id: hazard_id.to_string(),
            generation: slot.generation,
        }
    }

    pub fn is_current(&self, ticket: &QueryTicket) -> bool {
        self.slots
            .get(&ticket.hazard_id)
            .map_or(false, |slot| slot.generation == ticket.generation)
    }

    /// Publishes `matched` if `ticket` is still the newest for its hazard.
    /// Stale results are dropped and `false` is returned.
    pub fn resolve(&mut self, ticket: &QueryTicket, matched: NearestFacilityMatch) -> bool {
        match self.slots.get_mut(&ticket.hazard_id) {
            Some(slot) if slot.generation == ticket.generation => {
                slot.current = Some(matched);
                true
            }
            _ => {
                log::debug!("Discarding stale result for hazard {}", ticket.hazard_id);
                false
            }
        }
    }

    pub fn get(&self, hazard_id: &str) -> Option<&NearestFacilityMatch> {
        self.slots.get(hazard_id).and_then(|slot| slot.current.as_ref())
    }

    /// Drops the hazard's match; any ticket still in flight becomes stale.
    pub fn clear(&mut self, hazard_id: &str) -> Option<NearestFacilityMatch> {
        let slot = self.slots.get_mut(hazard_id)?;
        slot.generation += 1;
        slot.current.take()
    }

    pub fn len(&self) -> usize {
        self.slots.values().filter(|s| s.current.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn matches(&self) -> impl Iterator<Item = &NearestFacilityMatch> {
        self.slots.values().filter_map(|slot| slot.current.as_ref())
    }
}

/// Keeps the last match for each hazard id. Survivors stay in their original order.
pub fn latest_per_hazard(matches: Vec<NearestFacilityMatch>) -> Vec<NearestFacilityMatch> {
    let mut board = MatchBoard::new();
    let tickets: Vec<QueryTicket> = matches.iter().map(|m| board.begin(&m.hazard.id)).collect();
    matches
        .into_iter()
        .zip(tickets)
        .filter(|(_, ticket)| board.is_current(ticket))
        .map(|(matched, _)| matched)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::facilities::{Facility, FacilityCategory};
    use crate::sdk::geo::Coordinate;
    use crate::sdk::hazards::HazardPoint;

    fn sample(hazard_id: &str, facility_id: &str) -> NearestFacilityMatch {
        NearestFacilityMatch {
            hazard: HazardPoint::new(hazard_id, Coordinate::new_unchecked(28.7, 77.1)),
            facility: Facility {
                id: facility_id.to_string(),
                name: facility_id.to_string(),
                location: Coordinate::new_unchecked(28.5, 77.2),
                category: FacilityCategory::Private,
                services_emergency: true,
            },
            distance_km: 14.0,
            route: None,
        }
    }

    #[test]
    fn newer_query_wins_over_late_older_result() {
        let mut board = MatchBoard::new();
        let old = board.begin("5");
        let new = board.begin("5");

        assert!(board.resolve(&new, sample("5", "h1")));
        assert!(!board.resolve(&old, sample("5", "h2")));
        assert_eq!(board.get("5").unwrap().facility.id, "h1");
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn a_resolved_match_is_replaced_by_the_next_query() {
        let mut board = MatchBoard::new();
        let first = board.begin("5");
        board.resolve(&first, sample("5", "h1"));
        let second = board.begin("5");
        assert!(!board.is_current(&first));
        board.resolve(&second, sample("5", "h2"));
        assert_eq!(board.get("5").unwrap().facility.id, "h2");
        assert_eq!(board.len(), 1);
    }

    #[test]
    fn hazards_are_independent() {
        let mut board = MatchBoard::new();
        let a = board.begin("a");
        let b = board.begin("b");
        assert!(board.resolve(&b, sample("b", "h2")));
        assert!(board.resolve(&a, sample("a", "h1")));
        assert_eq!(board.matches().count(), 2);
    }

    #[test]
    fn clearing_invalidates_in_flight_tickets() {
        let mut board = MatchBoard::new();
        let ticket = board.begin("5");
        assert!(board.clear("5").is_none());
        assert!(!board.resolve(&ticket, sample("5", "h1")));
        assert!(board.is_empty());
    }

    #[test]
    fn latest_per_hazard_keeps_batch_order() {
        let kept = latest_per_hazard(vec![
            sample("2", "h1"),
            sample("10", "h3"),
            sample("2", "h2"),
            sample("1", "h4"),
        ]);
        let pairs: Vec<_> = kept
            .iter()
            .map(|m| (m.hazard.id.as_str(), m.facility.id.as_str()))
            .collect();
        assert_eq!(pairs, vec![("10", "h3"), ("2", "h2"), ("1", "h4")]);
    }
}
