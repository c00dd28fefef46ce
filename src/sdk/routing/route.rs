use serde::Serialize;
use std::fmt;

use crate::sdk::geo::{self, Coordinate};

/// Minutes of travel assumed per straight-line kilometer (~30 km/h).
pub const DEFAULT_MINUTES_PER_KM: f64 = 2.0;

/// One turn-by-turn instruction, passed through to the presentation layer as-is.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteStep {
    pub instruction: String,
    pub name: String,
    pub distance_m: f64,
    pub duration_s: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteResult {
    pub polyline: Vec<Coordinate>,
    pub distance_km: f64,
    pub duration_min: u32,
    pub is_fallback: bool,
    pub steps: Vec<RouteStep>,
}

impl RouteResult {
    /// Zero-length route for identical endpoints.
    pub fn stationary(at: Coordinate) -> Self {
        Self {
            polyline: vec![at, at],
            distance_km: 0.0,
            duration_min: 0,
            is_fallback: false,
            steps: Vec::new(),
        }
    }

    pub fn start(&self) -> Option<Coordinate> {
        self.polyline.first().copied()
    }

    pub fn end(&self) -> Option<Coordinate> {
        self.polyline.last().copied()
    }

    /// Pins the polyline ends to the requested endpoints when the service snapped them
    /// onto the road network, so the line always runs from origin to destination.
    /// A snapped route therefore carries up to 2 more points than the service returned.
    pub(crate) fn anchor_to(mut self, origin: Coordinate, destination: Coordinate) -> Self {
        match self.polyline.first() {
            Some(first) if first.approx_eq(&origin) => {}
            _ => self.polyline.insert(0, origin),
        }
        match self.polyline.last() {
            Some(last) if last.approx_eq(&destination) && self.polyline.len() >= 2 => {}
            _ => self.polyline.push(destination),
        }
        self
    }
}

impl fmt::Display for RouteResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} km, {} min", self.distance_km, self.duration_min)?;
        if self.is_fallback {
            write!(f, " (approximate: straight-line estimate)")?;
        }
        Ok(())
    }
}

/// How to synthesize a route when the routing service cannot provide one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallbackPolicy {
    pub minutes_per_km: f64,
}

impl Default for FallbackPolicy {
    fn default() -> Self {
        Self {
            minutes_per_km: DEFAULT_MINUTES_PER_KM,
        }
    }
}

impl FallbackPolicy {
    pub fn new(minutes_per_km: f64) -> Self {
        Self { minutes_per_km }
    }

    /// Straight line between the endpoints, great-circle distance, heuristic duration.
    pub fn straight_line(&self, origin: Coordinate, destination: Coordinate) -> RouteResult {
        let distance_km = geo::distance(origin, destination);
        RouteResult {
            polyline: vec![origin, destination],
            distance_km,
            duration_min: minutes(distance_km * self.minutes_per_km),
            is_fallback: true,
            steps: Vec::new(),
        }
    }
}

pub(crate) fn minutes(value: f64) -> u32 {
    if value.is_finite() && value > 0.0 {
        value.round() as u32
    } else {
        0
    }
}

pub(crate) fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
