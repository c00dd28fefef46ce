use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Mean earth radius used by the haversine formula, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Two coordinates closer than this (in degrees, per axis) are treated as the same point.
pub const COORD_EPSILON_DEG: f64 = 1e-6;

#[derive(Error, Debug, PartialEq)]
pub enum GeoError {
    #[error("Invalid coordinate ({lat}, {lon}): latitude must be within [-90, 90] and longitude within [-180, 180]")]
    InvalidCoordinate { lat: f64, lon: f64 },
}

/// A WGS-84 position in decimal degrees, stored as `(lat, lon)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    /// Builds a coordinate from untrusted input, rejecting out-of-range or non-finite values.
    pub fn new(lat: f64, lon: f64) -> Result<Self, GeoError> {
        let valid = lat.is_finite()
            && lon.is_finite()
            && (-90.0..=90.0).contains(&lat)
            && (-180.0..=180.0).contains(&lon);
        if !valid {
            return Err(GeoError::InvalidCoordinate { lat, lon });
        }
        Ok(Self { lat, lon })
    }

    /// Builds a coordinate that has already been validated upstream.
    pub const fn new_unchecked(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Builds a coordinate from the `[lon, lat]` ordering used by GeoJSON.
    pub fn from_lon_lat(pair: [f64; 2]) -> Self {
        Self::new_unchecked(pair[1], pair[0])
    }

    pub fn approx_eq(&self, other: &Coordinate) -> bool {
        (self.lat - other.lat).abs() <= COORD_EPSILON_DEG
            && (self.lon - other.lon).abs() <= COORD_EPSILON_DEG
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.lat, self.lon)
    }
}

/// Great-circle distance in kilometers on a spherical earth.
pub fn distance(a: Coordinate, b: Coordinate) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1 for antipodal points.
    let h = h.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    const AIIMS: Coordinate = Coordinate::new_unchecked(28.5672, 77.2100);
    const TATA: Coordinate = Coordinate::new_unchecked(19.0176, 72.8562);
    const DELHI: Coordinate = Coordinate::new_unchecked(28.7041, 77.1025);

    #[test]
    fn same_point_is_zero() {
        assert_eq!(distance(AIIMS, AIIMS), 0.0);
    }

    #[test]
    fn distance_is_symmetric() {
        let ab = distance(AIIMS, TATA);
        let ba = distance(TATA, AIIMS);
        assert!((ab - ba).abs() < 1e-9, "{} != {}", ab, ba);
    }

    #[test]
    fn delhi_to_mumbai_is_about_1150_km() {
        let d = distance(AIIMS, TATA);
        assert!(d > 1100.0 && d < 1200.0, "got {}", d);
    }

    #[test]
    fn triangle_inequality_holds() {
        let ac = distance(DELHI, TATA);
        let ab = distance(DELHI, AIIMS);
        let bc = distance(AIIMS, TATA);
        assert!(ac <= ab + bc + 1e-9);
    }

    #[test]
    fn antipodal_points_are_finite() {
        let a = Coordinate::new_unchecked(0.0, 0.0);
        let b = Coordinate::new_unchecked(0.0, 180.0);
        let d = distance(a, b);
        assert!(d.is_finite());
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert_eq!(
            Coordinate::new(91.0, 0.0),
            Err(GeoError::InvalidCoordinate { lat: 91.0, lon: 0.0 })
        );
        assert!(Coordinate::new(0.0, -180.5).is_err());
        assert!(Coordinate::new(f64::NAN, 0.0).is_err());
        assert!(Coordinate::new(-90.0, 180.0).is_ok());
    }

    #[test]
    fn lon_lat_pairs_are_swapped() {
        let c = Coordinate::from_lon_lat([77.21, 28.5672]);
        assert_eq!(c.lat, 28.5672);
        assert_eq!(c.lon, 77.21);
    }
}
