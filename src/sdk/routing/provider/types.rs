use serde::Deserialize;

// --- Data structures for parsing OSRM route responses ---

#[derive(Deserialize, Debug)]
pub struct DirectionsResponse {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub routes: Vec<Route>,
}

#[derive(Deserialize, Debug)]
pub struct Route {
    pub geometry: Geometry,
    /// Meters.
    pub distance: f64,
    /// Seconds.
    pub duration: f64,
    #[serde(default)]
    pub legs: Vec<Leg>,
}

/// GeoJSON LineString; positions are `[lon, lat]`.
#[derive(Deserialize, Debug)]
pub struct Geometry {
    pub coordinates: Vec<[f64; 2]>,
}

#[derive(Deserialize, Debug)]
pub struct Leg {
    #[serde(default)]
    pub steps: Vec<Step>,
}

#[derive(Deserialize, Debug)]
pub struct Step {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub duration: f64,
    pub maneuver: Maneuver,
}

#[derive(Deserialize, Debug)]
pub struct Maneuver {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub modifier: Option<String>,
}
