// Hazard feed loading: the fire-detection JSON consumed by the dashboard map.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fmt, fs, path::Path, str::FromStr};

use super::geo::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Confidence {
    #[serde(rename = "h")]
    High,
    #[serde(rename = "n")]
    Nominal,
    #[serde(rename = "l")]
    Low,
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h" | "high" => Ok(Confidence::High),
            "n" | "nominal" | "medium" => Ok(Confidence::Nominal),
            "l" | "low" => Ok(Confidence::Low),
            other => Err(format!("Unknown confidence level: {}", other)),
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Confidence::High => "High",
            Confidence::Nominal => "Medium",
            Confidence::Low => "Low",
        };
        f.write_str(label)
    }
}

/// Descriptive data carried alongside a hazard. The router never reads it.
///
/// Only values in the expected shape are lifted into the typed fields. Anything else,
/// such as a numeric 0-100 confidence, stays in `extra` exactly as the feed sent it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "Map<String, Value>")]
pub struct HazardMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<Confidence>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brightness: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl From<Map<String, Value>> for HazardMetadata {
    fn from(mut extra: Map<String, Value>) -> Self {
        let confidence = take_if(&mut extra, "confidence", |v| v.as_str()?.parse().ok());
        let brightness = take_if(&mut extra, "brightness", Value::as_f64);
        let timestamp = take_if(&mut extra, "timestamp", |v| v.as_str().map(str::to_string));
        Self {
            confidence,
            brightness,
            timestamp,
            extra,
        }
    }
}

// Removes `key` from `fields` only when `convert` accepts its value.
fn take_if<T>(fields: &mut Map<String, Value>, key: &str, convert: impl Fn(&Value) -> Option<T>) -> Option<T> {
    let value = fields.get(key).and_then(convert)?;
    fields.remove(key);
    Some(value)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HazardPoint {
    pub id: String,
    pub location: Coordinate,
    pub metadata: HazardMetadata,
}

impl HazardPoint {
    pub fn new(id: impl Into<String>, location: Coordinate) -> Self {
        Self {
            id: id.into(),
            location,
            metadata: HazardMetadata::default(),
        }
    }

    pub fn confidence(&self) -> Option<Confidence> {
        self.metadata.confidence
    }
}

// Feed ids are numbers in the mock data and strings elsewhere.
mod flexible_id {
    use serde::{de::Error, Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
        match RawId::deserialize(deserializer)? {
            RawId::Text(s) if !s.trim().is_empty() => Ok(s),
            RawId::Text(_) => Err(Error::custom("empty hazard id")),
            RawId::Number(n) => Ok(n.to_string()),
        }
    }
}

#[derive(Deserialize)]
struct FireRecord {
    #[serde(deserialize_with = "flexible_id::deserialize")]
    id: String,
    latitude: f64,
    longitude: f64,
    #[serde(flatten)]
    metadata: HazardMetadata,
}

#[derive(Deserialize)]
struct FeedFile {
    fires: Vec<FireRecord>,
}

/// Counts shown by the dashboard's statistics panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HazardStatistics {
    pub total: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub avg_brightness: Option<f64>,
}

/// Query-string style filter: confidence first, then truncation to `limit`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedFilter {
    pub confidence: Option<Confidence>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default)]
pub struct HazardFeed {
    hazards: Vec<HazardPoint>,
}

impl HazardFeed {
    pub fn new(hazards: Vec<HazardPoint>) -> Self {
        Self { hazards }
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read hazard feed {}", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let feed: FeedFile = serde_json::from_str(text).context("Failed to parse hazard feed JSON")?;

        let mut hazards = Vec::with_capacity(feed.fires.len());
        for record in feed.fires {
            let location = Coordinate::new(record.latitude, record.longitude)
                .with_context(|| format!("Hazard {} has an invalid location", record.id))?;
            hazards.push(HazardPoint {
                id: record.id,
                location,
                metadata: record.metadata,
            });
        }
        Ok(Self { hazards })
    }

    pub fn hazards(&self) -> &[HazardPoint] {
        &self.hazards
    }

    pub fn get(&self, id: &str) -> Option<&HazardPoint> {
        self.hazards.iter().find(|h| h.id == id)
    }

    pub fn filtered(&self, filter: &FeedFilter) -> Vec<HazardPoint> {
        let matching = self
            .hazards
            .iter()
            .filter(|h| filter.confidence.map_or(true, |c| h.confidence() == Some(c)));
        match filter.limit {
            Some(limit) => matching.take(limit).cloned().collect(),
            None => matching.cloned().collect(),
        }
    }

    pub fn statistics(hazards: &[HazardPoint]) -> HazardStatistics {
        let count = |c: Confidence| hazards.iter().filter(|h| h.confidence() == Some(c)).count();
        let brightness: Vec<f64> = hazards.iter().filter_map(|h| h.metadata.brightness).collect();
        let avg_brightness = if brightness.is_empty() {
            None
        } else {
            Some(brightness.iter().sum::<f64>() / brightness.len() as f64)
        };

        HazardStatistics {
            total: hazards.len(),
            high: count(Confidence::High),
            medium: count(Confidence::Nominal),
            low: count(Confidence::Low),
            avg_brightness,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"{
        "fires": [
            { "id": 1, "latitude": 30.9010, "longitude": 75.8573, "confidence": "h", "brightness": 342.5, "type": "Agricultural", "state": "Punjab", "district": "Ludhiana" },
            { "id": 4, "latitude": 28.4595, "longitude": 77.0266, "confidence": "n", "brightness": 334.1, "type": "Urban", "state": "Haryana", "district": "Gurgaon" },
            { "id": "5", "latitude": 28.7041, "longitude": 77.1025, "confidence": "h", "brightness": 345.9, "type": "Urban", "state": "Delhi", "district": "New Delhi" },
            { "id": 8, "latitude": 25.4358, "longitude": 81.8463, "confidence": "l", "brightness": 329.4 }
        ],
        "statistics": { "total": 4, "high_confidence": 2, "medium_confidence": 1, "low_confidence": 1 }
    }"#;

    #[test]
    fn parses_numeric_and_string_ids() {
        let feed = HazardFeed::from_json_str(FEED).unwrap();
        let ids: Vec<_> = feed.hazards().iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4", "5", "8"]);
    }

    #[test]
    fn keeps_unknown_fields_untouched() {
        let feed = HazardFeed::from_json_str(FEED).unwrap();
        let ludhiana = feed.get("1").unwrap();
        assert_eq!(ludhiana.metadata.extra["district"], "Ludhiana");
        assert_eq!(ludhiana.metadata.brightness, Some(342.5));
        assert_eq!(ludhiana.confidence(), Some(Confidence::High));
    }

    #[test]
    fn filters_by_confidence_then_limits() {
        let feed = HazardFeed::from_json_str(FEED).unwrap();
        let high = feed.filtered(&FeedFilter {
            confidence: Some(Confidence::High),
            limit: None,
        });
        assert_eq!(high.len(), 2);

        let first_high = feed.filtered(&FeedFilter {
            confidence: Some(Confidence::High),
            limit: Some(1),
        });
        assert_eq!(first_high.len(), 1);
        assert_eq!(first_high[0].id, "1");

        assert_eq!(feed.filtered(&FeedFilter::default()).len(), 4);
    }

    #[test]
    fn statistics_match_the_feed() {
        let feed = HazardFeed::from_json_str(FEED).unwrap();
        let stats = HazardFeed::statistics(feed.hazards());
        assert_eq!(stats.total, 4);
        assert_eq!(stats.high, 2);
        assert_eq!(stats.medium, 1);
        assert_eq!(stats.low, 1);
        let avg = stats.avg_brightness.unwrap();
        assert!((avg - 337.975).abs() < 1e-9);
    }

    #[test]
    fn invalid_hazard_location_is_rejected() {
        let feed = r#"{ "fires": [ { "id": 9, "latitude": 12.0, "longitude": 190.0 } ] }"#;
        assert!(HazardFeed::from_json_str(feed).is_err());
    }

    #[test]
    fn numeric_confidence_is_kept_as_raw_metadata() {
        let feed = r#"{ "fires": [
            { "id": 12, "latitude": 21.1458, "longitude": 79.0882, "confidence": 85, "brightness": 330.2 }
        ] }"#;
        let feed = HazardFeed::from_json_str(feed).unwrap();
        let nagpur = feed.get("12").unwrap();
        assert_eq!(nagpur.confidence(), None);
        assert_eq!(nagpur.metadata.extra["confidence"], 85);
        assert_eq!(nagpur.metadata.brightness, Some(330.2));

        let stats = HazardFeed::statistics(feed.hazards());
        assert_eq!((stats.high, stats.medium, stats.low), (0, 0, 0));
    }

    #[test]
    fn confidence_parses_cli_spellings() {
        assert_eq!("h".parse::<Confidence>(), Ok(Confidence::High));
        assert_eq!("Medium".parse::<Confidence>(), Ok(Confidence::Nominal));
        assert!("x".parse::<Confidence>().is_err());
    }
}
