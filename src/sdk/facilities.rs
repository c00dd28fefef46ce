use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::{fmt, fs, fs::File, path::Path, str::FromStr};

use super::geo::Coordinate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FacilityCategory {
    Government,
    Private,
    #[serde(other)]
    Other,
}

impl FromStr for FacilityCategory {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "government" | "gov" => FacilityCategory::Government,
            "private" => FacilityCategory::Private,
            _ => FacilityCategory::Other,
        })
    }
}

impl fmt::Display for FacilityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FacilityCategory::Government => "Government",
            FacilityCategory::Private => "Private",
            FacilityCategory::Other => "Other",
        };
        f.write_str(label)
    }
}

/// A candidate destination such as a hospital.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Facility {
    pub id: String,
    pub name: String,
    pub location: Coordinate,
    pub category: FacilityCategory,
    pub services_emergency: bool,
}

// Shape of the dashboard's hospital table.
#[derive(Deserialize)]
struct FacilityRecord {
    id: String,
    name: String,
    lat: f64,
    #[serde(alias = "lon")]
    lng: f64,
    #[serde(rename = "type", default = "default_category")]
    category: FacilityCategory,
    #[serde(default)]
    emergency: bool,
}

fn csv_field<'r>(record: &'r csv::StringRecord, idx: usize, what: &str, row: usize) -> Result<&'r str> {
    record
        .get(idx)
        .filter(|v| !v.is_empty())
        .with_context(|| format!("Missing {} on registry row {}", what, row))
}

fn default_category() -> FacilityCategory {
    FacilityCategory::Other
}

impl FacilityRecord {
    fn into_facility(self) -> Result<Facility> {
        let location = Coordinate::new(self.lat, self.lng)
            .with_context(|| format!("Facility {} has an invalid location", self.id))?;
        Ok(Facility {
            id: self.id,
            name: self.name,
            location,
            category: self.category,
            services_emergency: self.emergency,
        })
    }
}

/// Immutable, ordered set of facilities. Order is significant: it decides ties
/// in nearest-facility selection.
#[derive(Debug, Clone, Default)]
pub struct FacilityRegistry {
    facilities: Vec<Facility>,
}

impl FacilityRegistry {
    pub fn new(facilities: Vec<Facility>) -> Self {
        Self { facilities }
    }

    /// Loads a registry, picking the parser from the file extension (`.csv` or `.json`).
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => Self::from_csv(path),
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json(path),
            _ => bail!("Unsupported facility registry format: {}", path.display()),
        }
    }

    /// Reads a CSV file with columns `id,name,lat,lon,category,emergency`.
    pub fn from_csv<P: AsRef<Path>>(csv_path: P) -> Result<Self> {
        let csv_path = csv_path.as_ref();
        let file = File::open(csv_path)
            .with_context(|| format!("Failed to open facility registry {}", csv_path.display()))?;
        let mut rdr = ReaderBuilder::new()
            .delimiter(b',')
            .trim(csv::Trim::All)
            .from_reader(file);

        let mut facilities = Vec::new();
        for (line, result) in rdr.records().enumerate() {
            let record = result?;
            let row = line + 1;
            let id = csv_field(&record, 0, "facility id", row)?.to_string();
            let name = csv_field(&record, 1, "facility name", row)?.to_string();
            let lat: f64 = csv_field(&record, 2, "latitude", row)?
                .parse()
                .with_context(|| format!("Bad latitude for facility {}", id))?;
            let lon: f64 = csv_field(&record, 3, "longitude", row)?
                .parse()
                .with_context(|| format!("Bad longitude for facility {}", id))?;
            let category = record
                .get(4)
                .map(|c| c.parse().unwrap_or(FacilityCategory::Other))
                .unwrap_or(FacilityCategory::Other);
            let services_emergency = record
                .get(5)
                .map(|e| matches!(e.to_ascii_lowercase().as_str(), "true" | "yes" | "1"))
                .unwrap_or(false);

            let location = Coordinate::new(lat, lon)
                .with_context(|| format!("Facility {} has an invalid location", id))?;

            facilities.push(Facility {
                id,
                name,
                location,
                category,
                services_emergency,
            });
        }

        log::debug!("Loaded {} facilities from {}", facilities.len(), csv_path.display());
        Ok(Self { facilities })
    }

    /// Reads a JSON array of `{id, name, lat, lng, type, emergency}` records.
    pub fn from_json<P: AsRef<Path>>(json_path: P) -> Result<Self> {
        let json_path = json_path.as_ref();
        let text = fs::read_to_string(json_path)
            .with_context(|| format!("Failed to read facility registry {}", json_path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        let records: Vec<FacilityRecord> =
            serde_json::from_str(text).context("Failed to parse facility registry JSON")?;
        let facilities = records
            .into_iter()
            .map(FacilityRecord::into_facility)
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { facilities })
    }

    pub fn facilities(&self) -> &[Facility] {
        &self.facilities
    }

    pub fn len(&self) -> usize {
        self.facilities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facilities.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Facility> {
        self.facilities.iter().find(|f| f.id == id)
    }

    /// Returns a new registry holding only the facilities accepted by `keep`, order preserved.
    pub fn filter<F>(&self, keep: F) -> FacilityRegistry
    where
        F: Fn(&Facility) -> bool,
    {
        FacilityRegistry {
            facilities: self.facilities.iter().filter(|f| keep(f)).cloned().collect(),
        }
    }

    pub fn emergency_only(&self) -> FacilityRegistry {
        self.filter(|f| f.services_emergency)
    }
}
