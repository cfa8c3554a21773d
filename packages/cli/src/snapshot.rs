//! Loading of input snapshots, boundaries, and configuration from disk.
//!
//! A snapshot is one JSON document:
//!
//! ```json
//! {
//!   "facilities": [{"id": "f1", "name": "Clinic", "category": "primary", "lat": -15.4, "lng": 35.3}],
//!   "population": [{"lat": -15.41, "lng": 35.31, "population": 1200}],
//!   "settlements": [{"name": "Chisi", "lat": -15.45, "lng": 35.28}]
//! }
//! ```
//!
//! Population masses are read as numbers and rounded; cells with
//! non-finite coordinates or non-positive mass are dropped here before the
//! engine sees them.

use std::path::Path;

use facility_map_coverage::{CoverageError, sanitize, validate_config};
use facility_map_coverage_models::{CoverageConfig, Facility, PopulationPoint, Settlement};
use facility_map_spatial::{RegionIndex, boundaries_from_geojson};
use serde::Deserialize;

/// Everything the engine needs apart from boundaries and configuration.
#[derive(Debug, Default)]
pub struct Snapshot {
    pub facilities: Vec<Facility>,
    pub population: Vec<PopulationPoint>,
    pub settlements: Vec<Settlement>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSnapshot {
    facilities: Vec<Facility>,
    population: Vec<RawPopulationPoint>,
    settlements: Vec<Settlement>,
}

#[derive(Debug, Deserialize)]
struct RawPopulationPoint {
    lat: f64,
    lng: f64,
    population: f64,
}

impl RawPopulationPoint {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn normalize(&self) -> Option<PopulationPoint> {
        let mass = self.population.round();
        if !self.lat.is_finite() || !self.lng.is_finite() || !mass.is_finite() || mass <= 0.0 {
            return None;
        }
        Some(PopulationPoint::new(self.lat, self.lng, mass as u64))
    }
}

/// Parses a snapshot document and drops invalid records.
///
/// # Errors
///
/// Returns an error if the text is not a valid snapshot document.
pub fn parse_snapshot(text: &str) -> Result<Snapshot, serde_json::Error> {
    let raw: RawSnapshot = serde_json::from_str(text)?;

    let population: Vec<PopulationPoint> = raw
        .population
        .iter()
        .filter_map(RawPopulationPoint::normalize)
        .collect();
    if population.len() < raw.population.len() {
        log::warn!(
            "Dropped {} population cells with invalid coordinates or mass",
            raw.population.len() - population.len()
        );
    }

    Ok(Snapshot {
        facilities: sanitize::facilities(&raw.facilities),
        population,
        settlements: sanitize::settlements(&raw.settlements),
    })
}

/// Reads and parses a snapshot file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_snapshot(path: &Path) -> Result<Snapshot, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let snapshot = parse_snapshot(&text)?;
    log::info!(
        "Loaded {} facilities, {} population cells, {} settlements from {}",
        snapshot.facilities.len(),
        snapshot.population.len(),
        snapshot.settlements.len(),
        path.display()
    );
    Ok(snapshot)
}

/// Parses a TOML configuration, filling unset keys with defaults, and
/// validates it.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or a value is out of range.
pub fn parse_config(text: &str) -> Result<CoverageConfig, Box<dyn std::error::Error>> {
    let config: CoverageConfig = toml::from_str(text)?;
    validate_config(&config)?;
    Ok(config)
}

/// Loads the configuration file at `path`, or the defaults when no path is
/// given. A `radius_km` override replaces the file's value.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or validated.
pub fn load_config(
    path: Option<&Path>,
    radius_km: Option<f64>,
) -> Result<CoverageConfig, Box<dyn std::error::Error>> {
    let mut config = match path {
        Some(path) => parse_config(&std::fs::read_to_string(path)?)?,
        None => CoverageConfig::default(),
    };

    if let Some(radius_km) = radius_km {
        config.radius_km = radius_km;
        validate_config(&config)?;
    }

    Ok(config)
}

/// Loads a `GeoJSON` boundary file into a [`RegionIndex`].
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a feature
/// collection.
pub fn load_regions(
    path: &Path,
    name_property: &str,
) -> Result<RegionIndex, Box<dyn std::error::Error>> {
    let text = std::fs::read_to_string(path)?;
    let boundaries = boundaries_from_geojson(&text, name_property)?;
    log::info!("Loaded {} region boundaries from {}", boundaries.len(), path.display());
    Ok(RegionIndex::new(boundaries))
}

/// Returns the region index, or an error explaining that the command
/// needs one.
///
/// # Errors
///
/// Returns [`CoverageError::InvalidConfig`] when no boundaries were loaded.
pub fn require_regions(regions: Option<&RegionIndex>) -> Result<&RegionIndex, CoverageError> {
    regions.ok_or_else(|| CoverageError::InvalidConfig {
        message: "this command needs --boundaries".to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_snapshot_and_drops_invalid_cells() {
        let snapshot = parse_snapshot(
            r#"{
                "facilities": [
                    {"id": "f1", "name": "Clinic", "category": "primary", "lat": -15.4, "lng": 35.3, "region": "Zomba"}
                ],
                "population": [
                    {"lat": -15.41, "lng": 35.31, "population": 1200.4},
                    {"lat": -15.42, "lng": 35.32, "population": -5},
                    {"lat": -15.43, "lng": 35.33, "population": 0}
                ],
                "settlements": [{"name": "Chisi", "lat": -15.45, "lng": 35.28}]
            }"#,
        )
        .unwrap();

        assert_eq!(snapshot.facilities.len(), 1);
        assert_eq!(snapshot.facilities[0].region.as_deref(), Some("Zomba"));
        assert_eq!(
            snapshot.population,
            vec![PopulationPoint::new(-15.41, 35.31, 1200)]
        );
        assert_eq!(snapshot.settlements.len(), 1);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let snapshot = parse_snapshot("{}").unwrap();
        assert!(snapshot.facilities.is_empty());
        assert!(snapshot.population.is_empty());
        assert!(snapshot.settlements.is_empty());
    }

    #[test]
    fn config_is_validated() {
        assert!(parse_config("radius_km = 3.0").is_ok());
        assert!(parse_config("radius_km = -1.0").is_err());
        assert!(parse_config("radius_km = \"far\"").is_err());
    }

    #[test]
    fn missing_regions_is_reported() {
        assert!(require_regions(None).is_err());
    }
}
