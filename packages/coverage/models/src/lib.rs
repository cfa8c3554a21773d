#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Facility, population, and coverage report types.
//!
//! These are the normalized in-memory shapes exchanged between the data
//! loading layer, the coverage engine, and whatever presents the results.
//! Nothing in here performs geometry; see `facility_map_spatial` and
//! `facility_map_coverage` for that.

pub mod config;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

pub use config::{CoverageConfig, ImpactWeights, ScoringWeights};

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl GeoPoint {
    /// Creates a new point from latitude and longitude in degrees.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns `true` if both coordinates are finite numbers.
    #[must_use]
    pub const fn is_finite(self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

/// Population mass aggregated at a raster cell centroid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PopulationPoint {
    /// Cell centroid latitude.
    pub lat: f64,
    /// Cell centroid longitude.
    pub lng: f64,
    /// Number of people represented by this cell.
    pub population: u64,
}

impl PopulationPoint {
    /// Creates a new population point.
    #[must_use]
    pub const fn new(lat: f64, lng: f64, population: u64) -> Self {
        Self {
            lat,
            lng,
            population,
        }
    }

    /// Returns the cell centroid as a [`GeoPoint`].
    #[must_use]
    pub const fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }

    /// Identity of this point for deduplication: the exact bit patterns of
    /// its coordinate pair.
    #[must_use]
    pub const fn coordinate_key(&self) -> (u64, u64) {
        (self.lat.to_bits(), self.lng.to_bits())
    }
}

/// Fixed facility classification.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum FacilityCategory {
    /// The main facility type being planned for (e.g. a clinic).
    Primary,
    /// A secondary provider of the same service (e.g. a pharmacy).
    Alternate,
    /// Anything else.
    Other,
}

impl FacilityCategory {
    /// Returns all variants of this enum.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Primary, Self::Alternate, Self::Other]
    }
}

/// A service facility.
///
/// Geometry is fixed once created; moving a facility is modeled as removing
/// it and adding a new one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    /// Unique identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Facility classification.
    pub category: FacilityCategory,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
    /// Administrative region label, when the source data provides one.
    #[serde(default)]
    pub region: Option<String>,
}

impl Facility {
    /// Returns the facility location as a [`GeoPoint`].
    #[must_use]
    pub const fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// A named discrete settlement (village), used for removal impact analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    /// Settlement name.
    pub name: String,
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl Settlement {
    /// Returns the settlement location as a [`GeoPoint`].
    #[must_use]
    pub const fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// A named administrative boundary.
///
/// Each ring is a sequence of `[lng, lat]` vertices. Membership is the
/// union of all rings, so multi-part regions are represented by listing
/// every part's rings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionBoundary {
    /// Region name (e.g. a district name).
    pub name: String,
    /// Boundary rings as `[lng, lat]` vertex sequences.
    pub rings: Vec<Vec<[f64; 2]>>,
}

/// Aggregate coverage of a population by a facility set.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageResult {
    /// Sum of all population masses considered.
    pub total_population: u64,
    /// Population within the coverage radius of at least one facility.
    pub covered_population: u64,
    /// `total_population - covered_population`.
    pub uncovered_population: u64,
    /// Covered share in percent, or 0 when there is no population.
    pub coverage_percentage: f64,
}

impl CoverageResult {
    /// Builds a result from totals. `covered` is clamped to `total`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_totals(total: u64, covered: u64) -> Self {
        let covered = covered.min(total);
        let coverage_percentage = if total == 0 {
            0.0
        } else {
            covered as f64 / total as f64 * 100.0
        };

        Self {
            total_population: total,
            covered_population: covered,
            uncovered_population: total - covered,
            coverage_percentage,
        }
    }

    /// A result with no population at all.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            total_population: 0,
            covered_population: 0,
            uncovered_population: 0,
            coverage_percentage: 0.0,
        }
    }
}

/// One group produced by a clustering run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    /// Mean location of the members.
    pub centroid: GeoPoint,
    /// Population points assigned to this cluster.
    pub members: Vec<PopulationPoint>,
    /// Sum of member populations.
    pub aggregate_mass: u64,
}

/// A scored site suggested for a new facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    /// Site latitude.
    pub lat: f64,
    /// Site longitude.
    pub lng: f64,
    /// Composite score in `[0, 1]`.
    pub score: f64,
    /// Currently-uncovered population a facility here would serve.
    pub attributable_population: u64,
    /// Distance to the nearest existing facility, or `None` if there are
    /// no facilities at all.
    pub distance_to_nearest_facility_km: Option<f64>,
}

impl Recommendation {
    /// Returns the site as a [`GeoPoint`].
    #[must_use]
    pub const fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// Number of facilities in a single category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCount {
    /// Facility category.
    pub category: FacilityCategory,
    /// Number of facilities.
    pub count: u64,
}

/// Coverage for one facility category, deduplicated across facilities.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryCoverage {
    /// Facility category.
    pub category: FacilityCategory,
    /// Coverage provided by facilities of this category alone.
    pub coverage: CoverageResult,
}

/// Population within radius of a single facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityCatchment {
    /// Facility identifier.
    pub facility_id: String,
    /// Facility display name.
    pub facility_name: String,
    /// Facility category.
    pub category: FacilityCategory,
    /// Population within radius, not deduplicated against other facilities.
    pub catchment_population: u64,
    /// Whether this facility falls in the low-coverage percentile of its
    /// region.
    pub low_coverage: bool,
}

/// Coverage report for a single region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionReport {
    /// Region name.
    pub region: String,
    /// Facilities in the region by category.
    pub facility_counts: Vec<CategoryCount>,
    /// Coverage of the region's population.
    pub coverage: CoverageResult,
    /// In-region facilities, lowest catchment first.
    pub facility_ranking: Vec<FacilityCatchment>,
}

/// Coverage over a union of regions, with the counterfactual impact of one
/// facility category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiRegionReport {
    /// Region names included in the union.
    pub regions: Vec<String>,
    /// Number of facilities in the union of regions.
    pub facility_count: u64,
    /// Coverage with every facility.
    pub coverage: CoverageResult,
    /// Category whose contribution is measured.
    pub excluded_category: FacilityCategory,
    /// Coverage with that category's facilities removed.
    pub coverage_without_category: CoverageResult,
    /// Population that loses coverage when the category is removed.
    pub category_impact_population: u64,
}

/// How an affected settlement's population figure was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PopulationEstimateSource {
    /// Distance-weighted sum of nearby population points.
    Attributed,
    /// No population points nearby; a fixed default was used.
    Fallback,
}

/// A settlement that would lose coverage if a facility were removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AffectedSettlement {
    /// The settlement.
    pub settlement: Settlement,
    /// Distance to the removed facility.
    pub distance_km: f64,
    /// Estimated population of the settlement.
    pub estimated_population: u64,
    /// Where `estimated_population` came from.
    pub estimate_source: PopulationEstimateSource,
}

/// A suggested site to replace a removed facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacementSite {
    /// Name of the settlement the site is placed at.
    pub settlement_name: String,
    /// Site latitude.
    pub lat: f64,
    /// Site longitude.
    pub lng: f64,
    /// Composite score in `[0, 1]`.
    pub score: f64,
    /// Uncovered settlements within radius of the site.
    pub newly_covered_settlements: u64,
    /// Population within radius of the site.
    pub covered_population: u64,
    /// Affected settlements this site would cover again.
    pub recovered_affected_settlements: u64,
}

impl ReplacementSite {
    /// Returns the site as a [`GeoPoint`].
    #[must_use]
    pub const fn location(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// Outcome of hypothetically removing one facility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactReport {
    /// Identifier of the removed facility.
    pub removed_facility_id: String,
    /// Settlements left without any facility within radius.
    pub affected_settlements: Vec<AffectedSettlement>,
    /// Sum of the affected settlements' estimated populations.
    pub affected_population: u64,
    /// Suggested replacement sites, best first.
    pub replacement_sites: Vec<ReplacementSite>,
}

/// Summary statistics over a facility list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityInventory {
    /// Number of facilities.
    pub total: u64,
    /// Counts per category, in category order.
    pub by_category: Vec<CategoryCount>,
    /// Counts per region label.
    pub by_region: BTreeMap<String, u64>,
    /// Facilities carrying a region label.
    pub with_region_label: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_result_handles_zero_total() {
        let result = CoverageResult::from_totals(0, 0);
        assert_eq!(result, CoverageResult::empty());
        assert!(result.coverage_percentage.abs() < f64::EPSILON);
    }

    #[test]
    fn coverage_result_clamps_covered_to_total() {
        let result = CoverageResult::from_totals(100, 250);
        assert_eq!(result.covered_population, 100);
        assert_eq!(result.uncovered_population, 0);
        assert!((result.coverage_percentage - 100.0).abs() < 1e-9);
    }

    #[test]
    fn category_parses_case_insensitively() {
        assert_eq!(
            "PRIMARY".parse::<FacilityCategory>().unwrap(),
            FacilityCategory::Primary
        );
        assert_eq!(FacilityCategory::Alternate.to_string(), "alternate");
        assert!("hospital".parse::<FacilityCategory>().is_err());
    }

    #[test]
    fn facility_deserializes_without_region() {
        let json = r#"{"id":"f1","name":"Clinic","category":"primary","lat":-16.0,"lng":35.5}"#;
        let facility: Facility = serde_json::from_str(json).unwrap();
        assert_eq!(facility.region, None);
        assert_eq!(facility.category, FacilityCategory::Primary);
    }

    #[test]
    fn coordinate_key_distinguishes_points() {
        let a = PopulationPoint::new(-16.0, 35.0, 10);
        let b = PopulationPoint::new(-16.0, 35.000_001, 10);
        assert_ne!(a.coordinate_key(), b.coordinate_key());
        assert_eq!(a.coordinate_key(), PopulationPoint::new(-16.0, 35.0, 99).coordinate_key());
    }
}
