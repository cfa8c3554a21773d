//! Covered population totals.
//!
//! A population point is covered when at least one facility lies within
//! the coverage radius. Totals count each point at most once no matter how
//! many facilities reach it. [`per_facility_catchment`] is the exception: it
//! measures one facility in isolation and overlaps freely with its
//! neighbors, so it is only meant for ranking and display.

use std::collections::BTreeSet;

use facility_map_coverage_models::{
    CategoryCoverage, CoverageResult, Facility, FacilityCategory, GeoPoint, PopulationPoint,
};
use facility_map_spatial::within_radius;

use crate::sanitize::is_usable_point;

/// Returns `true` if any facility is within `radius_km` of `point`.
///
/// Stops at the first facility that reaches the point.
#[must_use]
pub fn is_covered(point: GeoPoint, facilities: &[Facility], radius_km: f64) -> bool {
    facilities
        .iter()
        .any(|facility| within_radius(point, facility.location(), radius_km))
}

/// Aggregate coverage of `points` by `facilities`.
#[must_use]
pub fn coverage(facilities: &[Facility], points: &[PopulationPoint], radius_km: f64) -> CoverageResult {
    let mut total = 0_u64;
    let mut covered = 0_u64;

    for point in points.iter().filter(|p| is_usable_point(p)) {
        total = total.saturating_add(point.population);
        if is_covered(point.location(), facilities, radius_km) {
            covered = covered.saturating_add(point.population);
        }
    }

    CoverageResult::from_totals(total, covered)
}

/// Coverage provided by the facilities of a single `category`.
///
/// Points are identified by their coordinate pair, so a point reached by
/// several facilities of the category is counted once, and a coordinate
/// listed twice contributes its first record to both totals.
#[must_use]
pub fn unique_coverage_by_category(
    category: FacilityCategory,
    facilities: &[Facility],
    points: &[PopulationPoint],
    radius_km: f64,
) -> CoverageResult {
    let in_category: Vec<Facility> = facilities
        .iter()
        .filter(|f| f.category == category)
        .cloned()
        .collect();

    let mut total = 0_u64;
    let mut covered = 0_u64;
    let mut seen: BTreeSet<(u64, u64)> = BTreeSet::new();

    for point in points.iter().filter(|p| is_usable_point(p)) {
        if !seen.insert(point.coordinate_key()) {
            continue;
        }
        total = total.saturating_add(point.population);
        if is_covered(point.location(), &in_category, radius_km) {
            covered = covered.saturating_add(point.population);
        }
    }

    CoverageResult::from_totals(total, covered)
}

/// Deduplicated coverage for every facility category.
#[must_use]
pub fn coverage_by_category(
    facilities: &[Facility],
    points: &[PopulationPoint],
    radius_km: f64,
) -> Vec<CategoryCoverage> {
    FacilityCategory::all()
        .iter()
        .map(|&category| CategoryCoverage {
            category,
            coverage: unique_coverage_by_category(category, facilities, points, radius_km),
        })
        .collect()
}

/// Population within `radius_km` of one facility, ignoring every other
/// facility.
#[must_use]
pub fn per_facility_catchment(facility: &Facility, points: &[PopulationPoint], radius_km: f64) -> u64 {
    population_within(facility.location(), points, radius_km)
}

/// Population within `radius_km` of an arbitrary location.
#[must_use]
pub fn population_within(center: GeoPoint, points: &[PopulationPoint], radius_km: f64) -> u64 {
    points
        .iter()
        .filter(|p| is_usable_point(p) && within_radius(p.location(), center, radius_km))
        .fold(0_u64, |total, p| total.saturating_add(p.population))
}

/// Coverage flag for each point, in input order.
#[must_use]
pub fn covered_mask(facilities: &[Facility], points: &[PopulationPoint], radius_km: f64) -> Vec<bool> {
    points
        .iter()
        .map(|p| is_usable_point(p) && is_covered(p.location(), facilities, radius_km))
        .collect()
}

/// Points no facility reaches.
#[must_use]
pub fn uncovered_points(
    facilities: &[Facility],
    points: &[PopulationPoint],
    radius_km: f64,
) -> Vec<PopulationPoint> {
    points
        .iter()
        .filter(|p| is_usable_point(p) && !is_covered(p.location(), facilities, radius_km))
        .copied()
        .collect()
}
