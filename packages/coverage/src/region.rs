//! Region-scoped coverage reports.
//!
//! Population points belong to a region when they fall inside one of its
//! boundary rings. Facilities are matched by their region label when they
//! have one and only fall back to the geometric test when they don't.

use std::collections::BTreeSet;

use facility_map_coverage_models::{
    CategoryCount, CoverageConfig, Facility, FacilityCatchment, FacilityCategory,
    MultiRegionReport, PopulationPoint, RegionReport,
};
use facility_map_spatial::RegionIndex;

use crate::CoverageError;
use crate::coverage::{coverage, per_facility_catchment};
use crate::sanitize::is_usable_point;

/// Population points inside the union of the named regions.
#[must_use]
pub fn filter_population_by_regions(
    points: &[PopulationPoint],
    names: &[&str],
    index: &RegionIndex,
) -> Vec<PopulationPoint> {
    let names: BTreeSet<&str> = names.iter().copied().collect();
    points
        .iter()
        .filter(|p| is_usable_point(p) && index.contains_any(&names, p.location()))
        .copied()
        .collect()
}

/// Facilities belonging to any of the named regions.
///
/// A labeled facility is included only if its label is one of `names`; an
/// unlabeled facility is included if it lies inside one of the regions.
#[must_use]
pub fn filter_facilities_by_regions(
    facilities: &[Facility],
    names: &[&str],
    index: &RegionIndex,
) -> Vec<Facility> {
    let names: BTreeSet<&str> = names.iter().copied().collect();
    facilities
        .iter()
        .filter(|f| match f.region.as_deref() {
            Some(label) => names.contains(label),
            None => index.contains_any(&names, f.location()),
        })
        .cloned()
        .collect()
}

/// Copies `facilities`, filling in missing region labels from the boundary
/// that contains each facility. Existing labels are kept as-is.
#[must_use]
pub fn label_facilities(facilities: &[Facility], index: &RegionIndex) -> Vec<Facility> {
    facilities
        .iter()
        .map(|f| {
            let mut facility = f.clone();
            if facility.region.is_none() {
                facility.region = index.region_for_point(f.location()).map(str::to_string);
            }
            facility
        })
        .collect()
}

/// Coverage report for one region.
///
/// Coverage counts the region's population against every facility, since
/// people near a border may be served from the next region. The ranking
/// lists only in-region facilities, by catchment within the region, lowest
/// first; the lowest `config.low_coverage_percentile` percent (rounded up)
/// are flagged as low coverage.
///
/// # Errors
///
/// Returns [`CoverageError::UnknownRegion`] if no boundary carries `name`.
pub fn region_report(
    name: &str,
    facilities: &[Facility],
    points: &[PopulationPoint],
    index: &RegionIndex,
    config: &CoverageConfig,
) -> Result<RegionReport, CoverageError> {
    ensure_region(name, index)?;

    let region_points = filter_population_by_regions(points, &[name], index);
    let region_facilities = filter_facilities_by_regions(facilities, &[name], index);
    log::debug!(
        "Region '{name}': {} population points, {} facilities",
        region_points.len(),
        region_facilities.len()
    );

    Ok(RegionReport {
        region: name.to_string(),
        facility_counts: count_by_category(&region_facilities),
        coverage: coverage(facilities, &region_points, config.radius_km),
        facility_ranking: rank_facilities(
            &region_facilities,
            &region_points,
            config.radius_km,
            config.low_coverage_percentile,
        ),
    })
}

/// One [`RegionReport`] per distinct region name, in name order.
#[must_use]
pub fn all_region_reports(
    facilities: &[Facility],
    points: &[PopulationPoint],
    index: &RegionIndex,
    config: &CoverageConfig,
) -> Vec<RegionReport> {
    index
        .region_names()
        .into_iter()
        .filter_map(|name| region_report(name, facilities, points, index, config).ok())
        .collect()
}

/// Coverage over the union of `names`, plus how much of it depends on
/// `excluded_category`.
///
/// # Errors
///
/// Returns [`CoverageError::UnknownRegion`] for the first name that no
/// boundary carries.
pub fn multi_region_report(
    names: &[&str],
    excluded_category: FacilityCategory,
    facilities: &[Facility],
    points: &[PopulationPoint],
    index: &RegionIndex,
    config: &CoverageConfig,
) -> Result<MultiRegionReport, CoverageError> {
    for name in names {
        ensure_region(name, index)?;
    }

    let regions: Vec<String> = names
        .iter()
        .copied()
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_string)
        .collect();

    let region_points = filter_population_by_regions(points, names, index);
    let facility_count = filter_facilities_by_regions(facilities, names, index).len() as u64;

    let without_category: Vec<Facility> = facilities
        .iter()
        .filter(|f| f.category != excluded_category)
        .cloned()
        .collect();

    let with = coverage(facilities, &region_points, config.radius_km);
    let without = coverage(&without_category, &region_points, config.radius_km);

    Ok(MultiRegionReport {
        regions,
        facility_count,
        coverage: with,
        excluded_category,
        coverage_without_category: without,
        category_impact_population: with
            .covered_population
            .saturating_sub(without.covered_population),
    })
}

/// In-region facilities ordered by ascending catchment, with the lowest
/// `percentile` percent flagged.
fn rank_facilities(
    facilities: &[Facility],
    points: &[PopulationPoint],
    radius_km: f64,
    percentile: f64,
) -> Vec<FacilityCatchment> {
    let mut ranking: Vec<FacilityCatchment> = facilities
        .iter()
        .map(|f| FacilityCatchment {
            facility_id: f.id.clone(),
            facility_name: f.name.clone(),
            category: f.category,
            catchment_population: per_facility_catchment(f, points, radius_km),
            low_coverage: false,
        })
        .collect();

    ranking.sort_by(|a, b| {
        a.catchment_population
            .cmp(&b.catchment_population)
            .then_with(|| a.facility_id.cmp(&b.facility_id))
    });

    let flagged = low_coverage_count(ranking.len(), percentile);
    for entry in ranking.iter_mut().take(flagged) {
        entry.low_coverage = true;
    }

    ranking
}

/// Number of facilities in the bottom `percentile` percent, rounded up.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn low_coverage_count(len: usize, percentile: f64) -> usize {
    let share = (percentile.clamp(0.0, 100.0) / 100.0) * len as f64;
    (share.ceil() as usize).min(len)
}

fn count_by_category(facilities: &[Facility]) -> Vec<CategoryCount> {
    FacilityCategory::all()
        .iter()
        .map(|&category| CategoryCount {
            category,
            count: facilities.iter().filter(|f| f.category == category).count() as u64,
        })
        .collect()
}

fn ensure_region(name: &str, index: &RegionIndex) -> Result<(), CoverageError> {
    if index.has_region(name) {
        Ok(())
    } else {
        Err(CoverageError::UnknownRegion {
            name: name.to_string(),
        })
    }
}
