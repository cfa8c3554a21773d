//! Placement scoring and recommendation selection.
//!
//! A candidate site is only eligible when it is strictly farther than the
//! coverage radius from every existing facility. Eligible sites are scored
//! by the currently-uncovered population they would reach and by how
//! isolated they are, then picked greedily so that no two picks are within
//! `separation_factor × radius` of each other.

use std::collections::BTreeSet;

use facility_map_coverage_models::{
    CoverageConfig, Facility, GeoPoint, PopulationPoint, Recommendation,
};
use facility_map_spatial::{distance, within_radius};

use crate::cluster::cluster_population;
use crate::coverage::{covered_mask, uncovered_points};
use crate::sanitize::is_usable_point;

/// Recommends up to `config.recommendation_count` new facility sites.
///
/// Candidates come from [`candidate_sites`]. Returns an empty list when
/// every candidate is already within the radius of a facility.
#[must_use]
pub fn recommend_sites(
    facilities: &[Facility],
    points: &[PopulationPoint],
    config: &CoverageConfig,
) -> Vec<Recommendation> {
    let candidates = candidate_sites(facilities, points, config);
    let scored = score_candidates(&candidates, facilities, points, config);
    log::debug!(
        "{} of {} candidate sites are eligible",
        scored.len(),
        candidates.len()
    );

    select_separated(
        scored,
        config.recommendation_count,
        config.min_separation_km(),
        Recommendation::location,
    )
}

/// Candidate sites from the largest population points away from existing
/// facilities, followed by the centroids of the uncovered population's
/// clusters. Duplicate coordinates are dropped.
#[must_use]
pub fn candidate_sites(
    facilities: &[Facility],
    points: &[PopulationPoint],
    config: &CoverageConfig,
) -> Vec<GeoPoint> {
    let uncovered = uncovered_points(facilities, points, config.radius_km);
    let centroids = cluster_population(&uncovered, config)
        .into_iter()
        .map(|cluster| cluster.centroid);

    let mut seen = BTreeSet::new();
    population_candidates(facilities, points, config)
        .into_iter()
        .chain(centroids)
        .filter(|site| seen.insert((site.lat.to_bits(), site.lng.to_bits())))
        .collect()
}

/// The `config.candidate_pool_size` most populous points that are farther
/// than `config.candidate_exclusion_km()` from every facility.
#[must_use]
pub fn population_candidates(
    facilities: &[Facility],
    points: &[PopulationPoint],
    config: &CoverageConfig,
) -> Vec<GeoPoint> {
    let exclusion_km = config.candidate_exclusion_km();

    let mut pool: Vec<&PopulationPoint> = points
        .iter()
        .filter(|p| is_usable_point(p))
        .filter(|p| {
            !facilities
                .iter()
                .any(|f| within_radius(p.location(), f.location(), exclusion_km))
        })
        .collect();

    pool.sort_by(|a, b| b.population.cmp(&a.population));
    pool.truncate(config.candidate_pool_size);
    pool.into_iter().map(PopulationPoint::location).collect()
}

/// Scores every eligible candidate, best first. Ineligible candidates (at
/// or within the radius of a facility) are left out entirely.
#[must_use]
pub fn score_candidates(
    candidates: &[GeoPoint],
    facilities: &[Facility],
    points: &[PopulationPoint],
    config: &CoverageConfig,
) -> Vec<Recommendation> {
    let covered = covered_mask(facilities, points, config.radius_km);
    let weights = &config.scoring;

    let mut scored: Vec<Recommendation> = candidates
        .iter()
        .filter(|c| c.is_finite())
        .filter_map(|&candidate| {
            let nearest = nearest_facility_distance(candidate, facilities);
            if !is_eligible(nearest, config.radius_km) {
                return None;
            }

            let marginal = marginal_population(candidate, points, &covered, config.radius_km);
            #[allow(clippy::cast_precision_loss)]
            let population_term = normalize(marginal as f64, weights.population_cap);
            let distance_term = nearest.map_or(1.0, |d| normalize(d, weights.distance_cap_km));

            Some(Recommendation {
                lat: candidate.lat,
                lng: candidate.lng,
                score: weights.population_weight * population_term
                    + weights.distance_weight * distance_term,
                attributable_population: marginal,
                distance_to_nearest_facility_km: nearest,
            })
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored
}

/// Population within `radius_km` of `candidate` that no existing facility
/// covers. `covered` is the per-point flag from [`covered_mask`], in the
/// same order as `points`.
#[must_use]
pub fn marginal_population(
    candidate: GeoPoint,
    points: &[PopulationPoint],
    covered: &[bool],
    radius_km: f64,
) -> u64 {
    points
        .iter()
        .zip(covered)
        .filter(|(point, covered)| {
            !**covered
                && is_usable_point(point)
                && within_radius(point.location(), candidate, radius_km)
        })
        .fold(0_u64, |total, (point, _)| total.saturating_add(point.population))
}

/// Great-circle distance to the closest facility, or `None` when there are
/// no facilities with a usable location.
#[must_use]
pub fn nearest_facility_distance(point: GeoPoint, facilities: &[Facility]) -> Option<f64> {
    facilities
        .iter()
        .map(|f| distance(point, f.location()))
        .filter(|d| d.is_finite())
        .min_by(f64::total_cmp)
}

/// Returns `true` if a site with the given nearest-facility distance is
/// strictly outside the coverage radius of every facility.
#[must_use]
pub fn is_eligible(nearest_km: Option<f64>, radius_km: f64) -> bool {
    nearest_km.is_none_or(|d| d > radius_km)
}

/// `value / cap`, clipped to `[0, 1]`.
#[must_use]
pub fn normalize(value: f64, cap: f64) -> f64 {
    if cap <= 0.0 || !value.is_finite() {
        return 0.0;
    }
    (value / cap).clamp(0.0, 1.0)
}

/// Greedily keeps items from `ranked` (best first) that are farther than
/// `min_separation_km` from every item already kept, stopping at `count`.
#[must_use]
pub fn select_separated<T>(
    ranked: Vec<T>,
    count: usize,
    min_separation_km: f64,
    location: impl Fn(&T) -> GeoPoint,
) -> Vec<T> {
    let mut selected: Vec<T> = Vec::with_capacity(count.min(ranked.len()));

    for item in ranked {
        if selected.len() >= count {
            break;
        }
        let site = location(&item);
        if selected
            .iter()
            .all(|kept| distance(site, location(kept)) > min_separation_km)
        {
            selected.push(item);
        }
    }

    selected
}
