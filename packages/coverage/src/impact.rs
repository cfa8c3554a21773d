//! Facility removal impact analysis.
//!
//! Answers "who loses service if this facility closes?" for named
//! settlements, estimates how many people live there, and suggests
//! replacement sites among the affected settlements and their neighbors.

use facility_map_coverage_models::{
    AffectedSettlement, CoverageConfig, Facility, GeoPoint, ImpactReport, ImpactWeights,
    PopulationEstimateSource, PopulationPoint, ReplacementSite, Settlement,
};
use facility_map_spatial::{distance, within_radius};

use crate::CoverageError;
use crate::coverage::{is_covered, population_within};
use crate::placement::{normalize, select_separated};
use crate::sanitize::is_usable_point;

/// Looks up the facility with id `facility_id` and analyzes its removal.
///
/// # Errors
///
/// Returns [`CoverageError::UnknownFacility`] if no facility has that id.
pub fn analyze_removal_by_id(
    facility_id: &str,
    facilities: &[Facility],
    settlements: &[Settlement],
    points: &[PopulationPoint],
    config: &CoverageConfig,
) -> Result<ImpactReport, CoverageError> {
    let removed = facilities
        .iter()
        .find(|f| f.id == facility_id)
        .ok_or_else(|| CoverageError::UnknownFacility {
            id: facility_id.to_string(),
        })?;

    Ok(analyze_removal(removed, facilities, settlements, points, config))
}

/// Impact of removing `removed` from `facilities`.
///
/// A settlement is affected when it is within the radius of the removed
/// facility and no remaining facility reaches it. Replacement sites are
/// only suggested when at least one settlement is affected.
#[must_use]
pub fn analyze_removal(
    removed: &Facility,
    facilities: &[Facility],
    settlements: &[Settlement],
    points: &[PopulationPoint],
    config: &CoverageConfig,
) -> ImpactReport {
    let remaining: Vec<Facility> = facilities
        .iter()
        .filter(|f| f.id != removed.id)
        .cloned()
        .collect();

    let affected: Vec<AffectedSettlement> = settlements
        .iter()
        .filter(|s| s.location().is_finite())
        .filter_map(|s| {
            let distance_km = distance(s.location(), removed.location());
            if distance_km > config.radius_km || is_covered(s.location(), &remaining, config.radius_km) {
                return None;
            }
            let (estimated_population, estimate_source) =
                estimate_settlement_population(s.location(), points, &config.impact);
            Some(AffectedSettlement {
                settlement: s.clone(),
                distance_km,
                estimated_population,
                estimate_source,
            })
        })
        .collect();

    let affected_population = affected
        .iter()
        .fold(0_u64, |total, a| total.saturating_add(a.estimated_population));
    log::debug!(
        "Removing '{}' leaves {} settlements ({affected_population} people) without coverage",
        removed.id,
        affected.len()
    );

    let replacement_sites = if affected.is_empty() {
        Vec::new()
    } else {
        replacement_sites(removed, &remaining, &affected, settlements, points, config)
    };

    ImpactReport {
        removed_facility_id: removed.id.clone(),
        affected_settlements: affected,
        affected_population,
        replacement_sites,
    }
}

/// Distance-weighted population around a settlement.
///
/// Each population point closer than `weights.attribution_radius_km`
/// contributes its mass scaled by `1 - d / attribution_radius_km`. With no
/// such point, the fixed `weights.fallback_population` is used instead.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn estimate_settlement_population(
    location: GeoPoint,
    points: &[PopulationPoint],
    weights: &ImpactWeights,
) -> (u64, PopulationEstimateSource) {
    let reach = weights.attribution_radius_km;
    let mut nearby = 0_usize;
    let mut total = 0.0_f64;

    for point in points.iter().filter(|p| is_usable_point(p)) {
        if !within_radius(point.location(), location, reach) {
            continue;
        }
        let d = distance(point.location(), location);
        if d < reach {
            nearby += 1;
            total += point.population as f64 * (1.0 - d / reach);
        }
    }

    if nearby == 0 {
        (weights.fallback_population, PopulationEstimateSource::Fallback)
    } else {
        (total.round() as u64, PopulationEstimateSource::Attributed)
    }
}

/// Scores the affected settlements (topped up with unaffected settlements
/// near the removed facility) as replacement sites and picks a separated
/// top-N.
fn replacement_sites(
    removed: &Facility,
    remaining: &[Facility],
    affected: &[AffectedSettlement],
    settlements: &[Settlement],
    points: &[PopulationPoint],
    config: &CoverageConfig,
) -> Vec<ReplacementSite> {
    let radius = config.radius_km;
    let weights = &config.impact;

    let mut candidates: Vec<&Settlement> = affected.iter().map(|a| &a.settlement).collect();
    if candidates.len() < config.recommendation_count {
        let reach = config.replacement_search_km();
        candidates.extend(settlements.iter().filter(|s| {
            s.location().is_finite()
                && !affected.iter().any(|a| a.settlement == **s)
                && within_radius(s.location(), removed.location(), reach)
        }));
    }

    let uncovered: Vec<&Settlement> = settlements
        .iter()
        .filter(|s| s.location().is_finite() && !is_covered(s.location(), remaining, radius))
        .collect();

    #[allow(clippy::cast_precision_loss)]
    let total_affected = affected.len() as f64;

    let mut scored: Vec<ReplacementSite> = candidates
        .into_iter()
        .map(|candidate| {
            let site = candidate.location();
            let newly_covered = uncovered
                .iter()
                .filter(|s| within_radius(s.location(), site, radius))
                .count() as u64;
            let covered_population = population_within(site, points, radius);
            let recovered = affected
                .iter()
                .filter(|a| within_radius(a.settlement.location(), site, radius))
                .count() as u64;

            #[allow(clippy::cast_precision_loss)]
            let score = weights.settlement_weight
                * normalize(newly_covered as f64, weights.settlement_cap)
                + weights.population_weight
                    * normalize(covered_population as f64, weights.population_cap)
                + weights.recovery_weight * (recovered as f64 / total_affected);

            ReplacementSite {
                settlement_name: candidate.name.clone(),
                lat: site.lat,
                lng: site.lng,
                score,
                newly_covered_settlements: newly_covered,
                covered_population,
                recovered_affected_settlements: recovered,
            }
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));

    select_separated(
        scored,
        config.recommendation_count,
        config.min_separation_km(),
        ReplacementSite::location,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coverage::tests::facility;
    use facility_map_coverage_models::FacilityCategory;

    const KM: f64 = 0.009;

    fn settlement(name: &str, lat: f64, lng: f64) -> Settlement {
        Settlement {
            name: name.to_string(),
            lat,
            lng,
        }
    }

    #[test]
    fn sole_facility_removal_affects_settlement() {
        let config = CoverageConfig::default();
        let clinic = facility("clinic", FacilityCategory::Primary, -15.0, 35.0);
        let settlements = [settlement("Chisi", -15.0 + 2.0 * KM, 35.0)];

        let report = analyze_removal(&clinic, &[clinic.clone()], &settlements, &[], &config);

        assert_eq!(report.removed_facility_id, "clinic");
        assert_eq!(report.affected_settlements.len(), 1);
        assert_eq!(report.affected_settlements[0].settlement.name, "Chisi");
        assert!(!report.replacement_sites.is_empty());
    }

    #[test]
    fn redundant_coverage_means_not_affected() {
        let config = CoverageConfig::default();
        let clinic = facility("clinic", FacilityCategory::Primary, -15.0, 35.0);
        let twin = facility("twin", FacilityCategory::Primary, -15.0, 35.0);
        let settlements = [settlement("Chisi", -15.0 + 2.0 * KM, 35.0)];

        let report = analyze_removal(&clinic, &[clinic.clone(), twin], &settlements, &[], &config);

        assert!(report.affected_settlements.is_empty());
        assert_eq!(report.affected_population, 0);
        assert!(report.replacement_sites.is_empty());
    }

    #[test]
    fn settlements_outside_radius_are_not_affected() {
        let config = CoverageConfig::default();
        let clinic = facility("clinic", FacilityCategory::Primary, -15.0, 35.0);
        let settlements = [settlement("Far", -15.0 + 20.0 * KM, 35.0)];

        let report = analyze_removal(&clinic, &[clinic.clone()], &settlements, &[], &config);
        assert!(report.affected_settlements.is_empty());
    }

    #[test]
    fn population_estimate_uses_linear_falloff() {
        let weights = ImpactWeights::default();
        let village = GeoPoint::new(-15.0, 35.0);
        let points = [
            PopulationPoint::new(-15.0, 35.0, 1_000),
            // About 1 km away: half weight.
            PopulationPoint::new(-15.0 + 1.0 / 111.195, 35.0, 400),
            // Outside the attribution radius.
            PopulationPoint::new(-15.0 + 3.0 * KM, 35.0, 10_000),
        ];

        let (estimate, source) = estimate_settlement_population(village, &points, &weights);
        assert_eq!(source, PopulationEstimateSource::Attributed);
        assert!((1_199..=1_201).contains(&estimate), "got {estimate}");
    }

    #[test]
    fn population_estimate_falls_back_without_nearby_points() {
        let weights = ImpactWeights::default();
        let (estimate, source) =
            estimate_settlement_population(GeoPoint::new(-15.0, 35.0), &[], &weights);
        assert_eq!(estimate, 750);
        assert_eq!(source, PopulationEstimateSource::Fallback);
    }

    #[test]
    fn replacement_sites_are_separated_and_ranked() {
        let config = CoverageConfig::default();
        let clinic = facility("clinic", FacilityCategory::Primary, -15.0, 35.0);
        let settlements = [
            settlement("North", -15.0 + 4.0 * KM, 35.0),
            settlement("NorthTwin", -15.0 + 4.5 * KM, 35.0),
            settlement("South", -15.0 - 4.0 * KM, 35.0),
            settlement("Near", -15.0 + 8.0 * KM, 35.0),
            settlement("Distant", -15.0 + 40.0 * KM, 35.0),
        ];
        let points = [
            PopulationPoint::new(-15.0 + 4.0 * KM, 35.0, 6_000),
            PopulationPoint::new(-15.0 - 4.0 * KM, 35.0, 2_000),
        ];

        let report = analyze_removal(&clinic, &[clinic.clone()], &settlements, &points, &config);

        let affected: Vec<&str> = report
            .affected_settlements
            .iter()
            .map(|a| a.settlement.name.as_str())
            .collect();
        assert_eq!(affected, vec!["North", "NorthTwin", "South"]);

        let names: Vec<&str> = report
            .replacement_sites
            .iter()
            .map(|s| s.settlement_name.as_str())
            .collect();
        assert!(!names.contains(&"Distant"));
        assert_eq!(names.first(), Some(&"North"));

        for (i, a) in report.replacement_sites.iter().enumerate() {
            for b in &report.replacement_sites[i + 1..] {
                assert!(distance(a.location(), b.location()) > config.min_separation_km());
            }
        }
        for pair in report.replacement_sites.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
    }

    #[test]
    fn replacement_search_reach_has_its_own_factor() {
        let clinic = facility("clinic", FacilityCategory::Primary, -15.0, 35.0);
        let settlements = [
            settlement("Chisi", -15.0 + 2.0 * KM, 35.0),
            settlement("Kapeni", -15.0 - 8.0 * KM, 35.0),
        ];
        let site_names = |config: &CoverageConfig| -> Vec<String> {
            analyze_removal(&clinic, &[clinic.clone()], &settlements, &[], config)
                .replacement_sites
                .into_iter()
                .map(|s| s.settlement_name)
                .collect()
        };

        let default_names = site_names(&CoverageConfig::default());
        assert!(default_names.contains(&"Kapeni".to_string()));

        let narrow = CoverageConfig {
            candidate_exclusion_factor: 4.0,
            impact: ImpactWeights {
                replacement_search_factor: 1.0,
                ..ImpactWeights::default()
            },
            ..CoverageConfig::default()
        };
        assert_eq!(site_names(&narrow), vec!["Chisi".to_string()]);
    }

    #[test]
    fn unknown_facility_id_is_an_error() {
        let config = CoverageConfig::default();
        let clinic = facility("clinic", FacilityCategory::Primary, -15.0, 35.0);
        assert!(matches!(
            analyze_removal_by_id("missing", &[clinic], &[], &[], &config),
            Err(CoverageError::UnknownFacility { id }) if id == "missing"
        ));
    }

    #[test]
    fn removal_by_id_matches_direct_analysis() {
        let config = CoverageConfig::default();
        let clinic = facility("clinic", FacilityCategory::Primary, -15.0, 35.0);
        let facilities = [clinic.clone()];
        let settlements = [settlement("Chisi", -15.0 + KM, 35.0)];

        let by_id = analyze_removal_by_id("clinic", &facilities, &settlements, &[], &config).unwrap();
        let direct = analyze_removal(&clinic, &facilities, &settlements, &[], &config);
        assert_eq!(by_id, direct);
    }
}
