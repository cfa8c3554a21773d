//! Defensive filtering of records that should never reach the engine.
//!
//! The loading layer is expected to drop these already. Anything that
//! slips through is skipped here rather than propagated into totals.

use facility_map_coverage_models::{Facility, PopulationPoint, Settlement};

/// Returns `true` if the point has finite coordinates and positive mass.
#[must_use]
pub const fn is_usable_point(point: &PopulationPoint) -> bool {
    point.lat.is_finite() && point.lng.is_finite() && point.population > 0
}

/// Keeps only population points with finite coordinates and positive mass.
#[must_use]
pub fn population_points(points: &[PopulationPoint]) -> Vec<PopulationPoint> {
    let kept: Vec<PopulationPoint> = points.iter().copied().filter(is_usable_point).collect();
    log_skipped("population points", points.len(), kept.len());
    kept
}

/// Keeps only facilities with finite coordinates.
#[must_use]
pub fn facilities(facilities: &[Facility]) -> Vec<Facility> {
    let kept: Vec<Facility> = facilities
        .iter()
        .filter(|f| f.location().is_finite())
        .cloned()
        .collect();
    log_skipped("facilities", facilities.len(), kept.len());
    kept
}

/// Keeps only settlements with finite coordinates.
#[must_use]
pub fn settlements(settlements: &[Settlement]) -> Vec<Settlement> {
    let kept: Vec<Settlement> = settlements
        .iter()
        .filter(|s| s.location().is_finite())
        .cloned()
        .collect();
    log_skipped("settlements", settlements.len(), kept.len());
    kept
}

fn log_skipped(kind: &str, before: usize, after: usize) {
    if before > after {
        log::warn!("Skipped {} invalid {kind} of {before}", before - after);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use facility_map_coverage_models::FacilityCategory;

    #[test]
    fn drops_invalid_population_points() {
        let points = [
            PopulationPoint::new(-15.0, 35.0, 10),
            PopulationPoint::new(f64::NAN, 35.0, 10),
            PopulationPoint::new(-15.0, f64::INFINITY, 10),
            PopulationPoint::new(-15.0, 35.0, 0),
        ];
        let kept = population_points(&points);
        assert_eq!(kept, vec![PopulationPoint::new(-15.0, 35.0, 10)]);
    }

    #[test]
    fn drops_facilities_without_finite_location() {
        let make = |id: &str, lat: f64| Facility {
            id: id.to_string(),
            name: id.to_string(),
            category: FacilityCategory::Primary,
            lat,
            lng: 35.0,
            region: None,
        };
        let kept = facilities(&[make("a", -15.0), make("b", f64::NAN)]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "a");
    }

    #[test]
    fn drops_settlements_without_finite_location() {
        let kept = settlements(&[
            Settlement {
                name: "Ok".to_string(),
                lat: -15.0,
                lng: 35.0,
            },
            Settlement {
                name: "Bad".to_string(),
                lat: -15.0,
                lng: f64::NEG_INFINITY,
            },
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].name, "Ok");
    }
}
