#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Population coverage and facility placement engine.
//!
//! Every entry point is a pure function over borrowed input snapshots: the
//! caller's facility, population, settlement, and boundary lists are never
//! mutated, and identical inputs (including the clustering seed in
//! [`CoverageConfig`]) always produce identical results.
//!
//! - [`coverage`]: covered population totals, per category and per facility
//! - [`cluster`]: seeded k-means over population mass
//! - [`placement`]: candidate scoring and separated top-N selection
//! - [`region`]: boundary-scoped reports and category impact
//! - [`impact`]: settlements that lose coverage when a facility is removed
//! - [`inventory`]: facility counts by category and region label
//! - [`sanitize`]: drops records with invalid coordinates or mass

pub mod cluster;
pub mod coverage;
pub mod impact;
pub mod inventory;
pub mod placement;
pub mod region;
pub mod sanitize;

use facility_map_coverage_models::CoverageConfig;
use thiserror::Error;

/// Errors that can occur during coverage operations.
///
/// Empty inputs and saturated areas are not errors; they produce zero or
/// empty results.
#[derive(Debug, Error)]
pub enum CoverageError {
    /// A configuration value is out of range.
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of what went wrong.
        message: String,
    },

    /// A requested region name matches no boundary.
    #[error("Unknown region: {name}")]
    UnknownRegion {
        /// The region name that was requested.
        name: String,
    },

    /// A facility id is not present in the facility set.
    #[error("Unknown facility: {id}")]
    UnknownFacility {
        /// The facility id that was requested.
        id: String,
    },
}

/// Checks that every configuration value is usable.
///
/// # Errors
///
/// Returns [`CoverageError::InvalidConfig`] describing the first bad value.
pub fn validate_config(config: &CoverageConfig) -> Result<(), CoverageError> {
    let positive = [
        ("radius_km", config.radius_km),
        ("convergence_threshold_deg", config.convergence_threshold_deg),
        ("scoring.population_cap", config.scoring.population_cap),
        ("scoring.distance_cap_km", config.scoring.distance_cap_km),
        ("impact.settlement_cap", config.impact.settlement_cap),
        ("impact.population_cap", config.impact.population_cap),
        ("impact.attribution_radius_km", config.impact.attribution_radius_km),
    ];
    for (name, value) in positive {
        if !value.is_finite() || value <= 0.0 {
            return Err(invalid(format!("{name} must be a positive number, got {value}")));
        }
    }

    let non_negative = [
        ("candidate_exclusion_factor", config.candidate_exclusion_factor),
        ("impact.replacement_search_factor", config.impact.replacement_search_factor),
        ("separation_factor", config.separation_factor),
        ("scoring.population_weight", config.scoring.population_weight),
        ("scoring.distance_weight", config.scoring.distance_weight),
        ("impact.settlement_weight", config.impact.settlement_weight),
        ("impact.population_weight", config.impact.population_weight),
        ("impact.recovery_weight", config.impact.recovery_weight),
    ];
    for (name, value) in non_negative {
        if !value.is_finite() || value < 0.0 {
            return Err(invalid(format!("{name} must be zero or greater, got {value}")));
        }
    }

    if !(0.0..=100.0).contains(&config.low_coverage_percentile) {
        return Err(invalid(format!(
            "low_coverage_percentile must be within 0-100, got {}",
            config.low_coverage_percentile
        )));
    }

    if config.cluster_count == 0 {
        return Err(invalid("cluster_count must be at least 1".to_string()));
    }

    Ok(())
}

const fn invalid(message: String) -> CoverageError {
    CoverageError::InvalidConfig { message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&CoverageConfig::default()).is_ok());
    }

    #[test]
    fn rejects_bad_values() {
        let cases = [
            CoverageConfig {
                radius_km: 0.0,
                ..CoverageConfig::default()
            },
            CoverageConfig {
                radius_km: f64::NAN,
                ..CoverageConfig::default()
            },
            CoverageConfig {
                cluster_count: 0,
                ..CoverageConfig::default()
            },
            CoverageConfig {
                low_coverage_percentile: 101.0,
                ..CoverageConfig::default()
            },
            CoverageConfig {
                separation_factor: -1.0,
                ..CoverageConfig::default()
            },
            CoverageConfig {
                impact: facility_map_coverage_models::ImpactWeights {
                    replacement_search_factor: f64::INFINITY,
                    ..facility_map_coverage_models::ImpactWeights::default()
                },
                ..CoverageConfig::default()
            },
        ];

        for config in cases {
            assert!(
                matches!(
                    validate_config(&config),
                    Err(CoverageError::InvalidConfig { .. })
                ),
                "{config:?} should be rejected"
            );
        }
    }
}
