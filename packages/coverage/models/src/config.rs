//! Tunable parameters for every coverage computation.
//!
//! A single [`CoverageConfig`] value is passed into each entry point.
//! Every field has a default, so a partial TOML file is valid:
//!
//! ```toml
//! radius_km = 7.5
//! recommendation_count = 10
//!
//! [scoring]
//! population_cap = 25000
//! ```

use serde::{Deserialize, Serialize};

/// Weights and caps for placement scoring.
///
/// Each term is divided by its cap and clipped to `[0, 1]` before being
/// weighted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    /// Weight of the marginal population term.
    pub population_weight: f64,
    /// Marginal population that saturates the population term.
    pub population_cap: f64,
    /// Weight of the isolation (distance to nearest facility) term.
    pub distance_weight: f64,
    /// Distance in km that saturates the isolation term.
    pub distance_cap_km: f64,
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            population_weight: 0.7,
            population_cap: 50_000.0,
            distance_weight: 0.3,
            distance_cap_km: 10.0,
        }
    }
}

/// Weights, caps, and estimation parameters for removal impact analysis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImpactWeights {
    /// Weight of the newly covered settlement count term.
    pub settlement_weight: f64,
    /// Settlement count that saturates the settlement term.
    pub settlement_cap: f64,
    /// Weight of the covered population term.
    pub population_weight: f64,
    /// Population that saturates the population term.
    pub population_cap: f64,
    /// Weight of the recovered share of affected settlements.
    pub recovery_weight: f64,
    /// Radius in km within which population points are attributed to a
    /// settlement, with linear falloff to zero at this distance.
    pub attribution_radius_km: f64,
    /// Population assumed for a settlement with no population points
    /// nearby.
    pub fallback_population: u64,
    /// Unaffected settlements within this multiple of the radius of the
    /// removed facility are also considered as replacement sites.
    pub replacement_search_factor: f64,
}

impl Default for ImpactWeights {
    fn default() -> Self {
        Self {
            settlement_weight: 0.3,
            settlement_cap: 10.0,
            population_weight: 0.4,
            population_cap: 10_000.0,
            recovery_weight: 0.3,
            attribution_radius_km: 2.0,
            fallback_population: 750,
            replacement_search_factor: 2.0,
        }
    }
}

/// Every tunable used by the coverage engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoverageConfig {
    /// Maximum distance in km at which a facility serves a population point.
    pub radius_km: f64,
    /// Number of clusters produced when clustering candidate sites.
    pub cluster_count: usize,
    /// Upper bound on clustering iterations.
    pub max_iterations: usize,
    /// Clustering stops once no centroid moves more than this many degrees.
    pub convergence_threshold_deg: f64,
    /// Seed for choosing initial cluster centroids.
    pub cluster_seed: u64,
    /// Number of placement recommendations requested.
    pub recommendation_count: usize,
    /// Number of population points considered as candidate sites.
    pub candidate_pool_size: usize,
    /// Population points within this multiple of the radius of an existing
    /// facility are not used as candidates.
    pub candidate_exclusion_factor: f64,
    /// Accepted recommendations must be farther apart than this multiple of
    /// the radius.
    pub separation_factor: f64,
    /// Share of in-region facilities (lowest catchment first) flagged as low
    /// coverage, in percent.
    pub low_coverage_percentile: f64,
    /// Placement scoring weights.
    pub scoring: ScoringWeights,
    /// Removal impact weights.
    pub impact: ImpactWeights,
}

impl Default for CoverageConfig {
    fn default() -> Self {
        Self {
            radius_km: 5.0,
            cluster_count: 5,
            max_iterations: 50,
            convergence_threshold_deg: 0.001,
            cluster_seed: 42,
            recommendation_count: 5,
            candidate_pool_size: 200,
            candidate_exclusion_factor: 2.0,
            separation_factor: 1.5,
            low_coverage_percentile: 50.0,
            scoring: ScoringWeights::default(),
            impact: ImpactWeights::default(),
        }
    }
}

impl CoverageConfig {
    /// Minimum distance in km between two accepted recommendations.
    #[must_use]
    pub fn min_separation_km(&self) -> f64 {
        self.radius_km * self.separation_factor
    }

    /// Distance in km from an existing facility inside which population
    /// points are not used as candidates.
    #[must_use]
    pub fn candidate_exclusion_km(&self) -> f64 {
        self.radius_km * self.candidate_exclusion_factor
    }

    /// Distance in km from a removed facility within which unaffected
    /// settlements are considered as replacement sites.
    #[must_use]
    pub fn replacement_search_km(&self) -> f64 {
        self.radius_km * self.impact.replacement_search_factor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_uses_defaults() {
        let config: CoverageConfig = toml::from_str(
            r"
            radius_km = 7.5

            [scoring]
            population_cap = 25000.0
            ",
        )
        .unwrap();

        assert!((config.radius_km - 7.5).abs() < f64::EPSILON);
        assert!((config.scoring.population_cap - 25_000.0).abs() < f64::EPSILON);
        assert!((config.scoring.population_weight - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.recommendation_count, 5);
        assert_eq!(config.impact.fallback_population, 750);
    }

    #[test]
    fn derived_distances_scale_with_radius() {
        let config = CoverageConfig {
            radius_km: 4.0,
            ..CoverageConfig::default()
        };
        assert!((config.min_separation_km() - 6.0).abs() < 1e-12);
        assert!((config.candidate_exclusion_km() - 8.0).abs() < 1e-12);
        assert!((config.replacement_search_km() - 8.0).abs() < 1e-12);
    }

    #[test]
    fn replacement_search_is_independent_of_candidate_exclusion() {
        let config: CoverageConfig = toml::from_str(
            r"
            candidate_exclusion_factor = 3.0

            [impact]
            replacement_search_factor = 1.0
            ",
        )
        .unwrap();

        assert!((config.candidate_exclusion_km() - 15.0).abs() < 1e-12);
        assert!((config.replacement_search_km() - 5.0).abs() < 1e-12);
    }
}
