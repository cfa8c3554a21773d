//! Seeded k-means over population points.
//!
//! Groups population mass into `k` geographic centers that serve as
//! placement candidates. Initial centroids are `k` distinct points drawn
//! with a `ChaCha8Rng` seeded from the configuration, so the same input and
//! seed always produce the same clusters.

use facility_map_coverage_models::{Cluster, CoverageConfig, GeoPoint, PopulationPoint};
use facility_map_spatial::distance;
use rand::SeedableRng as _;
use rand::seq::index::sample;
use rand_chacha::ChaCha8Rng;

use crate::sanitize::is_usable_point;

/// Clusters `points` using the count, iteration limit, convergence
/// threshold, and seed from `config`.
#[must_use]
pub fn cluster_population(points: &[PopulationPoint], config: &CoverageConfig) -> Vec<Cluster> {
    kmeans(
        points,
        config.cluster_count,
        config.max_iterations,
        config.convergence_threshold_deg,
        config.cluster_seed,
    )
}

/// Partitions `points` into at most `k` clusters.
///
/// With `k` or fewer points, each point becomes its own cluster. Otherwise
/// points are assigned to their nearest centroid by great-circle distance
/// and centroids move to the plain mean of their members' coordinates,
/// until no centroid moves by `threshold_deg` or more, or `max_iterations`
/// rounds have run (at least one always runs). Empty clusters are dropped
/// from the result.
#[must_use]
pub fn kmeans(
    points: &[PopulationPoint],
    k: usize,
    max_iterations: usize,
    threshold_deg: f64,
    seed: u64,
) -> Vec<Cluster> {
    let points: Vec<PopulationPoint> = points.iter().copied().filter(is_usable_point).collect();

    if k == 0 || points.is_empty() {
        return Vec::new();
    }

    if points.len() <= k {
        return points
            .into_iter()
            .map(|point| Cluster {
                centroid: point.location(),
                members: vec![point],
                aggregate_mass: point.population,
            })
            .collect();
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut centroids: Vec<GeoPoint> = sample(&mut rng, points.len(), k)
        .into_iter()
        .map(|i| points[i].location())
        .collect();

    let mut iterations = 0;
    let assignments = loop {
        let assignments = assign(&points, &centroids);
        let updated = recompute(&points, &assignments, &centroids);
        let movement = centroids
            .iter()
            .zip(&updated)
            .map(|(a, b)| (a.lat - b.lat).hypot(a.lng - b.lng))
            .fold(0.0_f64, f64::max);

        centroids = updated;
        iterations += 1;

        if movement < threshold_deg {
            log::debug!("k-means converged after {iterations} iterations");
            break assignments;
        }
        if iterations >= max_iterations {
            log::debug!("k-means stopped at {iterations} iterations (movement {movement:.5} deg)");
            break assignments;
        }
    };

    let mut clusters: Vec<Cluster> = centroids
        .into_iter()
        .map(|centroid| Cluster {
            centroid,
            members: Vec::new(),
            aggregate_mass: 0,
        })
        .collect();

    for (point, cluster) in points.into_iter().zip(assignments) {
        let cluster = &mut clusters[cluster];
        cluster.aggregate_mass = cluster.aggregate_mass.saturating_add(point.population);
        cluster.members.push(point);
    }

    clusters.retain(|c| !c.members.is_empty());
    clusters
}

/// Index of the nearest centroid for each point. Ties go to the lower index.
fn assign(points: &[PopulationPoint], centroids: &[GeoPoint]) -> Vec<usize> {
    points
        .iter()
        .map(|point| {
            let location = point.location();
            centroids
                .iter()
                .enumerate()
                .map(|(i, &c)| (i, distance(location, c)))
                .fold((0, f64::INFINITY), |best, (i, d)| if d < best.1 { (i, d) } else { best })
                .0
        })
        .collect()
}

/// Mean member location for each centroid; empty clusters keep their
/// previous centroid.
#[allow(clippy::cast_precision_loss)]
fn recompute(points: &[PopulationPoint], assignments: &[usize], centroids: &[GeoPoint]) -> Vec<GeoPoint> {
    let mut sums = vec![(0.0_f64, 0.0_f64, 0_usize); centroids.len()];

    for (point, &cluster) in points.iter().zip(assignments) {
        let entry = &mut sums[cluster];
        entry.0 += point.lat;
        entry.1 += point.lng;
        entry.2 += 1;
    }

    sums.into_iter()
        .zip(centroids)
        .map(|((lat, lng, count), &previous)| {
            if count == 0 {
                previous
            } else {
                GeoPoint::new(lat / count as f64, lng / count as f64)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blob(lat: f64, lng: f64, n: u32) -> Vec<PopulationPoint> {
        (0..n)
            .map(|i| {
                let offset = f64::from(i) * 0.001;
                PopulationPoint::new(lat + offset, lng - offset, 100 + u64::from(i))
            })
            .collect()
    }

    #[test]
    fn fewer_points_than_k_gives_singletons() {
        let points = vec![
            PopulationPoint::new(-15.0, 35.0, 10),
            PopulationPoint::new(-15.5, 35.5, 20),
        ];
        let clusters = kmeans(&points, 5, 50, 0.001, 7);

        assert_eq!(clusters.len(), 2);
        for (cluster, point) in clusters.iter().zip(&points) {
            assert_eq!(cluster.centroid, point.location());
            assert_eq!(cluster.members, vec![*point]);
            assert_eq!(cluster.aggregate_mass, point.population);
        }
    }

    #[test]
    fn k_equal_to_point_count_gives_singletons() {
        let points = blob(-15.0, 35.0, 4);
        let clusters = kmeans(&points, 4, 50, 0.001, 7);
        assert_eq!(clusters.len(), 4);
        assert!(clusters.iter().all(|c| c.members.len() == 1));
    }

    #[test]
    fn separates_distinct_blobs() {
        let mut points = blob(-15.0, 35.0, 10);
        points.extend(blob(-12.0, 33.0, 10));
        let clusters = kmeans(&points, 2, 50, 0.001, 1);

        assert_eq!(clusters.len(), 2);
        for cluster in &clusters {
            assert_eq!(cluster.members.len(), 10);
            let first = cluster.members[0].lat;
            assert!(cluster.members.iter().all(|m| (m.lat - first).abs() < 1.0));
        }

        let total: u64 = clusters.iter().map(|c| c.aggregate_mass).sum();
        assert_eq!(total, points.iter().map(|p| p.population).sum::<u64>());
    }

    #[test]
    fn same_seed_is_reproducible() {
        let mut points = blob(-15.0, 35.0, 15);
        points.extend(blob(-14.0, 34.0, 15));
        points.extend(blob(-13.0, 33.5, 15));

        let a = kmeans(&points, 3, 50, 0.001, 99);
        let b = kmeans(&points, 3, 50, 0.001, 99);
        assert_eq!(a, b);
    }

    #[test]
    fn centroid_is_member_mean() {
        let mut points = blob(-15.0, 35.0, 6);
        points.extend(blob(-10.0, 30.0, 6));
        for cluster in kmeans(&points, 2, 50, 0.001, 3) {
            #[allow(clippy::cast_precision_loss)]
            let n = cluster.members.len() as f64;
            let lat = cluster.members.iter().map(|m| m.lat).sum::<f64>() / n;
            let lng = cluster.members.iter().map(|m| m.lng).sum::<f64>() / n;
            assert!((cluster.centroid.lat - lat).abs() < 1e-9);
            assert!((cluster.centroid.lng - lng).abs() < 1e-9);
        }
    }

    #[test]
    fn empty_input_or_zero_k_is_empty() {
        assert!(kmeans(&[], 5, 50, 0.001, 0).is_empty());
        assert!(kmeans(&blob(-15.0, 35.0, 3), 0, 50, 0.001, 0).is_empty());
    }

    #[test]
    fn uses_config_values() {
        let config = CoverageConfig {
            cluster_count: 2,
            ..CoverageConfig::default()
        };
        let mut points = blob(-15.0, 35.0, 5);
        points.extend(blob(-11.0, 34.0, 5));
        assert_eq!(cluster_population(&points, &config).len(), 2);
    }
}
