//! Region boundary geometry.
//!
//! Boundary rings are `[lng, lat]` vertex sequences. Each usable ring
//! becomes one polygon of a [`MultiPolygon`], so membership is the union of
//! the rings. Points exactly on an edge are not contained. Rings with fewer
//! than three vertices, or containing non-finite vertices, are dropped and
//! contain nothing.

use facility_map_coverage_models::{GeoPoint, RegionBoundary};
use geo::{BoundingRect, Contains, LineString, MultiPolygon, Point, Polygon};
use rstar::AABB;

/// Builds the polygon set for `boundary`, one polygon per usable ring.
///
/// Rings may be explicitly closed (first vertex repeated at the end) or left
/// open; both produce the same polygon.
#[must_use]
pub fn boundary_shape(boundary: &RegionBoundary) -> MultiPolygon<f64> {
    boundary
        .rings
        .iter()
        .filter(|ring| is_usable_ring(ring))
        .map(|ring| Polygon::new(LineString::from(ring.clone()), vec![]))
        .collect()
}

/// Returns `true` if `point` lies strictly inside any polygon of `shape`.
#[must_use]
pub fn shape_contains(shape: &MultiPolygon<f64>, point: GeoPoint) -> bool {
    point.is_finite() && shape.contains(&Point::new(point.lng, point.lat))
}

/// Returns `true` if `point` lies inside any ring of `boundary`.
#[must_use]
pub fn boundary_contains(boundary: &RegionBoundary, point: GeoPoint) -> bool {
    shape_contains(&boundary_shape(boundary), point)
}

/// Bounding box of `shape` as an R-tree envelope, or `None` if it has no
/// polygons.
#[must_use]
pub fn shape_envelope(shape: &MultiPolygon<f64>) -> Option<AABB<[f64; 2]>> {
    shape
        .bounding_rect()
        .map(|rect| AABB::from_corners([rect.min().x, rect.min().y], [rect.max().x, rect.max().y]))
}

fn is_usable_ring(ring: &[[f64; 2]]) -> bool {
    ring.len() >= 3 && ring.iter().all(|[x, y]| x.is_finite() && y.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn region(rings: Vec<Vec<[f64; 2]>>) -> RegionBoundary {
        RegionBoundary {
            name: "Test".to_string(),
            rings,
        }
    }

    fn square(min: f64, max: f64) -> Vec<[f64; 2]> {
        vec![[min, min], [max, min], [max, max], [min, max], [min, min]]
    }

    #[test]
    fn contains_interior_point() {
        let boundary = region(vec![square(0.0, 1.0)]);
        assert!(boundary_contains(&boundary, GeoPoint::new(0.5, 0.5)));
        assert!(!boundary_contains(&boundary, GeoPoint::new(0.5, 1.5)));
        assert!(!boundary_contains(&boundary, GeoPoint::new(-0.1, 0.5)));
    }

    #[test]
    fn open_and_closed_rings_agree() {
        let closed = square(0.0, 1.0);
        let open = closed[..4].to_vec();
        let closed = region(vec![closed]);
        let open = region(vec![open]);
        for point in [
            GeoPoint::new(0.5, 0.5),
            GeoPoint::new(0.1, 0.9),
            GeoPoint::new(2.0, 2.0),
        ] {
            assert_eq!(
                boundary_contains(&closed, point),
                boundary_contains(&open, point)
            );
        }
    }

    #[test]
    fn concave_ring() {
        // A "U" shape open to the north.
        let boundary = region(vec![vec![
            [0.0, 0.0],
            [3.0, 0.0],
            [3.0, 3.0],
            [2.0, 3.0],
            [2.0, 1.0],
            [1.0, 1.0],
            [1.0, 3.0],
            [0.0, 3.0],
        ]]);
        assert!(boundary_contains(&boundary, GeoPoint::new(2.0, 0.5)));
        assert!(!boundary_contains(&boundary, GeoPoint::new(1.5, 1.5)));
        assert!(boundary_contains(&boundary, GeoPoint::new(2.5, 2.5)));
    }

    #[test]
    fn degenerate_rings_contain_nothing() {
        let origin = GeoPoint::new(0.5, 0.5);
        assert!(!boundary_contains(&region(vec![vec![]]), origin));
        assert!(!boundary_contains(
            &region(vec![vec![[0.0, 0.0], [1.0, 1.0]]]),
            origin
        ));
        assert!(!boundary_contains(
            &region(vec![vec![[0.0, 0.0], [f64::NAN, 0.0], [1.0, 1.0], [0.0, 1.0]]]),
            origin
        ));
        assert!(!boundary_contains(
            &region(vec![square(0.0, 1.0)]),
            GeoPoint::new(f64::NAN, 0.5)
        ));
    }

    #[test]
    fn boundary_is_union_of_rings() {
        let boundary = region(vec![square(0.0, 1.0), square(5.0, 6.0)]);
        assert!(boundary_contains(&boundary, GeoPoint::new(0.5, 0.5)));
        assert!(boundary_contains(&boundary, GeoPoint::new(5.5, 5.5)));
        assert!(!boundary_contains(&boundary, GeoPoint::new(3.0, 3.0)));
    }

    #[test]
    fn overlapping_rings_still_contain_the_overlap() {
        let boundary = region(vec![square(0.0, 2.0), square(1.0, 3.0)]);
        assert!(boundary_contains(&boundary, GeoPoint::new(1.5, 1.5)));
    }

    #[test]
    fn envelope_covers_all_rings() {
        let shape = boundary_shape(&region(vec![square(0.0, 1.0), square(5.0, 6.0)]));
        let envelope = shape_envelope(&shape).unwrap();
        assert_eq!(envelope.lower(), [0.0, 0.0]);
        assert_eq!(envelope.upper(), [6.0, 6.0]);

        assert!(shape_envelope(&boundary_shape(&region(vec![]))).is_none());
    }
}
