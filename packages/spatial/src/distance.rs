//! Great-circle distance and the bounding-box pre-filter.
//!
//! Every coverage test in the engine is a [`within_bounding_box`] check
//! followed by an exact [`distance`] check. The box is a superset of the
//! circle: it may let through points that are too far away, but it never
//! rejects a point that is actually within the radius.

use facility_map_coverage_models::GeoPoint;

/// Mean Earth radius used for all distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Approximate kilometers per degree of latitude.
///
/// Slightly smaller than the true value (~111.19 km), so boxes derived from
/// it are slightly too large rather than too small.
pub const KM_PER_DEGREE: f64 = 111.0;

/// Great-circle distance between two points in kilometers (haversine).
#[must_use]
pub fn distance(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Fast conservative test for whether `point` may lie within `radius_km`
/// of `center`.
///
/// The latitude half-height is `radius_km / 111`. The longitude half-width
/// is the exact spherical-cap extent for that angular radius, which widens
/// with latitude and covers every longitude once the cap reaches a pole.
/// Longitude differences wrap across the antimeridian.
#[must_use]
pub fn within_bounding_box(point: GeoPoint, center: GeoPoint, radius_km: f64) -> bool {
    if !point.is_finite() || !center.is_finite() || radius_km.is_nan() || radius_km < 0.0 {
        return false;
    }

    let lat_delta = radius_km / KM_PER_DEGREE;
    if (point.lat - center.lat).abs() > lat_delta {
        return false;
    }

    let angular = lat_delta.to_radians();
    let cos_lat = center.lat.to_radians().cos();
    if angular >= std::f64::consts::FRAC_PI_2 || cos_lat <= angular.sin() {
        return true;
    }

    let lng_delta = (angular.sin() / cos_lat).asin().to_degrees();

    longitude_difference(point.lng, center.lng) <= lng_delta
}

/// Returns `true` if `point` is within `radius_km` of `center`, using the
/// bounding box as a pre-filter before the exact distance.
#[must_use]
pub fn within_radius(point: GeoPoint, center: GeoPoint, radius_km: f64) -> bool {
    within_bounding_box(point, center, radius_km) && distance(point, center) <= radius_km
}

/// Absolute longitude difference in degrees, wrapped to `[0, 180]`.
fn longitude_difference(a: f64, b: f64) -> f64 {
    let diff = (a - b).abs() % 360.0;
    if diff > 180.0 { 360.0 - diff } else { diff }
}
