#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Spatial primitives for the coverage engine.
//!
//! Provides great-circle distance with a conservative bounding-box
//! pre-filter ([`distance`]), polygon membership over boundary rings
//! ([`polygon`]), and an R-tree [`RegionIndex`] over named administrative
//! boundaries for fast region membership lookups.

pub mod distance;
pub mod polygon;

use std::collections::BTreeSet;

use facility_map_coverage_models::{GeoPoint, RegionBoundary};
use geo::MultiPolygon;
use geojson::GeoJson;
use rstar::{AABB, RTree, RTreeObject};
use thiserror::Error;

pub use distance::{distance, within_bounding_box, within_radius};
pub use polygon::{boundary_contains, boundary_shape};

/// Errors that can occur while loading boundary geometry.
#[derive(Debug, Error)]
pub enum SpatialError {
    /// The `GeoJSON` text could not be parsed.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// The `GeoJSON` document holds neither a feature nor a feature
    /// collection.
    #[error("Expected a GeoJSON Feature or FeatureCollection")]
    MissingFeatures,
}

/// A boundary's polygons stored in the R-tree, pointing back at the
/// boundary by load order index.
struct RegionEntry {
    index: usize,
    envelope: AABB<[f64; 2]>,
    shape: MultiPolygon<f64>,
}

impl RTreeObject for RegionEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Named region boundaries with an R-tree over their bounding boxes.
///
/// Several boundaries may share a name; membership in a name is the union
/// of all of them.
pub struct RegionIndex {
    boundaries: Vec<RegionBoundary>,
    tree: RTree<RegionEntry>,
}

impl RegionIndex {
    /// Builds the index. Boundaries without any usable ring are kept for
    /// name lookups but never contain a point.
    #[must_use]
    pub fn new(boundaries: Vec<RegionBoundary>) -> Self {
        let entries = boundaries
            .iter()
            .enumerate()
            .filter_map(|(index, boundary)| {
                let shape = polygon::boundary_shape(boundary);
                let Some(envelope) = polygon::shape_envelope(&shape) else {
                    log::warn!("Region '{}' has no usable rings", boundary.name);
                    return None;
                };
                Some(RegionEntry {
                    index,
                    envelope,
                    shape,
                })
            })
            .collect();

        let tree = RTree::bulk_load(entries);
        log::debug!("Indexed {} region boundaries", tree.size());

        Self { boundaries, tree }
    }

    /// All boundaries in load order.
    #[must_use]
    pub fn boundaries(&self) -> &[RegionBoundary] {
        &self.boundaries
    }

    /// Distinct region names in sorted order.
    #[must_use]
    pub fn region_names(&self) -> BTreeSet<&str> {
        self.boundaries.iter().map(|b| b.name.as_str()).collect()
    }

    /// Returns `true` if at least one boundary carries `name`.
    #[must_use]
    pub fn has_region(&self, name: &str) -> bool {
        self.boundaries.iter().any(|b| b.name == name)
    }

    /// Name of the first boundary (in load order) containing `point`.
    #[must_use]
    pub fn region_for_point(&self, point: GeoPoint) -> Option<&str> {
        self.candidates(point)
            .filter(|entry| polygon::shape_contains(&entry.shape, point))
            .map(|entry| entry.index)
            .min()
            .map(|index| self.boundaries[index].name.as_str())
    }

    /// Returns `true` if `point` lies inside any boundary whose name is in
    /// `names`.
    #[must_use]
    pub fn contains_any(&self, names: &BTreeSet<&str>, point: GeoPoint) -> bool {
        self.candidates(point).any(|entry| {
            names.contains(self.boundaries[entry.index].name.as_str())
                && polygon::shape_contains(&entry.shape, point)
        })
    }

    /// Entries whose bounding box contains `point`.
    fn candidates(&self, point: GeoPoint) -> impl Iterator<Item = &RegionEntry> {
        let finite = point.is_finite();
        let query = AABB::from_point([point.lng, point.lat]);
        self.tree
            .locate_in_envelope_intersecting(&query)
            .filter(move |_| finite)
    }
}

/// Parses a `GeoJSON` Feature or `FeatureCollection` into region
/// boundaries, naming each one by the string property `name_property`.
///
/// Polygon holes are not kept: membership is the union of the outer rings.
/// Features without a name or with non-areal geometry are skipped with a
/// warning.
///
/// # Errors
///
/// Returns [`SpatialError`] if the text is not valid `GeoJSON` or is a bare
/// geometry.
pub fn boundaries_from_geojson(
    geojson_str: &str,
    name_property: &str,
) -> Result<Vec<RegionBoundary>, SpatialError> {
    let features = match geojson_str.parse::<GeoJson>()? {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => return Err(SpatialError::MissingFeatures),
    };

    let mut boundaries = Vec::with_capacity(features.len());

    for feature in features {
        let Some(name) = feature
            .property(name_property)
            .and_then(|value| value.as_str())
            .map(str::to_string)
        else {
            log::warn!("Skipping boundary feature without a '{name_property}' property");
            continue;
        };

        let Some(rings) = feature.geometry.and_then(geometry_to_rings) else {
            log::warn!("Skipping boundary '{name}': unsupported or missing geometry");
            continue;
        };

        boundaries.push(RegionBoundary { name, rings });
    }

    Ok(boundaries)
}

/// Outer rings of a `Polygon` or `MultiPolygon` geometry.
fn geometry_to_rings(geometry: geojson::Geometry) -> Option<Vec<Vec<[f64; 2]>>> {
    let geo_geom: geo::Geometry<f64> = geometry.try_into().ok()?;
    let polygons = match geo_geom {
        geo::Geometry::Polygon(p) => vec![p],
        geo::Geometry::MultiPolygon(mp) => mp.0,
        _ => return None,
    };

    Some(
        polygons
            .iter()
            .map(|polygon| polygon.exterior().coords().map(|c| [c.x, c.y]).collect())
            .collect(),
    )
}
