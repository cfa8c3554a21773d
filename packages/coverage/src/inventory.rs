//! Facility list summary statistics.

use std::collections::BTreeMap;

use facility_map_coverage_models::{CategoryCount, Facility, FacilityCategory, FacilityInventory};

/// Counts facilities by category and by region label.
#[must_use]
pub fn facility_inventory(facilities: &[Facility]) -> FacilityInventory {
    let mut by_region: BTreeMap<String, u64> = BTreeMap::new();
    for label in facilities.iter().filter_map(|f| f.region.as_deref()) {
        *by_region.entry(label.to_string()).or_default() += 1;
    }

    FacilityInventory {
        total: facilities.len() as u64,
        by_category: FacilityCategory::all()
            .iter()
            .map(|&category| CategoryCount {
                category,
                count: facilities.iter().filter(|f| f.category == category).count() as u64,
            })
            .collect(),
        with_region_label: by_region.values().sum(),
        by_region,
    }
}
