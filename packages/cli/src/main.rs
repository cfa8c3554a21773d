#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Command-line front end for the facility coverage engine.
//!
//! Loads a snapshot of facilities, population cells, and settlements, plus
//! optional region boundaries (`GeoJSON`) and configuration (TOML), runs one
//! analysis, and prints the result as JSON on stdout. Logging goes to
//! stderr and is controlled with `RUST_LOG`.

mod snapshot;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use facility_map_coverage::{cluster, coverage, impact, inventory, placement, region};
use facility_map_coverage_models::{Facility, FacilityCategory, GeoPoint};
use facility_map_spatial::RegionIndex;
use serde::Serialize;

#[derive(Parser)]
#[command(name = "facility_map", about = "Facility coverage and placement analysis")]
struct Cli {
    /// Snapshot JSON with facilities, population, and settlements
    #[arg(long)]
    snapshot: PathBuf,

    /// Region boundaries as a `GeoJSON` `FeatureCollection`
    #[arg(long)]
    boundaries: Option<PathBuf>,

    /// Feature property holding each boundary's name
    #[arg(long, default_value = "name")]
    boundary_name_property: String,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides the configured coverage radius (km)
    #[arg(long)]
    radius_km: Option<f64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Overall and per-category coverage plus a facility inventory
    Coverage,
    /// Clusters of the currently uncovered population
    Clusters,
    /// Recommended sites for new facilities
    Recommend,
    /// Per-region coverage report (every region when no name is given)
    Region {
        /// Region name
        #[arg(long)]
        name: Option<String>,
    },
    /// Coverage over a union of regions and the impact of one category
    Regions {
        /// Region names to combine
        #[arg(long, value_delimiter = ',', required = true)]
        names: Vec<String>,
        /// Category whose contribution is measured
        #[arg(long, default_value = "alternate")]
        category: FacilityCategory,
    },
    /// Settlements that lose coverage if a facility is removed
    Impact {
        /// Id of the facility to remove
        #[arg(long)]
        facility_id: String,
    },
    /// Coverage status of a single location
    Point {
        /// Latitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        /// Longitude in degrees
        #[arg(long, allow_hyphen_values = true)]
        lng: f64,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CoverageSummary {
    overall: facility_map_coverage_models::CoverageResult,
    by_category: Vec<facility_map_coverage_models::CategoryCoverage>,
    inventory: facility_map_coverage_models::FacilityInventory,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PointStatus {
    location: GeoPoint,
    covered: bool,
    nearest_facility_km: Option<f64>,
    region: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let config = snapshot::load_config(cli.config.as_deref(), cli.radius_km)?;
    let data = snapshot::load_snapshot(&cli.snapshot)?;
    let regions = cli
        .boundaries
        .as_deref()
        .map(|path| snapshot::load_regions(path, &cli.boundary_name_property))
        .transpose()?;

    let facilities = facilities_for(&cli.command, &data.facilities, regions.as_ref());
    let radius = config.radius_km;

    match cli.command {
        Commands::Coverage => print_json(&CoverageSummary {
            overall: coverage::coverage(&facilities, &data.population, radius),
            by_category: coverage::coverage_by_category(&facilities, &data.population, radius),
            inventory: inventory::facility_inventory(&facilities),
        })?,
        Commands::Clusters => {
            let uncovered = coverage::uncovered_points(&facilities, &data.population, radius);
            print_json(&cluster::cluster_population(&uncovered, &config))?;
        }
        Commands::Recommend => {
            let recommendations = placement::recommend_sites(&facilities, &data.population, &config);
            if recommendations.is_empty() {
                log::info!("No eligible sites: every candidate is within {radius} km of a facility");
            }
            print_json(&recommendations)?;
        }
        Commands::Region { name } => {
            let index = snapshot::require_regions(regions.as_ref())?;
            match name {
                Some(name) => print_json(&region::region_report(
                    &name,
                    &facilities,
                    &data.population,
                    index,
                    &config,
                )?)?,
                None => print_json(&region::all_region_reports(
                    &facilities,
                    &data.population,
                    index,
                    &config,
                ))?,
            }
        }
        Commands::Regions { names, category } => {
            let index = snapshot::require_regions(regions.as_ref())?;
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            print_json(&region::multi_region_report(
                &names,
                category,
                &facilities,
                &data.population,
                index,
                &config,
            )?)?;
        }
        Commands::Impact { facility_id } => print_json(&impact::analyze_removal_by_id(
            &facility_id,
            &facilities,
            &data.settlements,
            &data.population,
            &config,
        )?)?,
        Commands::Point { lat, lng } => {
            let location = GeoPoint::new(lat, lng);
            print_json(&PointStatus {
                location,
                covered: coverage::is_covered(location, &facilities, radius),
                nearest_facility_km: placement::nearest_facility_distance(location, &facilities),
                region: regions
                    .as_ref()
                    .and_then(|index| index.region_for_point(location))
                    .map(str::to_string),
            })?;
        }
    }

    Ok(())
}

/// Facilities as `command` should see them.
///
/// Only the inventory reports region labels, so missing labels are filled
/// in for `coverage` alone. Region commands leave unlabeled facilities
/// unlabeled and match them against every boundary that contains them.
fn facilities_for(
    command: &Commands,
    facilities: &[Facility],
    regions: Option<&RegionIndex>,
) -> Vec<Facility> {
    match (command, regions) {
        (Commands::Coverage, Some(index)) => region::label_facilities(facilities, index),
        _ => facilities.to_vec(),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
