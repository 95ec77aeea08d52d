//! Data validation utilities.

use std::collections::BTreeMap;
use std::path::Path;

use netdefense_core::catalog::{BuildingCatalog, DeviceClass};
use netdefense_core::rules::GameRules;
use netdefense_server::config::{load_catalog, load_rules, CatalogLoadError};
use serde::Serialize;
use thiserror::Error;

/// Catalog file name inside a data directory.
pub const CATALOG_FILE: &str = "buildings.ron";
/// Rules file name inside a data directory.
pub const RULES_FILE: &str = "rules.ron";

/// Errors reported by the validators.
#[derive(Debug, Error)]
pub enum ValidateError {
    /// A data file failed to read, parse, or validate on its own.
    #[error(transparent)]
    Load(#[from] CatalogLoadError),

    /// Catalog and rules are individually valid but disagree.
    #[error("Catalog and rules disagree: {}", .0.join("; "))]
    Mismatch(Vec<String>),

    /// Summary could not be rendered.
    #[error("Failed to render summary: {0}")]
    Render(#[from] ron::Error),
}

/// Result of validating a data directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DataReport {
    /// Building types in the catalog, castle included.
    pub building_types: usize,
    /// Grid side length from the rules.
    pub grid_size: u32,
}

/// Parse and validate a building catalog file.
///
/// Uses the same loader as the server, so a file accepted here is
/// accepted at startup.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or validated.
pub fn validate_catalog_file(path: &Path) -> Result<BuildingCatalog, ValidateError> {
    Ok(load_catalog(path)?)
}

/// Parse and validate a rules file.
///
/// # Errors
///
/// Returns an error if the file cannot be read, parsed, or validated.
pub fn validate_rules_file(path: &Path) -> Result<GameRules, ValidateError> {
    Ok(load_rules(path)?)
}

/// Switches whose link cap cannot cover the rules' host fan-out.
fn starved_switches(catalog: &BuildingCatalog, rules: &GameRules) -> Vec<String> {
    catalog
        .by_class(DeviceClass::Switch)
        .filter(|s| s.max_connections < rules.switch_host_fanout)
        .map(|s| {
            format!(
                "{} allows {} links but switches may serve {} hosts",
                s.name, s.max_connections, rules.switch_host_fanout
            )
        })
        .collect()
}

/// Validate `buildings.ron` and `rules.ron` in a directory, and check
/// that they agree with each other.
///
/// # Errors
///
/// Returns an error if any data file fails validation.
pub fn validate_data_directory(path: &Path) -> Result<DataReport, ValidateError> {
    let catalog = validate_catalog_file(&path.join(CATALOG_FILE))?;
    let rules = validate_rules_file(&path.join(RULES_FILE))?;

    let starved = starved_switches(&catalog, &rules);
    if !starved.is_empty() {
        return Err(ValidateError::Mismatch(starved));
    }

    Ok(DataReport {
        building_types: catalog.len(),
        grid_size: rules.grid_size,
    })
}

/// One catalog entry in summary form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySummary {
    /// Building type ID.
    pub id: u32,
    /// Display name.
    pub name: String,
    /// Placement or attachment cost.
    pub cost: u32,
    /// Link capacity.
    pub max_connections: u32,
}

/// A catalog grouped by device class, for printing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogSummary {
    /// Entries keyed by class name; class-less buildings under `"None"`.
    pub classes: BTreeMap<String, Vec<EntrySummary>>,
}

impl CatalogSummary {
    /// Group a catalog by device class.
    #[must_use]
    pub fn new(catalog: &BuildingCatalog) -> Self {
        let mut classes: BTreeMap<String, Vec<EntrySummary>> = BTreeMap::new();
        for building in catalog.iter() {
            let class = building
                .device_class
                .map_or_else(|| "None".to_string(), |c| c.to_string());
            classes.entry(class).or_default().push(EntrySummary {
                id: building.id.0,
                name: building.name.clone(),
                cost: building.cost,
                max_connections: building.max_connections,
            });
        }
        Self { classes }
    }

    /// Render as pretty RON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_ron(&self) -> Result<String, ValidateError> {
        Ok(ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?)
    }
}
