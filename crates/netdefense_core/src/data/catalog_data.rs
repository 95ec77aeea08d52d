//! Catalog data file structure.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::{BuildingType, DeviceClass, CASTLE_ID};

/// Complete building catalog definition.
///
/// # Example RON
///
/// ```ron
/// CatalogData(
///     buildings: [
///         BuildingType(
///             id: 1,
///             name: "Workstation",
///             deviceClass: Some(Host),
///             maxConnections: 1,
///             cost: 50,
///         ),
///         BuildingType(
///             id: 101,
///             name: "Host Firewall",
///             deviceClass: Some(Firewall),
///             firewallKind: Some(HF),
///             cost: 60,
///         ),
///     ],
/// )
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogData {
    /// All building types, castle optional.
    pub buildings: Vec<BuildingType>,
}

impl CatalogData {
    /// Validate internal consistency of catalog data.
    ///
    /// Checks for:
    /// - Unique building IDs
    /// - The castle ID is only used by a class-less, free entry
    /// - Firewall class exactly when a firewall kind is given
    /// - Hosts hold exactly one link, other devices at least one
    ///
    /// Returns a list of validation errors.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let mut seen = BTreeSet::new();

        for building in &self.buildings {
            if !seen.insert(building.id) {
                errors.push(format!("Duplicate building id {}", building.id));
            }

            if building.id == CASTLE_ID {
                if building.device_class.is_some() || building.cost != 0 {
                    errors.push(format!(
                        "Building id {} is reserved for the castle",
                        CASTLE_ID
                    ));
                }
                continue;
            }

            match (building.device_class, building.firewall_kind) {
                (Some(DeviceClass::Firewall), None) => errors.push(format!(
                    "Firewall '{}' has no firewall kind",
                    building.name
                )),
                (Some(DeviceClass::Firewall), Some(_)) => {}
                (_, Some(kind)) => errors.push(format!(
                    "Building '{}' has firewall kind {} but is not a Firewall",
                    building.name,
                    kind.code()
                )),
                (None, None) => errors.push(format!(
                    "Building '{}' has no device class",
                    building.name
                )),
                (Some(DeviceClass::Host), None) if building.max_connections != 1 => {
                    errors.push(format!(
                        "Host '{}' must allow exactly 1 connection, got {}",
                        building.name, building.max_connections
                    ));
                }
                (Some(_), None) if building.max_connections == 0 => errors.push(format!(
                    "Device '{}' allows no connections",
                    building.name
                )),
                (Some(_), None) => {}
            }
        }

        errors
    }
}
