//! Static building catalog.
//!
//! Maps building-type identifiers to their device class, connection
//! capacity and cost. The catalog is built once (from RON data or the
//! built-in defaults) and shared read-only; nothing mutates it at runtime.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::CatalogData;
use crate::error::{GameError, Result};

/// Unique identifier for building types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildingTypeId(pub u32);

impl BuildingTypeId {
    /// Create a new building type ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for BuildingTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reserved building type occupying the castle block.
pub const CASTLE_ID: BuildingTypeId = BuildingTypeId(0);

/// Category of a building for network topology purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum DeviceClass {
    /// End device; holds a single link.
    Host,
    /// Aggregates hosts, subject to a Host fan-out limit.
    Switch,
    /// Routes between switches and other routers.
    Router,
    /// Attachment protecting another device or the castle.
    Firewall,
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Host => "Host",
            Self::Switch => "Switch",
            Self::Router => "Router",
            Self::Firewall => "Firewall",
        };
        f.write_str(name)
    }
}

/// Firewall subtype, each with its own attachment target rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FirewallKind {
    /// Host Firewall: attaches to a Host-class device.
    #[serde(rename = "HF")]
    Host,
    /// Network Firewall: attaches to a Router-class device.
    #[serde(rename = "NWF")]
    Network,
    /// Web Application Firewall: attaches to the castle, one per player.
    #[serde(rename = "WAF")]
    WebApplication,
}

impl FirewallKind {
    /// Device class this firewall must be attached to, if any.
    ///
    /// `None` means the target is the castle block rather than a device.
    #[must_use]
    pub const fn target_class(self) -> Option<DeviceClass> {
        match self {
            Self::Host => Some(DeviceClass::Host),
            Self::Network => Some(DeviceClass::Router),
            Self::WebApplication => None,
        }
    }

    /// Short code used in data files and the wire format.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Host => "HF",
            Self::Network => "NWF",
            Self::WebApplication => "WAF",
        }
    }
}

impl fmt::Display for FirewallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Host => "Host Firewall",
            Self::Network => "Network Firewall",
            Self::WebApplication => "Web Application Firewall",
        };
        f.write_str(name)
    }
}

/// Catalog entry for one building type.
///
/// # Example RON
///
/// ```ron
/// BuildingType(
///     id: 3,
///     name: "Switch",
///     deviceClass: Some(Switch),
///     maxConnections: 8,
///     cost: 100,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingType {
    /// Unique identifier for this building type.
    pub id: BuildingTypeId,
    /// Display name, also used in rejection messages.
    pub name: String,
    /// Topology class; `None` for non-network buildings such as the castle.
    #[serde(default)]
    pub device_class: Option<DeviceClass>,
    /// Firewall subtype, present exactly when `device_class` is Firewall.
    #[serde(default)]
    pub firewall_kind: Option<FirewallKind>,
    /// Maximum number of links this device may hold.
    #[serde(default)]
    pub max_connections: u32,
    /// Currency cost to place or attach.
    #[serde(default)]
    pub cost: u32,
    /// Player-facing description.
    #[serde(default)]
    pub description: String,
}

impl BuildingType {
    /// Create a network device type.
    #[must_use]
    pub fn device(
        id: u32,
        name: impl Into<String>,
        class: DeviceClass,
        max_connections: u32,
        cost: u32,
    ) -> Self {
        Self {
            id: BuildingTypeId(id),
            name: name.into(),
            device_class: Some(class),
            firewall_kind: None,
            max_connections,
            cost,
            description: String::new(),
        }
    }

    /// Create a firewall type.
    #[must_use]
    pub fn firewall(id: u32, name: impl Into<String>, kind: FirewallKind, cost: u32) -> Self {
        Self {
            id: BuildingTypeId(id),
            name: name.into(),
            device_class: Some(DeviceClass::Firewall),
            firewall_kind: Some(kind),
            max_connections: 0,
            cost,
            description: String::new(),
        }
    }

    /// The reserved castle entry.
    #[must_use]
    pub fn castle() -> Self {
        Self {
            id: CASTLE_ID,
            name: "Castle".to_string(),
            device_class: None,
            firewall_kind: None,
            max_connections: 0,
            cost: 0,
            description: "Your headquarters. Protect it.".to_string(),
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Check whether this type is a firewall attachment.
    #[must_use]
    pub fn is_firewall(&self) -> bool {
        self.device_class == Some(DeviceClass::Firewall)
    }
}

/// Read-only registry of all building types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildingCatalog {
    types: BTreeMap<BuildingTypeId, BuildingType>,
}

impl BuildingCatalog {
    /// Build a catalog from loaded data, validating it first.
    ///
    /// The castle entry is added automatically when the data omits it.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidCatalog`] listing every problem found.
    pub fn from_data(data: CatalogData) -> Result<Self> {
        let errors = data.validate();
        if !errors.is_empty() {
            return Err(GameError::InvalidCatalog(errors));
        }

        let mut types: BTreeMap<_, _> = data.buildings.into_iter().map(|b| (b.id, b)).collect();
        types.entry(CASTLE_ID).or_insert_with(BuildingType::castle);

        tracing::debug!(types = types.len(), "Building catalog loaded");
        Ok(Self { types })
    }

    /// The catalog shipped with the game.
    #[must_use]
    pub fn builtin() -> Self {
        let types = builtin_types().into_iter().map(|b| (b.id, b)).collect();
        Self { types }
    }

    /// Look up a building type by ID.
    #[must_use]
    pub fn get(&self, id: BuildingTypeId) -> Option<&BuildingType> {
        self.types.get(&id)
    }

    /// Resolve the device class of a building type.
    ///
    /// Returns `None` for unknown IDs and for non-network buildings.
    #[must_use]
    pub fn device_class(&self, id: BuildingTypeId) -> Option<DeviceClass> {
        self.get(id).and_then(|b| b.device_class)
    }

    /// All building types, ordered by ID.
    pub fn iter(&self) -> impl Iterator<Item = &BuildingType> {
        self.types.values()
    }

    /// All building types of one device class, ordered by ID.
    pub fn by_class(&self, class: DeviceClass) -> impl Iterator<Item = &BuildingType> {
        self.types
            .values()
            .filter(move |b| b.device_class == Some(class))
    }

    /// Number of registered types, castle included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl Default for BuildingCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Built-in building types. Mirrors `assets/data/buildings.ron`.
#[must_use]
pub fn builtin_types() -> Vec<BuildingType> {
    vec![
        BuildingType::castle(),
        BuildingType::device(1, "Workstation", DeviceClass::Host, 1, 50)
            .with_description("An employee PC. Connects to a single network device."),
        BuildingType::device(2, "Web Server", DeviceClass::Host, 1, 80)
            .with_description("Hosts the company website."),
        BuildingType::device(3, "Switch", DeviceClass::Switch, 8, 100)
            .with_description("Links up to four hosts into a local network."),
        BuildingType::device(4, "Router", DeviceClass::Router, 6, 150)
            .with_description("Joins switches and other routers together."),
        BuildingType::firewall(101, "Host Firewall", FirewallKind::Host, 60)
            .with_description("Protects a single host."),
        BuildingType::firewall(102, "Network Firewall", FirewallKind::Network, 120)
            .with_description("Filters traffic passing through a router."),
        BuildingType::firewall(103, "Web Application Firewall", FirewallKind::WebApplication, 200)
            .with_description("Shields the castle's web applications."),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let catalog = BuildingCatalog::builtin();
        let switch = catalog.get(BuildingTypeId(3)).unwrap();
        assert_eq!(switch.name, "Switch");
        assert_eq!(switch.device_class, Some(DeviceClass::Switch));
        assert!(catalog.get(BuildingTypeId(999)).is_none());
    }

    #[test]
    fn test_castle_has_no_device_class() {
        let catalog = BuildingCatalog::builtin();
        assert!(catalog.get(CASTLE_ID).is_some());
        assert_eq!(catalog.device_class(CASTLE_ID), None);
    }

    #[test]
    fn test_by_class() {
        let catalog = BuildingCatalog::builtin();
        let hosts: Vec<_> = catalog.by_class(DeviceClass::Host).map(|b| b.id.0).collect();
        assert_eq!(hosts, vec![1, 2]);
        assert_eq!(catalog.by_class(DeviceClass::Firewall).count(), 3);
    }

    #[test]
    fn test_firewall_targets() {
        assert_eq!(FirewallKind::Host.target_class(), Some(DeviceClass::Host));
        assert_eq!(FirewallKind::Network.target_class(), Some(DeviceClass::Router));
        assert_eq!(FirewallKind::WebApplication.target_class(), None);
    }

    #[test]
    fn test_builtin_passes_validation() {
        let data = CatalogData {
            buildings: builtin_types(),
        };
        assert!(data.validate().is_empty(), "{:?}", data.validate());
    }

    #[test]
    fn test_from_data_adds_castle() {
        let data = CatalogData {
            buildings: vec![BuildingType::device(7, "Hub", DeviceClass::Switch, 4, 30)],
        };
        let catalog = BuildingCatalog::from_data(data).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.get(CASTLE_ID).is_some());
    }
}
