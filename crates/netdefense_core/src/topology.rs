//! Network topology and connection validation.
//!
//! Placed devices are linked by undirected connections. Whether a new link
//! is legal depends on the device classes at both ends, per-device link
//! caps, and a tighter Host fan-out limit on switches.
//!
//! The validator is a pure predicate: it never mutates the grid or the
//! connection set. The engine persists a link only after validation passes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{BuildingCatalog, BuildingType, BuildingTypeId, DeviceClass, FirewallKind};
use crate::error::{ErrorKind, GameError, Result};
use crate::grid::{Grid, TilePos};
use crate::rules::GameRules;

// ============================================================================
// Connections
// ============================================================================

/// Unique identifier for a connection within one player's network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An undirected link between two placed devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    /// Connection identifier.
    pub id: ConnectionId,
    /// First endpoint.
    pub from: TilePos,
    /// Second endpoint.
    pub to: TilePos,
}

impl Connection {
    /// Check if `pos` is either endpoint.
    #[must_use]
    pub fn touches(&self, pos: TilePos) -> bool {
        self.from == pos || self.to == pos
    }

    /// The endpoint opposite `pos`, if `pos` is an endpoint.
    #[must_use]
    pub fn other_end(&self, pos: TilePos) -> Option<TilePos> {
        if self.from == pos {
            Some(self.to)
        } else if self.to == pos {
            Some(self.from)
        } else {
            None
        }
    }

    /// Check if this connection links `a` and `b`, in either direction.
    #[must_use]
    pub fn links(&self, a: TilePos, b: TilePos) -> bool {
        (self.from == a && self.to == b) || (self.from == b && self.to == a)
    }
}

/// One player's set of connections.
///
/// Decoding never trusts the stored counter below the highest stored ID, so
/// a stale document cannot mint a duplicate.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "ConnectionDocument")]
pub struct ConnectionSet {
    connections: Vec<Connection>,
    next_id: u64,
}

impl ConnectionSet {
    /// Create an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self {
            connections: Vec::new(),
            next_id: 1,
        }
    }

    /// Rebuild a set from stored records, continuing IDs after the highest one.
    #[must_use]
    pub fn from_records(connections: Vec<Connection>) -> Self {
        let next_id = connections.iter().map(|c| c.id.0).max().unwrap_or(0) + 1;
        Self {
            connections,
            next_id,
        }
    }

    /// Number of connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Check if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// All connections in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Connection> {
        self.connections.iter()
    }

    /// Look up a connection by ID.
    #[must_use]
    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|c| c.id == id)
    }

    /// All connections with `pos` as either endpoint.
    pub fn connections_of(&self, pos: TilePos) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |c| c.touches(pos))
    }

    /// Number of connections incident to `pos`.
    #[must_use]
    pub fn degree(&self, pos: TilePos) -> u32 {
        let count = self.connections_of(pos).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Check if `a` and `b` are already linked.
    #[must_use]
    pub fn contains_pair(&self, a: TilePos, b: TilePos) -> bool {
        self.connections.iter().any(|c| c.links(a, b))
    }

    /// Record a new connection. Validation is the caller's job.
    pub(crate) fn insert(&mut self, from: TilePos, to: TilePos) -> Connection {
        let id = ConnectionId(self.next_id.max(1));
        self.next_id = id.0 + 1;
        let connection = Connection { id, from, to };
        self.connections.push(connection);
        connection
    }

    /// Delete a connection by ID.
    pub(crate) fn remove(&mut self, id: ConnectionId) -> Option<Connection> {
        let index = self.connections.iter().position(|c| c.id == id)?;
        Some(self.connections.remove(index))
    }

    /// Delete every connection touching `pos`, returning them.
    pub(crate) fn remove_touching(&mut self, pos: TilePos) -> Vec<Connection> {
        let (removed, kept) = self.connections.drain(..).partition(|c| c.touches(pos));
        self.connections = kept;
        removed
    }
}

/// Stored form of a [`ConnectionSet`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionDocument {
    connections: Vec<Connection>,
    #[serde(default)]
    next_id: u64,
}

impl From<ConnectionDocument> for ConnectionSet {
    fn from(doc: ConnectionDocument) -> Self {
        let mut set = Self::from_records(doc.connections);
        // A higher stored counter is kept: IDs of removed links stay retired.
        set.next_id = set.next_id.max(doc.next_id);
        set
    }
}

// ============================================================================
// Validation
// ============================================================================

/// A resolved endpoint of a proposed link.
#[derive(Debug, Clone, Copy)]
struct Endpoint<'a> {
    pos: TilePos,
    device: &'a BuildingType,
    class: DeviceClass,
}

/// Decides whether two placed devices may be linked.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionValidator<'a> {
    catalog: &'a BuildingCatalog,
    rules: &'a GameRules,
}

impl<'a> ConnectionValidator<'a> {
    /// Create a validator over a catalog and rule set.
    #[must_use]
    pub const fn new(catalog: &'a BuildingCatalog, rules: &'a GameRules) -> Self {
        Self { catalog, rules }
    }

    /// Check whether a link between `from` and `to` is legal.
    ///
    /// Checks run in a fixed order and the first failure is reported:
    /// 1. endpoints differ
    /// 2. both tiles hold a placed device
    /// 3. the pair is not already linked
    /// 4. both devices have a device class
    /// 5. neither endpoint is at its link cap
    /// 6. the device classes may be paired
    ///
    /// # Errors
    ///
    /// Returns the [`GameError`] of the first failing check.
    pub fn can_connect(
        &self,
        from: TilePos,
        to: TilePos,
        grid: &Grid,
        connections: &ConnectionSet,
    ) -> Result<()> {
        if from == to {
            return Err(GameError::SelfConnection(from));
        }

        let from_building = placed_building(grid, from)?;
        let to_building = placed_building(grid, to)?;

        if connections.contains_pair(from, to) {
            return Err(GameError::DuplicateConnection { from, to });
        }

        let a = self.endpoint(from, from_building)?;
        let b = self.endpoint(to, to_building)?;

        self.check_capacity(&a, connections)?;
        self.check_capacity(&b, connections)?;

        self.check_pairing(&a, &b, grid, connections)
    }

    /// Same as [`Self::can_connect`], reported as a verdict with a reason.
    #[must_use]
    pub fn verdict(
        &self,
        from: TilePos,
        to: TilePos,
        grid: &Grid,
        connections: &ConnectionSet,
    ) -> ConnectionVerdict {
        self.can_connect(from, to, grid, connections).into()
    }

    /// Effective link cap of a device.
    ///
    /// Hosts are clamped to the rule-wide Host cap whatever the catalog says.
    #[must_use]
    pub fn connection_limit(&self, device: &BuildingType) -> u32 {
        match device.device_class {
            Some(DeviceClass::Host) => device.max_connections.min(self.rules.host_connection_cap),
            _ => device.max_connections,
        }
    }

    /// Number of Host-class devices linked to `pos`.
    #[must_use]
    pub fn host_neighbors(&self, pos: TilePos, grid: &Grid, connections: &ConnectionSet) -> u32 {
        let count = connections
            .connections_of(pos)
            .filter_map(|c| c.other_end(pos))
            .filter(|&other| self.class_at(grid, other) == Some(DeviceClass::Host))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    fn class_at(&self, grid: &Grid, pos: TilePos) -> Option<DeviceClass> {
        let building = grid.get(pos)?.placed_building()?;
        self.catalog.device_class(building)
    }

    fn endpoint(&self, pos: TilePos, building: BuildingTypeId) -> Result<Endpoint<'a>> {
        let device = self
            .catalog
            .get(building)
            .ok_or(GameError::UnknownDeviceClass(pos))?;
        let class = device
            .device_class
            .ok_or(GameError::UnknownDeviceClass(pos))?;
        Ok(Endpoint { pos, device, class })
    }

    fn check_capacity(&self, endpoint: &Endpoint<'_>, connections: &ConnectionSet) -> Result<()> {
        let limit = self.connection_limit(endpoint.device);
        if connections.degree(endpoint.pos) >= limit {
            return Err(GameError::CapacityExceeded {
                device: endpoint.device.name.clone(),
                limit,
            });
        }
        Ok(())
    }

    /// Device-class compatibility, evaluated as ordered guards.
    ///
    /// A Switch-Host pair matches the Host guard first; the fan-out limit is
    /// layered on top of the Host's own cap (already enforced by
    /// [`Self::check_capacity`]), whichever side initiated the link.
    fn check_pairing(
        &self,
        a: &Endpoint<'_>,
        b: &Endpoint<'_>,
        grid: &Grid,
        connections: &ConnectionSet,
    ) -> Result<()> {
        use DeviceClass::{Firewall, Host, Router, Switch};

        // Host on either side.
        let host_pair = match (a.class, b.class) {
            (Host, _) => Some(b),
            (_, Host) => Some(a),
            _ => None,
        };
        if let Some(other) = host_pair {
            return match other.class {
                Host | Router => Ok(()),
                Switch => self.check_switch_host_fanout(other, grid, connections),
                Firewall => Err(incompatible(a, b)),
            };
        }

        match (a.class, b.class) {
            (Switch, Router) | (Router, Switch) => Ok(()),
            (Router, _) | (_, Router) => Ok(()),
            (Switch, Switch) => Ok(()),
            _ => Err(incompatible(a, b)),
        }
    }

    fn check_switch_host_fanout(
        &self,
        switch: &Endpoint<'_>,
        grid: &Grid,
        connections: &ConnectionSet,
    ) -> Result<()> {
        let limit = self.rules.switch_host_fanout;
        if self.host_neighbors(switch.pos, grid, connections) >= limit {
            return Err(GameError::SwitchHostFanoutExceeded {
                device: switch.device.name.clone(),
                limit,
            });
        }
        Ok(())
    }
}

fn placed_building(grid: &Grid, pos: TilePos) -> Result<BuildingTypeId> {
    grid.tile(pos)?
        .placed_building()
        .ok_or(GameError::DeviceNotPlaced(pos))
}

fn incompatible(a: &Endpoint<'_>, b: &Endpoint<'_>) -> GameError {
    GameError::IncompatiblePair {
        from: a.device.name.clone(),
        to: b.device.name.clone(),
    }
}

/// Outcome of a connection check in wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionVerdict {
    /// Whether the link is legal.
    pub valid: bool,
    /// Rejection message, if any.
    pub reason: Option<String>,
    /// Rejection kind, if any.
    pub kind: Option<ErrorKind>,
}

impl From<Result<()>> for ConnectionVerdict {
    fn from(result: Result<()>) -> Self {
        match result {
            Ok(()) => Self {
                valid: true,
                reason: None,
                kind: None,
            },
            Err(err) => Self {
                valid: false,
                reason: Some(err.to_string()),
                kind: Some(err.kind()),
            },
        }
    }
}

// ============================================================================
// Snapshot
// ============================================================================

/// A placed device as shown in the network snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    /// Tile holding the device.
    pub position: TilePos,
    /// Building type.
    pub building_id: BuildingTypeId,
    /// Display name.
    pub name: String,
    /// Current link count.
    pub connections: u32,
    /// Attached firewall, if any.
    pub firewall_kind: Option<FirewallKind>,
}

/// Categorized listing of a player's network.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NetworkSnapshot {
    /// Host-class devices.
    pub hosts: Vec<DeviceInfo>,
    /// Switch-class devices.
    pub switches: Vec<DeviceInfo>,
    /// Router-class devices.
    pub routers: Vec<DeviceInfo>,
    /// All links.
    pub connections: Vec<Connection>,
}

/// Build a categorized snapshot of all placed devices and links.
#[must_use]
pub fn network_snapshot(
    grid: &Grid,
    catalog: &BuildingCatalog,
    connections: &ConnectionSet,
) -> NetworkSnapshot {
    let mut snapshot = NetworkSnapshot {
        connections: connections.iter().copied().collect(),
        ..NetworkSnapshot::default()
    };

    for tile in grid.placed() {
        let Some(device) = tile.building_id.and_then(|id| catalog.get(id)) else {
            continue;
        };
        let info = DeviceInfo {
            position: tile.pos(),
            building_id: device.id,
            name: device.name.clone(),
            connections: connections.degree(tile.pos()),
            firewall_kind: tile.firewall_kind,
        };
        match device.device_class {
            Some(DeviceClass::Host) => snapshot.hosts.push(info),
            Some(DeviceClass::Switch) => snapshot.switches.push(info),
            Some(DeviceClass::Router) => snapshot.routers.push(info),
            Some(DeviceClass::Firewall) | None => {}
        }
    }

    snapshot
}

// ============================================================================
// Tests
// ============================================================================
