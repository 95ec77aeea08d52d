//! Error types for game rule validation.
//!
//! Every rejection is recoverable: it is returned to the caller as a
//! tagged failure and the player's state is left untouched.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{BuildingTypeId, FirewallKind};
use crate::grid::{TileAction, TilePos, TileStatus};
use crate::topology::ConnectionId;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all game rule errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GameError {
    /// Tile is not in the state the action requires.
    #[error("Cannot {action} tile {pos}: tile is {status}")]
    InvalidTransition {
        /// Target tile.
        pos: TilePos,
        /// Current tile status.
        status: TileStatus,
        /// Attempted action.
        action: TileAction,
    },

    /// Tile lies inside the permanently protected castle block.
    #[error("Tile {0} is part of the castle and cannot be changed")]
    ProtectedZone(TilePos),

    /// Not enough currency.
    #[error("Insufficient funds: need {required}, have {available}")]
    InsufficientFunds {
        /// Amount required.
        required: u32,
        /// Amount available.
        available: u32,
    },

    /// Building type is not in the catalog.
    #[error("Building type {0} not found")]
    BuildingNotFound(BuildingTypeId),

    /// Position lies outside the grid.
    #[error("Tile {0} not found")]
    TileNotFound(TilePos),

    /// Target already carries a firewall.
    #[error("Tile {0} already has a firewall attached")]
    DuplicateFirewall(TilePos),

    /// Both endpoints are the same tile.
    #[error("Cannot connect tile {0} to itself")]
    SelfConnection(TilePos),

    /// Endpoint tile holds no placed device.
    #[error("No device placed at tile {0}")]
    DeviceNotPlaced(TilePos),

    /// The unordered pair is already linked.
    #[error("Tiles {from} and {to} are already connected")]
    DuplicateConnection {
        /// First endpoint.
        from: TilePos,
        /// Second endpoint.
        to: TilePos,
    },

    /// Endpoint's building has no topology class.
    #[error("Device at tile {0} has no known device class")]
    UnknownDeviceClass(TilePos),

    /// Endpoint already holds its maximum number of links.
    #[error("{device} has reached its connection limit ({limit})")]
    CapacityExceeded {
        /// Display name of the saturated device.
        device: String,
        /// Its connection limit.
        limit: u32,
    },

    /// Switch already serves its maximum number of hosts.
    #[error("{device} already serves the maximum of {limit} hosts")]
    SwitchHostFanoutExceeded {
        /// Display name of the switch.
        device: String,
        /// Host fan-out limit.
        limit: u32,
    },

    /// Device classes may not be linked to each other.
    #[error("{from} cannot be connected to {to}")]
    IncompatiblePair {
        /// Display name of the first device.
        from: String,
        /// Display name of the second device.
        to: String,
    },

    /// Building type cannot occupy a tile (firewalls, the castle).
    #[error("{0} cannot be placed as a building")]
    NotPlaceable(String),

    /// Building type is not a firewall.
    #[error("{0} is not a firewall")]
    NotAFirewall(String),

    /// Firewall target does not satisfy the kind's eligibility rule.
    #[error("{kind} cannot be attached here: {reason}")]
    FirewallTargetMismatch {
        /// Firewall kind being attached.
        kind: FirewallKind,
        /// Why the target is ineligible.
        reason: String,
    },

    /// No connection with this ID.
    #[error("Connection {0} not found")]
    ConnectionNotFound(ConnectionId),

    /// No incident with this ID.
    #[error("Incident {0} not found")]
    IncidentNotFound(u64),

    /// Not enough of an inventory item.
    #[error("Insufficient items: need {required} {item}, have {available}")]
    InsufficientItems {
        /// Item identifier.
        item: String,
        /// Amount required.
        required: u32,
        /// Amount available.
        available: u32,
    },

    /// Catalog data failed validation.
    #[error("Invalid building catalog: {}", .0.join("; "))]
    InvalidCatalog(Vec<String>),
}

/// Stable tag for each [`GameError`] variant, used on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// See [`GameError::InvalidTransition`].
    InvalidTransition,
    /// See [`GameError::ProtectedZone`].
    ProtectedZone,
    /// See [`GameError::InsufficientFunds`].
    InsufficientFunds,
    /// See [`GameError::BuildingNotFound`].
    BuildingNotFound,
    /// See [`GameError::TileNotFound`].
    TileNotFound,
    /// See [`GameError::DuplicateFirewall`].
    DuplicateFirewall,
    /// See [`GameError::SelfConnection`].
    SelfConnection,
    /// See [`GameError::DeviceNotPlaced`].
    DeviceNotPlaced,
    /// See [`GameError::DuplicateConnection`].
    DuplicateConnection,
    /// See [`GameError::UnknownDeviceClass`].
    UnknownDeviceClass,
    /// See [`GameError::CapacityExceeded`].
    CapacityExceeded,
    /// See [`GameError::SwitchHostFanoutExceeded`].
    SwitchHostFanoutExceeded,
    /// See [`GameError::IncompatiblePair`].
    IncompatiblePair,
    /// See [`GameError::NotPlaceable`].
    NotPlaceable,
    /// See [`GameError::NotAFirewall`].
    NotAFirewall,
    /// See [`GameError::FirewallTargetMismatch`].
    FirewallTargetMismatch,
    /// See [`GameError::ConnectionNotFound`].
    ConnectionNotFound,
    /// See [`GameError::IncidentNotFound`].
    IncidentNotFound,
    /// See [`GameError::InsufficientItems`].
    InsufficientItems,
    /// See [`GameError::InvalidCatalog`].
    InvalidCatalog,
}

impl GameError {
    /// The stable kind tag of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::ProtectedZone(_) => ErrorKind::ProtectedZone,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::BuildingNotFound(_) => ErrorKind::BuildingNotFound,
            Self::TileNotFound(_) => ErrorKind::TileNotFound,
            Self::DuplicateFirewall(_) => ErrorKind::DuplicateFirewall,
            Self::SelfConnection(_) => ErrorKind::SelfConnection,
            Self::DeviceNotPlaced(_) => ErrorKind::DeviceNotPlaced,
            Self::DuplicateConnection { .. } => ErrorKind::DuplicateConnection,
            Self::UnknownDeviceClass(_) => ErrorKind::UnknownDeviceClass,
            Self::CapacityExceeded { .. } => ErrorKind::CapacityExceeded,
            Self::SwitchHostFanoutExceeded { .. } => ErrorKind::SwitchHostFanoutExceeded,
            Self::IncompatiblePair { .. } => ErrorKind::IncompatiblePair,
            Self::NotPlaceable(_) => ErrorKind::NotPlaceable,
            Self::NotAFirewall(_) => ErrorKind::NotAFirewall,
            Self::FirewallTargetMismatch { .. } => ErrorKind::FirewallTargetMismatch,
            Self::ConnectionNotFound(_) => ErrorKind::ConnectionNotFound,
            Self::IncidentNotFound(_) => ErrorKind::IncidentNotFound,
            Self::InsufficientItems { .. } => ErrorKind::InsufficientItems,
            Self::InvalidCatalog(_) => ErrorKind::InvalidCatalog,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(
            GameError::ProtectedZone(TilePos::new(0, 0)).kind(),
            ErrorKind::ProtectedZone
        );
        assert_eq!(
            GameError::CapacityExceeded {
                device: "Workstation".into(),
                limit: 1
            }
            .kind(),
            ErrorKind::CapacityExceeded
        );
    }

    #[test]
    fn test_reason_strings() {
        let err = GameError::InvalidTransition {
            pos: TilePos::new(5, 5),
            status: TileStatus::Locked,
            action: TileAction::Place,
        };
        assert_eq!(err.to_string(), "Cannot place a building on tile (5, 5): tile is locked");

        let err = GameError::IncompatiblePair {
            from: "Workstation".into(),
            to: "Host Firewall".into(),
        };
        assert_eq!(err.to_string(), "Workstation cannot be connected to Host Firewall");
    }
}
