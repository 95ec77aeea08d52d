//! # NetDefense Core
//!
//! Deterministic rules for the NetDefense city-building game.
//!
//! This crate contains **only** deterministic logic:
//! - No IO
//! - No system randomness (the incident draw takes an injected RNG)
//! - No wall clock (timestamps are passed in)
//! - No floating-point math in rule evaluation (uses fixed-point)
//!
//! The HTTP layer in `netdefense_server` loads a player's state, calls one
//! [`engine::GameEngine`] operation, and writes the state back.
//!
//! ## Crate Structure
//!
//! - [`grid`] - Tile grid and land state machine
//! - [`catalog`] - Building types and device classes
//! - [`placement`] - Building, firewall and unlock validation
//! - [`topology`] - Connections and the connection validator
//! - [`incidents`] - Security incidents triggered by unlocking
//! - [`player`] - Per-player aggregate and reward events
//! - [`engine`] - Validated operations on player state
//! - [`data`] - RON data file structures

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod catalog;
pub mod data;
pub mod engine;
pub mod error;
pub mod grid;
pub mod incidents;
pub mod math;
pub mod placement;
pub mod player;
pub mod rules;
pub mod topology;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::catalog::{
        BuildingCatalog, BuildingType, BuildingTypeId, DeviceClass, FirewallKind, CASTLE_ID,
    };
    pub use crate::data::CatalogData;
    pub use crate::engine::{GameEngine, RemovalOutcome, UnlockOutcome};
    pub use crate::error::{ErrorKind, GameError, Result};
    pub use crate::grid::{Grid, MapView, Tile, TileKind, TilePos, TileStatus};
    pub use crate::incidents::{IncidentKind, IncidentTrigger, SecurityIncident};
    pub use crate::math::Fixed;
    pub use crate::player::{Inventory, PlayerProfile, PlayerState, RewardEvent};
    pub use crate::rules::GameRules;
    pub use crate::topology::{
        Connection, ConnectionId, ConnectionSet, ConnectionValidator, ConnectionVerdict,
        NetworkSnapshot,
    };
}
