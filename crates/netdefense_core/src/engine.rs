//! Game engine: validated operations on a player's state.
//!
//! Every operation validates fully against the current state and only then
//! applies its change. A returned error means the state was not modified.

use std::sync::Arc;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::catalog::{BuildingCatalog, BuildingTypeId};
use crate::error::{GameError, Result};
use crate::grid::{MapView, TilePos};
use crate::incidents::{IncidentTrigger, SecurityIncident};
use crate::placement::PlacementValidator;
use crate::player::{PlayerState, RewardEvent};
use crate::rules::GameRules;
use crate::topology::{
    network_snapshot, Connection, ConnectionId, ConnectionValidator, ConnectionVerdict,
    NetworkSnapshot,
};

/// Result of unlocking a tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnlockOutcome {
    /// Map after the unlock.
    pub map: MapView,
    /// Incident triggered by the unlock, if any.
    pub triggered_event: Option<SecurityIncident>,
}

/// Result of removing a building.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemovalOutcome {
    /// Map after the removal.
    pub map: MapView,
    /// Connections deleted along with the building.
    pub removed_connections: Vec<Connection>,
}

/// Rule engine shared by all players.
///
/// Holds only immutable configuration; per-player state is passed in.
#[derive(Debug, Clone)]
pub struct GameEngine {
    catalog: Arc<BuildingCatalog>,
    rules: GameRules,
    trigger: IncidentTrigger,
}

impl GameEngine {
    /// Create an engine over a catalog and rule set.
    #[must_use]
    pub fn new(catalog: Arc<BuildingCatalog>, rules: GameRules) -> Self {
        let trigger = IncidentTrigger::from_rules(&rules);
        Self {
            catalog,
            rules,
            trigger,
        }
    }

    /// The building catalog.
    #[must_use]
    pub fn catalog(&self) -> &BuildingCatalog {
        &self.catalog
    }

    /// The rule set.
    #[must_use]
    pub const fn rules(&self) -> &GameRules {
        &self.rules
    }

    /// Fresh state for a new player.
    #[must_use]
    pub fn new_player(&self) -> PlayerState {
        PlayerState::new(&self.rules)
    }

    /// Placement checks bound to this engine's configuration.
    #[must_use]
    pub fn placement(&self) -> PlacementValidator<'_> {
        PlacementValidator::new(&self.catalog, &self.rules)
    }

    /// Connection checks bound to this engine's configuration.
    #[must_use]
    pub fn connections(&self) -> ConnectionValidator<'_> {
        ConnectionValidator::new(&self.catalog, &self.rules)
    }

    // ------------------------------------------------------------------------
    // Land and buildings
    // ------------------------------------------------------------------------

    /// The player's map, `map[y][x]`.
    #[must_use]
    pub fn map_view(&self, state: &PlayerState) -> MapView {
        state.grid.rows()
    }

    /// Unlock a locked tile, paying the unlock cost.
    ///
    /// May trigger a security incident, which is recorded on the state.
    ///
    /// # Errors
    ///
    /// See [`PlacementValidator::check_unlock`].
    pub fn unlock_tile<R: Rng + ?Sized>(
        &self,
        state: &mut PlayerState,
        pos: TilePos,
        rng: &mut R,
        now_ms: u64,
    ) -> Result<UnlockOutcome> {
        let cost = self.placement().check_unlock(state, pos)?;

        state.grid.unlock(pos)?;
        state.profile.spend(cost);
        state.profile.developed_count = state.profile.developed_count.saturating_add(1);

        let triggered_event = self
            .trigger
            .roll(pos, rng, now_ms)
            .map(|incident| state.record_incident(incident));

        info!(
            %pos,
            cost,
            incident = triggered_event.is_some(),
            "Tile unlocked"
        );
        Ok(UnlockOutcome {
            map: self.map_view(state),
            triggered_event,
        })
    }

    /// Place a building on a developed tile.
    ///
    /// # Errors
    ///
    /// See [`PlacementValidator::check_building`].
    pub fn place_building(
        &self,
        state: &mut PlayerState,
        building: BuildingTypeId,
        pos: TilePos,
    ) -> Result<MapView> {
        let entry = self.placement().check_building(state, building, pos)?;

        state.grid.place(pos, building)?;
        state.profile.spend(entry.cost);

        info!(%pos, building = %entry.name, cost = entry.cost, "Building placed");
        Ok(self.map_view(state))
    }

    /// Attach a firewall to a device or the castle.
    ///
    /// # Errors
    ///
    /// See [`PlacementValidator::check_firewall`].
    pub fn place_firewall(
        &self,
        state: &mut PlayerState,
        firewall: BuildingTypeId,
        pos: TilePos,
    ) -> Result<MapView> {
        let plan = self.placement().check_firewall(state, firewall, pos)?;

        state.grid.attach_firewall(pos, plan.kind)?;
        state.profile.spend(plan.firewall.cost);

        info!(%pos, kind = plan.kind.code(), cost = plan.firewall.cost, "Firewall attached");
        Ok(self.map_view(state))
    }

    /// Remove the building at `pos`, along with its firewall and links.
    ///
    /// # Errors
    ///
    /// See [`PlacementValidator::check_removal`].
    pub fn remove_building(&self, state: &mut PlayerState, pos: TilePos) -> Result<RemovalOutcome> {
        self.placement().check_removal(state, pos)?;

        state.grid.remove(pos)?;
        let removed_connections = state.connections.remove_touching(pos);

        info!(%pos, removed_links = removed_connections.len(), "Building removed");
        Ok(RemovalOutcome {
            map: self.map_view(state),
            removed_connections,
        })
    }

    // ------------------------------------------------------------------------
    // Network
    // ------------------------------------------------------------------------

    /// Whether `from` and `to` could be linked right now.
    #[must_use]
    pub fn check_connection(
        &self,
        state: &PlayerState,
        from: TilePos,
        to: TilePos,
    ) -> ConnectionVerdict {
        let verdict = self
            .connections()
            .verdict(from, to, &state.grid, &state.connections);
        debug!(%from, %to, valid = verdict.valid, "Connection checked");
        verdict
    }

    /// Link two placed devices.
    ///
    /// # Errors
    ///
    /// See [`ConnectionValidator::can_connect`].
    pub fn add_connection(
        &self,
        state: &mut PlayerState,
        from: TilePos,
        to: TilePos,
    ) -> Result<Connection> {
        self.connections()
            .can_connect(from, to, &state.grid, &state.connections)?;

        let connection = state.connections.insert(from, to);
        info!(id = %connection.id, %from, %to, "Connection added");
        Ok(connection)
    }

    /// Delete a link.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::ConnectionNotFound`] for an unknown ID.
    pub fn remove_connection(
        &self,
        state: &mut PlayerState,
        id: ConnectionId,
    ) -> Result<Connection> {
        let connection = state
            .connections
            .remove(id)
            .ok_or(GameError::ConnectionNotFound(id))?;
        info!(%id, "Connection removed");
        Ok(connection)
    }

    /// All links touching `pos`.
    #[must_use]
    pub fn connections_of(&self, state: &PlayerState, pos: TilePos) -> Vec<Connection> {
        state.connections.connections_of(pos).copied().collect()
    }

    /// Categorized listing of the player's devices and links.
    #[must_use]
    pub fn network_snapshot(&self, state: &PlayerState) -> NetworkSnapshot {
        network_snapshot(&state.grid, &self.catalog, &state.connections)
    }

    // ------------------------------------------------------------------------
    // Rewards and incidents
    // ------------------------------------------------------------------------

    /// Apply a quiz outcome.
    pub fn apply_reward(&self, state: &mut PlayerState, event: &RewardEvent) {
        let profile = &mut state.profile;
        match event {
            RewardEvent::GrantCurrency { amount } => profile.deposit(*amount),
            RewardEvent::GrantItem { item, count } => state.inventory.add(item, *count),
            RewardEvent::QuizAnswered { correct } => {
                profile.answered_count = profile.answered_count.saturating_add(1);
                if *correct {
                    profile.defense_score = profile.defense_score.saturating_add(1);
                }
            }
        }
        debug!(?event, "Reward applied");
    }

    /// Spend inventory items.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InsufficientItems`] if too few are held.
    pub fn consume_item(&self, state: &mut PlayerState, item: &str, count: u32) -> Result<()> {
        state.inventory.require(item, count)?;
        state.inventory.take(item, count);
        debug!(item, count, "Item consumed");
        Ok(())
    }

    /// Close an open incident.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::IncidentNotFound`] for an unknown ID.
    pub fn dismiss_incident(&self, state: &mut PlayerState, id: u64) -> Result<SecurityIncident> {
        let index = state
            .incidents
            .iter()
            .position(|i| i.id == id)
            .ok_or(GameError::IncidentNotFound(id))?;
        let incident = state.incidents.remove(index);
        info!(id, kind = %incident.kind, "Incident dismissed");
        Ok(incident)
    }
}

impl Default for GameEngine {
    fn default() -> Self {
        Self::new(Arc::new(BuildingCatalog::builtin()), GameRules::default())
    }
}
