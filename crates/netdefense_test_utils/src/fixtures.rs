//! Test fixtures and helpers.
//!
//! Pre-built players and scripted actions for consistent testing.

use netdefense_core::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Built-in Host: Workstation.
pub const WORKSTATION: BuildingTypeId = BuildingTypeId(1);
/// Built-in Host: Web Server.
pub const WEB_SERVER: BuildingTypeId = BuildingTypeId(2);
/// Built-in Switch.
pub const SWITCH: BuildingTypeId = BuildingTypeId(3);
/// Built-in Router.
pub const ROUTER: BuildingTypeId = BuildingTypeId(4);
/// Built-in Host Firewall.
pub const HOST_FIREWALL: BuildingTypeId = BuildingTypeId(101);
/// Built-in Network Firewall.
pub const NETWORK_FIREWALL: BuildingTypeId = BuildingTypeId(102);
/// Built-in Web Application Firewall.
pub const WEB_APP_FIREWALL: BuildingTypeId = BuildingTypeId(103);

/// Shorthand for a tile position.
#[must_use]
pub const fn pos(x: u32, y: u32) -> TilePos {
    TilePos::new(x, y)
}

/// Deterministic RNG for incident draws.
#[must_use]
pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Engine over the built-in catalog and default rules.
#[must_use]
pub fn engine() -> GameEngine {
    GameEngine::default()
}

/// A new player with `currency` to spend.
#[must_use]
pub fn player_with_currency(engine: &GameEngine, currency: u32) -> PlayerState {
    let mut state = engine.new_player();
    state.profile.currency = currency;
    state
}

/// A player with the given tiles unlocked and nothing placed.
///
/// Currency is left at the starting balance; unlock costs are not charged.
///
/// # Panics
///
/// Panics if any tile cannot be unlocked.
#[must_use]
pub fn player_with_land(engine: &GameEngine, tiles: &[TilePos]) -> PlayerState {
    let mut state = engine.new_player();
    for &tile in tiles {
        state
            .grid
            .unlock(tile)
            .unwrap_or_else(|e| panic!("fixture unlock {tile} failed: {e}"));
    }
    state
}

/// A player with devices placed on freshly unlocked tiles.
///
/// Placement goes through the engine; the player is given enough currency
/// first, and the balance is reset to the starting amount afterwards.
///
/// # Panics
///
/// Panics if any placement is rejected.
#[must_use]
pub fn player_with_devices(
    engine: &GameEngine,
    devices: &[(TilePos, BuildingTypeId)],
) -> PlayerState {
    let tiles: Vec<_> = devices.iter().map(|&(p, _)| p).collect();
    let mut state = player_with_land(engine, &tiles);
    state.profile.currency = u32::MAX;
    for &(p, id) in devices {
        engine
            .place_building(&mut state, id, p)
            .unwrap_or_else(|e| panic!("fixture place {id} at {p} failed: {e}"));
    }
    state.profile.currency = engine.rules().starting_currency;
    state
}

/// A Switch at (6, 6) with `hosts` Workstations linked to it along row 10.
///
/// # Panics
///
/// Panics if `hosts` exceeds the Switch's capacity.
#[must_use]
pub fn switch_with_hosts(engine: &GameEngine, hosts: u32) -> PlayerState {
    let mut devices = vec![(pos(6, 6), SWITCH)];
    devices.extend((0..hosts).map(|i| (pos(5 + i, 10), WORKSTATION)));
    let mut state = player_with_devices(engine, &devices);
    for i in 0..hosts {
        engine
            .add_connection(&mut state, pos(5 + i, 10), pos(6, 6))
            .unwrap_or_else(|e| panic!("fixture link {i} failed: {e}"));
    }
    state
}

/// One scripted player request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerAction {
    /// Unlock a tile.
    Unlock(TilePos),
    /// Place a building type on a tile.
    Place(BuildingTypeId, TilePos),
    /// Attach a firewall type to a tile.
    Firewall(BuildingTypeId, TilePos),
    /// Remove the building on a tile.
    Remove(TilePos),
    /// Link two tiles.
    Connect(TilePos, TilePos),
    /// Delete the n-th existing link, modulo the link count.
    Disconnect(usize),
    /// Deliver a reward event.
    Reward(RewardEvent),
}

impl PlayerAction {
    /// Apply this action through the engine.
    ///
    /// # Errors
    ///
    /// Returns the engine's rejection, if any.
    pub fn apply(
        &self,
        engine: &GameEngine,
        state: &mut PlayerState,
        rng: &mut StdRng,
        now_ms: u64,
    ) -> Result<()> {
        match self {
            Self::Unlock(p) => engine.unlock_tile(state, *p, rng, now_ms).map(|_| ()),
            Self::Place(id, p) => engine.place_building(state, *id, *p).map(|_| ()),
            Self::Firewall(id, p) => engine.place_firewall(state, *id, *p).map(|_| ()),
            Self::Remove(p) => engine.remove_building(state, *p).map(|_| ()),
            Self::Connect(a, b) => engine.add_connection(state, *a, *b).map(|_| ()),
            Self::Disconnect(n) => {
                let len = state.connections.len();
                if len == 0 {
                    return Ok(());
                }
                let id = state.connections.iter().nth(n % len).map(|c| c.id);
                match id {
                    Some(id) => engine.remove_connection(state, id).map(|_| ()),
                    None => Ok(()),
                }
            }
            Self::Reward(event) => {
                engine.apply_reward(state, event);
                Ok(())
            }
        }
    }
}

/// Apply a script of actions, ignoring rejections.
///
/// Returns the number of actions that were accepted.
pub fn run_script(
    engine: &GameEngine,
    state: &mut PlayerState,
    actions: &[PlayerAction],
    seed: u64,
) -> usize {
    let mut rng = seeded_rng(seed);
    let mut accepted = 0;
    for (now_ms, action) in (0u64..).zip(actions) {
        if action.apply(engine, state, &mut rng, now_ms).is_ok() {
            accepted += 1;
        }
    }
    accepted
}
