//! Land grid and tile state machine.
//!
//! Each player owns a square grid of tiles. A tile moves through
//! `Locked -> Developed -> Placed`, and back to `Developed` when its
//! building is removed. No other transitions are legal.
//!
//! The 3x3 castle block at the origin is permanently `Developed` with the
//! reserved castle building. The override is applied whenever a grid is
//! built from stored records, so corrupted or missing entries can never
//! unseat the castle.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{BuildingTypeId, FirewallKind, CASTLE_ID};
use crate::error::{GameError, Result};
use crate::rules::GameRules;

// ============================================================================
// Positions
// ============================================================================

/// Grid coordinate of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TilePos {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
}

impl TilePos {
    /// Create a new tile position.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Document key for this position, `"{x}_{y}"`.
    #[must_use]
    pub fn key(self) -> String {
        format!("{}_{}", self.x, self.y)
    }

    /// Parse a `"{x}_{y}"` document key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        let (x, y) = key.split_once('_')?;
        Some(Self::new(x.parse().ok()?, y.parse().ok()?))
    }
}

impl fmt::Display for TilePos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ============================================================================
// Tile
// ============================================================================

/// Lifecycle state of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileStatus {
    /// Not yet purchased.
    Locked,
    /// Purchased and free for building.
    Developed,
    /// Holds a building.
    Placed,
}

impl Default for TileStatus {
    fn default() -> Self {
        Self::Locked
    }
}

impl fmt::Display for TileStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Locked => "locked",
            Self::Developed => "developed",
            Self::Placed => "placed",
        };
        f.write_str(name)
    }
}

/// Terrain type of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileKind {
    /// Ordinary land.
    Land,
    /// Part of the castle block.
    Castle,
}

/// A state-changing action on a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileAction {
    /// `Locked -> Developed`.
    Unlock,
    /// `Developed -> Placed`.
    Place,
    /// `Placed -> Developed`.
    Remove,
}

impl TileAction {
    /// Status a tile must have for this action to apply.
    #[must_use]
    pub const fn required_status(self) -> TileStatus {
        match self {
            Self::Unlock => TileStatus::Locked,
            Self::Place => TileStatus::Developed,
            Self::Remove => TileStatus::Placed,
        }
    }

    /// Status the tile has after this action.
    #[must_use]
    pub const fn resulting_status(self) -> TileStatus {
        match self {
            Self::Unlock | Self::Remove => TileStatus::Developed,
            Self::Place => TileStatus::Placed,
        }
    }
}

impl fmt::Display for TileAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Unlock => "unlock",
            Self::Place => "place a building on",
            Self::Remove => "remove the building from",
        };
        f.write_str(text)
    }
}

/// One cell of the land grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tile {
    /// Column.
    pub x: u32,
    /// Row.
    pub y: u32,
    /// Terrain type.
    #[serde(rename = "type")]
    pub kind: TileKind,
    /// Lifecycle state.
    pub status: TileStatus,
    /// Resident building, present exactly when `status` is `Placed` (or castle).
    pub building_id: Option<BuildingTypeId>,
    /// Attached firewall, if any.
    pub firewall_kind: Option<FirewallKind>,
}

impl Tile {
    /// A fresh locked land tile.
    #[must_use]
    pub const fn locked(pos: TilePos) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            kind: TileKind::Land,
            status: TileStatus::Locked,
            building_id: None,
            firewall_kind: None,
        }
    }

    /// A castle tile.
    #[must_use]
    pub const fn castle(pos: TilePos) -> Self {
        Self {
            x: pos.x,
            y: pos.y,
            kind: TileKind::Castle,
            status: TileStatus::Developed,
            building_id: Some(CASTLE_ID),
            firewall_kind: None,
        }
    }

    /// Position of this tile.
    #[must_use]
    pub const fn pos(&self) -> TilePos {
        TilePos::new(self.x, self.y)
    }

    /// Placed building, if the tile holds one.
    #[must_use]
    pub fn placed_building(&self) -> Option<BuildingTypeId> {
        match self.status {
            TileStatus::Placed => self.building_id,
            TileStatus::Locked | TileStatus::Developed => None,
        }
    }
}

/// Row-major 2D tile array, `map[y][x]`.
pub type MapView = Vec<Vec<Tile>>;

// ============================================================================
// Grid
// ============================================================================

/// A player's land grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "GridDocument", into = "GridDocument")]
pub struct Grid {
    /// Side length in tiles.
    size: u32,
    /// Side length of the castle block.
    castle_extent: u32,
    /// Tiles in row-major order.
    tiles: Vec<Tile>,
}

impl Grid {
    /// Create a new grid: all tiles locked except the castle block.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    #[must_use]
    pub fn new(size: u32, castle_extent: u32) -> Self {
        assert!(size > 0, "Grid size must be positive");
        Self::from_tiles(size, castle_extent, std::iter::empty())
    }

    /// Create a new grid sized by the given rules.
    #[must_use]
    pub fn from_rules(rules: &GameRules) -> Self {
        Self::new(rules.grid_size, rules.castle_extent)
    }

    /// Rebuild a grid from stored tiles.
    ///
    /// Out-of-bounds tiles are ignored, missing tiles come back locked, the
    /// castle block is forced to `Developed`/castle, and inconsistent
    /// building references are normalized.
    #[must_use]
    pub fn from_tiles(
        size: u32,
        castle_extent: u32,
        stored: impl IntoIterator<Item = Tile>,
    ) -> Self {
        let mut grid = Self {
            size,
            castle_extent,
            tiles: Vec::with_capacity((size as usize) * (size as usize)),
        };
        for y in 0..size {
            for x in 0..size {
                grid.tiles.push(Tile::locked(TilePos::new(x, y)));
            }
        }

        for tile in stored {
            let pos = tile.pos();
            if let Some(index) = grid.index(pos) {
                grid.tiles[index] = tile;
            }
        }

        // At most one WAF survives across the castle block, the first in row-major order.
        let mut waf_kept = false;
        for index in 0..grid.tiles.len() {
            let pos = grid.tiles[index].pos();
            let stored = &grid.tiles[index];
            let repaired = if grid.is_castle(pos) {
                let mut castle = Tile::castle(pos);
                if !waf_kept && stored.firewall_kind == Some(FirewallKind::WebApplication) {
                    castle.firewall_kind = stored.firewall_kind;
                    waf_kept = true;
                }
                castle
            } else {
                normalize_land(stored)
            };
            grid.tiles[index] = repaired;
        }

        grid
    }

    /// Grid side length in tiles.
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.size
    }

    /// Castle block side length in tiles.
    #[must_use]
    pub const fn castle_extent(&self) -> u32 {
        self.castle_extent
    }

    /// Convert a position to a tile index.
    #[inline]
    fn index(&self, pos: TilePos) -> Option<usize> {
        self.in_bounds(pos)
            .then(|| (pos.y as usize) * (self.size as usize) + (pos.x as usize))
    }

    /// Check if a position lies within the grid.
    #[must_use]
    pub fn in_bounds(&self, pos: TilePos) -> bool {
        pos.x < self.size && pos.y < self.size
    }

    /// Check if a position lies inside the castle block.
    #[must_use]
    pub fn is_castle(&self, pos: TilePos) -> bool {
        pos.x < self.castle_extent && pos.y < self.castle_extent
    }

    /// Check if a position lies on the outer border of the grid.
    #[must_use]
    pub fn is_edge(&self, pos: TilePos) -> bool {
        let last = self.size - 1;
        pos.x == 0 || pos.y == 0 || pos.x == last || pos.y == last
    }

    /// Get the tile at a position, or `None` if out of bounds.
    #[must_use]
    pub fn get(&self, pos: TilePos) -> Option<&Tile> {
        self.index(pos).map(|i| &self.tiles[i])
    }

    /// Get the tile at a position.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::TileNotFound`] if out of bounds.
    pub fn tile(&self, pos: TilePos) -> Result<&Tile> {
        self.get(pos).ok_or(GameError::TileNotFound(pos))
    }

    fn tile_mut(&mut self, pos: TilePos) -> Result<&mut Tile> {
        let index = self.index(pos).ok_or(GameError::TileNotFound(pos))?;
        Ok(&mut self.tiles[index])
    }

    /// All tiles in row-major order.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter()
    }

    /// All tiles holding a placed building.
    pub fn placed(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.iter().filter(|t| t.status == TileStatus::Placed)
    }

    /// Count tiles in one status.
    #[must_use]
    pub fn count_status(&self, status: TileStatus) -> usize {
        self.tiles.iter().filter(|t| t.status == status).count()
    }

    /// Grid as a 2D array, `map[y][x]`.
    #[must_use]
    pub fn rows(&self) -> MapView {
        self.tiles
            .chunks(self.size as usize)
            .map(<[Tile]>::to_vec)
            .collect()
    }

    /// Tiles keyed by their document key.
    #[must_use]
    pub fn to_records(&self) -> BTreeMap<String, Tile> {
        self.tiles.iter().map(|t| (t.pos().key(), t.clone())).collect()
    }

    // ------------------------------------------------------------------------
    // State machine
    // ------------------------------------------------------------------------

    /// Check whether an action is legal on a tile, without applying it.
    ///
    /// # Errors
    ///
    /// - [`GameError::TileNotFound`] if out of bounds
    /// - [`GameError::ProtectedZone`] inside the castle block
    /// - [`GameError::InvalidTransition`] if the tile has the wrong status
    pub fn check(&self, pos: TilePos, action: TileAction) -> Result<()> {
        let tile = self.tile(pos)?;
        if self.is_castle(pos) {
            return Err(GameError::ProtectedZone(pos));
        }
        if tile.status != action.required_status() {
            return Err(GameError::InvalidTransition {
                pos,
                status: tile.status,
                action,
            });
        }
        Ok(())
    }

    /// `Locked -> Developed`.
    ///
    /// # Errors
    ///
    /// See [`Grid::check`].
    pub fn unlock(&mut self, pos: TilePos) -> Result<()> {
        self.check(pos, TileAction::Unlock)?;
        let tile = self.tile_mut(pos)?;
        tile.status = TileAction::Unlock.resulting_status();
        Ok(())
    }

    /// `Developed -> Placed`, recording the resident building.
    ///
    /// # Errors
    ///
    /// See [`Grid::check`].
    pub fn place(&mut self, pos: TilePos, building: BuildingTypeId) -> Result<()> {
        self.check(pos, TileAction::Place)?;
        let tile = self.tile_mut(pos)?;
        tile.status = TileAction::Place.resulting_status();
        tile.building_id = Some(building);
        Ok(())
    }

    /// `Placed -> Developed`, clearing the building and any firewall.
    ///
    /// Returns the tile as it was before removal.
    ///
    /// # Errors
    ///
    /// See [`Grid::check`].
    pub fn remove(&mut self, pos: TilePos) -> Result<Tile> {
        self.check(pos, TileAction::Remove)?;
        let tile = self.tile_mut(pos)?;
        let before = tile.clone();
        tile.status = TileAction::Remove.resulting_status();
        tile.building_id = None;
        tile.firewall_kind = None;
        Ok(before)
    }

    /// Record a firewall attachment. Eligibility is checked by the caller.
    pub(crate) fn attach_firewall(&mut self, pos: TilePos, kind: FirewallKind) -> Result<()> {
        self.tile_mut(pos)?.firewall_kind = Some(kind);
        Ok(())
    }
}

/// Bring a stored land tile back in line with the state machine.
fn normalize_land(stored: &Tile) -> Tile {
    let mut tile = stored.clone();
    tile.kind = TileKind::Land;
    match tile.status {
        TileStatus::Placed if tile.building_id.is_none() => {
            tile.status = TileStatus::Developed;
            tile.firewall_kind = None;
        }
        TileStatus::Placed => {}
        TileStatus::Locked | TileStatus::Developed => {
            tile.building_id = None;
            tile.firewall_kind = None;
        }
    }
    tile
}

/// Stored form of a grid: tiles keyed by `"{x}_{y}"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GridDocument {
    size: u32,
    castle_extent: u32,
    tiles: BTreeMap<String, Tile>,
}

impl From<GridDocument> for Grid {
    fn from(doc: GridDocument) -> Self {
        let size = doc.size.max(1);
        let tiles = doc.tiles.into_iter().filter_map(|(key, mut tile)| {
            let pos = TilePos::from_key(&key)?;
            tile.x = pos.x;
            tile.y = pos.y;
            Some(tile)
        });
        Grid::from_tiles(size, doc.castle_extent, tiles)
    }
}

impl From<Grid> for GridDocument {
    fn from(grid: Grid) -> Self {
        Self {
            size: grid.size,
            castle_extent: grid.castle_extent,
            tiles: grid.to_records(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
