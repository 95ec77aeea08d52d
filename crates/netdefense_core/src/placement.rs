//! Placement validation for buildings, firewalls and land.
//!
//! Each check inspects a player's state without touching it and reports
//! the first rule broken. The engine applies a change only after its check
//! passes, so a rejected request never leaves partial state behind.

use crate::catalog::{BuildingCatalog, BuildingType, BuildingTypeId, FirewallKind};
use crate::error::{GameError, Result};
use crate::grid::{TileAction, TilePos};
use crate::player::PlayerState;
use crate::rules::GameRules;

/// A firewall attachment that passed validation.
#[derive(Debug, Clone, Copy)]
pub struct FirewallPlan<'a> {
    /// Catalog entry of the firewall.
    pub firewall: &'a BuildingType,
    /// Its kind.
    pub kind: FirewallKind,
}

/// Validates placement requests against the catalog and rules.
#[derive(Debug, Clone, Copy)]
pub struct PlacementValidator<'a> {
    catalog: &'a BuildingCatalog,
    rules: &'a GameRules,
}

impl<'a> PlacementValidator<'a> {
    /// Create a validator.
    #[must_use]
    pub const fn new(catalog: &'a BuildingCatalog, rules: &'a GameRules) -> Self {
        Self { catalog, rules }
    }

    fn lookup(&self, id: BuildingTypeId) -> Result<&'a BuildingType> {
        self.catalog.get(id).ok_or(GameError::BuildingNotFound(id))
    }

    /// Check that `building` may be placed at `pos`.
    ///
    /// # Errors
    ///
    /// In order: [`GameError::BuildingNotFound`], [`GameError::NotPlaceable`],
    /// [`GameError::TileNotFound`], [`GameError::ProtectedZone`],
    /// [`GameError::InvalidTransition`], [`GameError::InsufficientFunds`].
    pub fn check_building(
        &self,
        state: &PlayerState,
        building: BuildingTypeId,
        pos: TilePos,
    ) -> Result<&'a BuildingType> {
        let entry = self.lookup(building)?;
        if entry.is_firewall() || entry.device_class.is_none() {
            return Err(GameError::NotPlaceable(entry.name.clone()));
        }
        state.grid.check(pos, TileAction::Place)?;
        state.profile.require(entry.cost)?;
        Ok(entry)
    }

    /// Check that firewall type `firewall` may be attached at `pos`.
    ///
    /// HF needs a placed Host, NWF a placed Router, and WAF a castle tile.
    /// A tile holds at most one firewall of any kind, and the castle block
    /// holds at most one WAF in total.
    ///
    /// # Errors
    ///
    /// In order: [`GameError::BuildingNotFound`], [`GameError::NotAFirewall`],
    /// [`GameError::TileNotFound`], [`GameError::DuplicateFirewall`],
    /// [`GameError::FirewallTargetMismatch`], [`GameError::InsufficientFunds`].
    pub fn check_firewall(
        &self,
        state: &PlayerState,
        firewall: BuildingTypeId,
        pos: TilePos,
    ) -> Result<FirewallPlan<'a>> {
        let entry = self.lookup(firewall)?;
        let kind = match (entry.is_firewall(), entry.firewall_kind) {
            (true, Some(kind)) => kind,
            _ => return Err(GameError::NotAFirewall(entry.name.clone())),
        };

        let grid = &state.grid;
        let tile = grid.tile(pos)?;
        if tile.firewall_kind.is_some() {
            return Err(GameError::DuplicateFirewall(pos));
        }
        if kind == FirewallKind::WebApplication {
            let existing = grid
                .tiles()
                .find(|t| grid.is_castle(t.pos()) && t.firewall_kind.is_some());
            if let Some(existing) = existing {
                return Err(GameError::DuplicateFirewall(existing.pos()));
            }
        }

        self.check_target(state, kind, pos)?;
        state.profile.require(entry.cost)?;
        Ok(FirewallPlan {
            firewall: entry,
            kind,
        })
    }

    fn check_target(&self, state: &PlayerState, kind: FirewallKind, pos: TilePos) -> Result<()> {
        let mismatch = |reason: String| GameError::FirewallTargetMismatch { kind, reason };

        let Some(target_class) = kind.target_class() else {
            return if state.grid.is_castle(pos) {
                Ok(())
            } else {
                Err(mismatch(format!("tile {pos} is not part of the castle")))
            };
        };

        let building = state
            .grid
            .tile(pos)?
            .placed_building()
            .ok_or_else(|| mismatch(format!("no device placed at tile {pos}")))?;
        match self.catalog.device_class(building) {
            Some(class) if class == target_class => Ok(()),
            Some(class) => Err(mismatch(format!("needs a {target_class}, found a {class}"))),
            None => Err(mismatch(format!("needs a {target_class}"))),
        }
    }

    /// Check that the building at `pos` may be removed.
    ///
    /// # Errors
    ///
    /// See [`crate::grid::Grid::check`].
    pub fn check_removal(&self, state: &PlayerState, pos: TilePos) -> Result<()> {
        state.grid.check(pos, TileAction::Remove)
    }

    /// Check that `pos` may be unlocked and return the unlock cost.
    ///
    /// # Errors
    ///
    /// See [`crate::grid::Grid::check`], then [`GameError::InsufficientFunds`].
    pub fn check_unlock(&self, state: &PlayerState, pos: TilePos) -> Result<u32> {
        state.grid.check(pos, TileAction::Unlock)?;
        state.profile.require(self.rules.unlock_cost)?;
        Ok(self.rules.unlock_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const PC: BuildingTypeId = BuildingTypeId(1);
    const SWITCH: BuildingTypeId = BuildingTypeId(3);
    const ROUTER: BuildingTypeId = BuildingTypeId(4);
    const HF: BuildingTypeId = BuildingTypeId(101);
    const NWF: BuildingTypeId = BuildingTypeId(102);
    const WAF: BuildingTypeId = BuildingTypeId(103);

    fn pos(x: u32, y: u32) -> TilePos {
        TilePos::new(x, y)
    }

    fn state_with(devices: &[(TilePos, BuildingTypeId)]) -> PlayerState {
        let mut state = PlayerState::new(&GameRules::default());
        for &(p, id) in devices {
            state.grid.unlock(p).unwrap();
            state.grid.place(p, id).unwrap();
        }
        state
    }

    fn check<T>(
        f: impl FnOnce(&PlacementValidator<'_>) -> Result<T>,
    ) -> std::result::Result<T, ErrorKind> {
        let catalog = BuildingCatalog::builtin();
        let rules = GameRules::default();
        let v = PlacementValidator::new(&catalog, &rules);
        f(&v).map_err(|e| e.kind())
    }

    #[test]
    fn test_building_check_order() {
        let mut state = state_with(&[]);
        state.grid.unlock(pos(5, 5)).unwrap();

        let err = check(|v| v.check_building(&state, BuildingTypeId(77), pos(5, 5)).map(|_| ()));
        assert_eq!(err, Err(ErrorKind::BuildingNotFound));

        let err = check(|v| v.check_building(&state, HF, pos(5, 5)).map(|_| ()));
        assert_eq!(err, Err(ErrorKind::NotPlaceable));

        let err = check(|v| v.check_building(&state, PC, pos(25, 5)).map(|_| ()));
        assert_eq!(err, Err(ErrorKind::TileNotFound));

        let err = check(|v| v.check_building(&state, PC, pos(1, 1)).map(|_| ()));
        assert_eq!(err, Err(ErrorKind::ProtectedZone));

        let err = check(|v| v.check_building(&state, PC, pos(6, 6)).map(|_| ()));
        assert_eq!(err, Err(ErrorKind::InvalidTransition));

        state.profile.currency = 10;
        let err = check(|v| v.check_building(&state, PC, pos(5, 5)).map(|_| ()));
        assert_eq!(err, Err(ErrorKind::InsufficientFunds));
    }

    #[test]
    fn test_castle_type_not_placeable() {
        let mut state = state_with(&[]);
        state.grid.unlock(pos(5, 5)).unwrap();
        let err = check(|v| {
            v.check_building(&state, crate::catalog::CASTLE_ID, pos(5, 5))
                .map(|_| ())
        });
        assert_eq!(err, Err(ErrorKind::NotPlaceable));
    }

    #[test]
    fn test_firewall_targets() {
        let state = state_with(&[(pos(5, 5), PC), (pos(6, 6), SWITCH), (pos(7, 7), ROUTER)]);

        assert!(check(|v| v.check_firewall(&state, HF, pos(5, 5)).map(|_| ())).is_ok());
        assert!(check(|v| v.check_firewall(&state, NWF, pos(7, 7)).map(|_| ())).is_ok());
        assert!(check(|v| v.check_firewall(&state, WAF, pos(0, 2)).map(|_| ())).is_ok());

        // NWF is Router-only, even on a Switch.
        let err = check(|v| v.check_firewall(&state, NWF, pos(6, 6)).map(|_| ()));
        assert_eq!(err, Err(ErrorKind::FirewallTargetMismatch));
        let err = check(|v| v.check_firewall(&state, HF, pos(7, 7)).map(|_| ()));
        assert_eq!(err, Err(ErrorKind::FirewallTargetMismatch));
        let err = check(|v| v.check_firewall(&state, WAF, pos(5, 5)).map(|_| ()));
        assert_eq!(err, Err(ErrorKind::FirewallTargetMismatch));
        let err = check(|v| v.check_firewall(&state, HF, pos(8, 8)).map(|_| ()));
        assert_eq!(err, Err(ErrorKind::FirewallTargetMismatch));
        let err = check(|v| v.check_firewall(&state, HF, pos(1, 1)).map(|_| ()));
        assert_eq!(err, Err(ErrorKind::FirewallTargetMismatch));
    }

    #[test]
    fn test_not_a_firewall() {
        let state = state_with(&[(pos(5, 5), PC)]);
        let err = check(|v| v.check_firewall(&state, SWITCH, pos(5, 5)).map(|_| ()));
        assert_eq!(err, Err(ErrorKind::NotAFirewall));
    }

    #[test]
    fn test_duplicate_firewall_on_tile() {
        let mut state = state_with(&[(pos(5, 5), PC)]);
        state.grid.attach_firewall(pos(5, 5), FirewallKind::Host).unwrap();
        let err = check(|v| v.check_firewall(&state, HF, pos(5, 5)).map(|_| ()));
        assert_eq!(err, Err(ErrorKind::DuplicateFirewall));
    }

    #[test]
    fn test_waf_singleton_across_castle() {
        let mut state = state_with(&[]);
        state
            .grid
            .attach_firewall(pos(0, 0), FirewallKind::WebApplication)
            .unwrap();
        let catalog = BuildingCatalog::builtin();
        let rules = GameRules::default();
        let v = PlacementValidator::new(&catalog, &rules);

        let err = v.check_firewall(&state, WAF, pos(2, 2)).unwrap_err();
        assert_eq!(err, GameError::DuplicateFirewall(pos(0, 0)));
    }

    #[test]
    fn test_unlock_checks() {
        let mut state = state_with(&[]);
        assert_eq!(check(|v| v.check_unlock(&state, pos(5, 5))), Ok(20));
        assert_eq!(
            check(|v| v.check_unlock(&state, pos(0, 0))),
            Err(ErrorKind::ProtectedZone)
        );

        state.profile.currency = 19;
        assert_eq!(
            check(|v| v.check_unlock(&state, pos(5, 5))),
            Err(ErrorKind::InsufficientFunds)
        );

        state.grid.unlock(pos(5, 5)).unwrap();
        assert_eq!(
            check(|v| v.check_unlock(&state, pos(5, 5))),
            Err(ErrorKind::InvalidTransition)
        );
    }

    #[test]
    fn test_removal_requires_placed() {
        let state = state_with(&[(pos(5, 5), PC)]);
        assert_eq!(check(|v| v.check_removal(&state, pos(5, 5))), Ok(()));
        assert_eq!(
            check(|v| v.check_removal(&state, pos(6, 6))),
            Err(ErrorKind::InvalidTransition)
        );
        assert_eq!(
            check(|v| v.check_removal(&state, pos(2, 2))),
            Err(ErrorKind::ProtectedZone)
        );
    }
}
