//! Tunable game rules.
//!
//! Loaded once at startup (RON via the server, or [`GameRules::default`])
//! and shared read-only by the engine.

use serde::{Deserialize, Serialize};

/// Side length of the square land grid.
pub const GRID_SIZE: u32 = 20;

/// Side length of the castle block anchored at the origin.
pub const CASTLE_EXTENT: u32 = 3;

/// Side length of the incident-free safe zone anchored at the origin.
pub const SAFE_ZONE_EXTENT: u32 = 5;

/// Maximum number of links a Host-class device may hold.
pub const HOST_CONNECTION_CAP: u32 = 1;

/// Maximum number of Host-class neighbors a Switch may hold.
pub const SWITCH_HOST_FANOUT: u32 = 4;

/// Rule parameters for one game world.
///
/// # Example RON
///
/// ```ron
/// GameRules(
///     unlock_cost: 20,
///     starting_currency: 500,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    /// Side length of the land grid.
    pub grid_size: u32,
    /// Side length of the protected castle block.
    pub castle_extent: u32,
    /// Side length of the block where unlocking never triggers incidents.
    pub safe_zone_extent: u32,
    /// Currency charged for unlocking one tile.
    pub unlock_cost: u32,
    /// Currency a new player starts with.
    pub starting_currency: u32,
    /// Link cap applied to every Host-class device.
    pub host_connection_cap: u32,
    /// Host-neighbor cap applied to every Switch-class device.
    pub switch_host_fanout: u32,
}

impl Default for GameRules {
    fn default() -> Self {
        Self {
            grid_size: GRID_SIZE,
            castle_extent: CASTLE_EXTENT,
            safe_zone_extent: SAFE_ZONE_EXTENT,
            unlock_cost: 20,
            starting_currency: 500,
            host_connection_cap: HOST_CONNECTION_CAP,
            switch_host_fanout: SWITCH_HOST_FANOUT,
        }
    }
}

impl GameRules {
    /// Check internal consistency of the rule set.
    ///
    /// Returns a list of validation errors.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.grid_size == 0 {
            errors.push("grid_size must be positive".to_string());
        }
        if self.castle_extent == 0 || self.castle_extent > self.grid_size {
            errors.push(format!(
                "castle_extent {} must be within 1..={}",
                self.castle_extent, self.grid_size
            ));
        }
        if self.safe_zone_extent < self.castle_extent {
            errors.push(format!(
                "safe_zone_extent {} must cover the castle block ({})",
                self.safe_zone_extent, self.castle_extent
            ));
        }
        if self.host_connection_cap == 0 {
            errors.push("host_connection_cap must be positive".to_string());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rules_are_valid() {
        assert!(GameRules::default().validate().is_empty());
    }

    #[test]
    fn test_partial_ron_uses_defaults() {
        let rules: GameRules = ron::from_str("GameRules(unlock_cost: 35)").unwrap();
        assert_eq!(rules.unlock_cost, 35);
        assert_eq!(rules.grid_size, GRID_SIZE);
        assert_eq!(rules.switch_host_fanout, SWITCH_HOST_FANOUT);
    }

    #[test]
    fn test_castle_larger_than_safe_zone_rejected() {
        let rules = GameRules {
            safe_zone_extent: 2,
            ..GameRules::default()
        };
        let errors = rules.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("safe_zone_extent"));
    }
}
