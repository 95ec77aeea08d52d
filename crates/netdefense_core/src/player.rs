//! Per-player aggregate: profile, land, network and inventory.
//!
//! Each player owns an isolated grid and connection set. Nothing here is
//! shared between players.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::grid::Grid;
use crate::incidents::SecurityIncident;
use crate::rules::GameRules;
use crate::topology::ConnectionSet;

/// Counters stored on the player document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    /// Spendable currency.
    pub currency: u32,
    /// Defense score earned from correct quiz answers.
    pub defense_score: u32,
    /// Castle upgrade level.
    pub castle_level: u32,
    /// Tiles unlocked so far, castle excluded.
    pub developed_count: u32,
    /// Quiz questions answered.
    pub answered_count: u32,
}

impl PlayerProfile {
    /// Create a profile with a starting balance.
    #[must_use]
    pub const fn new(currency: u32) -> Self {
        Self {
            currency,
            defense_score: 0,
            castle_level: 1,
            developed_count: 0,
            answered_count: 0,
        }
    }

    /// Check if the player can afford a cost.
    #[must_use]
    pub const fn can_afford(&self, cost: u32) -> bool {
        self.currency >= cost
    }

    /// Fail unless the player can afford `cost`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InsufficientFunds`] if the balance is too low.
    pub fn require(&self, cost: u32) -> Result<()> {
        if self.can_afford(cost) {
            Ok(())
        } else {
            Err(GameError::InsufficientFunds {
                required: cost,
                available: self.currency,
            })
        }
    }

    /// Deduct a cost already checked with [`Self::require`].
    pub(crate) fn spend(&mut self, cost: u32) {
        self.currency = self.currency.saturating_sub(cost);
    }

    /// Add currency.
    pub(crate) fn deposit(&mut self, amount: u32) {
        self.currency = self.currency.saturating_add(amount);
    }
}

/// Counted inventory items, keyed by item identifier.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory(BTreeMap<String, u32>);

impl Inventory {
    /// Create an empty inventory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of an item held.
    #[must_use]
    pub fn count(&self, item: &str) -> u32 {
        self.0.get(item).copied().unwrap_or(0)
    }

    /// All held items with a positive count.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(k, &v)| (k.as_str(), v))
    }

    /// Check if nothing is held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub(crate) fn add(&mut self, item: &str, count: u32) {
        if count == 0 {
            return;
        }
        let held = self.0.entry(item.to_string()).or_insert(0);
        *held = held.saturating_add(count);
    }

    /// Fail unless at least `count` of `item` is held.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InsufficientItems`] if too few are held.
    pub fn require(&self, item: &str, count: u32) -> Result<()> {
        let available = self.count(item);
        if available < count {
            return Err(GameError::InsufficientItems {
                item: item.to_string(),
                required: count,
                available,
            });
        }
        Ok(())
    }

    /// Remove items already checked with [`Self::require`].
    pub(crate) fn take(&mut self, item: &str, count: u32) {
        if let Some(held) = self.0.get_mut(item) {
            *held = held.saturating_sub(count);
            if *held == 0 {
                self.0.remove(item);
            }
        }
    }
}

/// An outcome delivered by the quiz system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RewardEvent {
    /// Add currency.
    GrantCurrency {
        /// Amount granted.
        amount: u32,
    },
    /// Add inventory items.
    GrantItem {
        /// Item identifier.
        item: String,
        /// Number granted.
        count: u32,
    },
    /// A quiz question was answered.
    QuizAnswered {
        /// Whether the answer was correct.
        correct: bool,
    },
}

/// Complete state of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Player document counters.
    pub profile: PlayerProfile,
    /// Land grid.
    pub grid: Grid,
    /// Network links between placed devices.
    pub connections: ConnectionSet,
    /// Held items.
    pub inventory: Inventory,
    /// Incidents not yet dismissed, oldest first.
    pub incidents: Vec<SecurityIncident>,
}

impl PlayerState {
    /// Fresh state for a new player.
    #[must_use]
    pub fn new(rules: &GameRules) -> Self {
        Self {
            profile: PlayerProfile::new(rules.starting_currency),
            grid: Grid::from_rules(rules),
            connections: ConnectionSet::new(),
            inventory: Inventory::new(),
            incidents: Vec::new(),
        }
    }

    /// Look up an open incident.
    #[must_use]
    pub fn incident(&self, id: u64) -> Option<&SecurityIncident> {
        self.incidents.iter().find(|i| i.id == id)
    }

    /// Record an incident, bumping its ID past any open incident's ID.
    pub(crate) fn record_incident(&mut self, mut incident: SecurityIncident) -> SecurityIncident {
        while self.incident(incident.id).is_some() {
            incident.id = incident.id.wrapping_add(1);
        }
        self.incidents.push(incident);
        incident
    }
}
