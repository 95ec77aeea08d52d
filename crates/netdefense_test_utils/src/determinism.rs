//! Replay checks for player action scripts.
//!
//! A script is a list of [`PlayerAction`](crate::fixtures::PlayerAction)s applied to a fresh
//! player. Replaying the same script with the same incident seed must
//! leave byte-identical stored documents, so [`state_hash`] hashes the
//! bincode encoding a store would persist rather than the in-memory value.
//!
//! The unlock incident draw is the only random rule and it reads an
//! injected RNG. Incident chances are fixed-point
//! ([`netdefense_core::math::Fixed`]) and the player document holds only
//! ordered collections, so two replays cannot diverge through float
//! rounding or map iteration order.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use netdefense_core::player::PlayerState;

/// Stored-document hashes collected from repeated replays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// True when every replay hashed the same.
    pub is_deterministic: bool,
    /// Final hash of each replay, in run order.
    pub hashes: Vec<u64>,
    /// Actions applied in each replay.
    pub steps: u64,
}

impl DeterminismResult {
    /// Distinct hashes seen across replays.
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique: Vec<u64> = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every replay matched, listing the hashes if not.
    ///
    /// # Panics
    ///
    /// Panics if two replays left different documents.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            let unique = self.unique_hashes();
            panic!(
                "Replays diverged!\n\
                 Replays: {}\n\
                 Actions per replay: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.steps,
                unique.len(),
                self.hashes
            );
        }
    }
}

/// Replay a script `runs` times from a fresh state and compare hashes.
///
/// `setup` builds the starting player (and any engine state it needs),
/// `step` applies action `i` of the script, and `hash` digests the result,
/// usually through [`state_hash`].
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    steps: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let mut hashes = Vec::with_capacity(runs);

    for _ in 0..runs {
        let mut state = setup();

        for i in 0..steps {
            step(&mut state, i);
        }

        hashes.push(hash(&state));
    }

    let is_deterministic = hashes.windows(2).all(|w| w[0] == w[1]);

    DeterminismResult {
        is_deterministic,
        hashes,
        steps,
    }
}

/// Hash the bincode document a store would persist for `state`.
///
/// # Panics
///
/// Panics if the state cannot be encoded.
#[must_use]
pub fn state_hash(state: &PlayerState) -> u64 {
    let bytes = bincode::serialize(state)
        .unwrap_or_else(|e| panic!("failed to encode player state: {e}"));
    compute_hash(&bytes)
}

/// Hash any hashable value with the std hasher.
#[must_use]
pub fn compute_hash<T: Hash + ?Sized>(data: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    data.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for positions, devices, rewards, and action scripts.
pub mod strategies {
    use netdefense_core::catalog::BuildingTypeId;
    use netdefense_core::grid::TilePos;
    use netdefense_core::player::RewardEvent;
    use proptest::prelude::*;

    use crate::fixtures::{
        PlayerAction, HOST_FIREWALL, NETWORK_FIREWALL, ROUTER, SWITCH, WEB_APP_FIREWALL,
        WEB_SERVER, WORKSTATION,
    };

    /// Strategy for any tile position on a grid of side `size`,
    /// including positions one past the border.
    pub fn arb_tile_pos(size: u32) -> impl Strategy<Value = TilePos> {
        (0..=size, 0..=size).prop_map(|(x, y)| TilePos::new(x, y))
    }

    /// Strategy for positions in a small block outside the castle, so
    /// random scripts produce dense topologies.
    pub fn arb_build_pos() -> impl Strategy<Value = TilePos> {
        (4u32..10, 4u32..10).prop_map(|(x, y)| TilePos::new(x, y))
    }

    /// Strategy for a network device type.
    pub fn arb_device() -> impl Strategy<Value = BuildingTypeId> {
        prop_oneof![
            3 => Just(WORKSTATION),
            1 => Just(WEB_SERVER),
            2 => Just(SWITCH),
            1 => Just(ROUTER),
        ]
    }

    /// Strategy for a firewall type.
    pub fn arb_firewall() -> impl Strategy<Value = BuildingTypeId> {
        prop_oneof![
            Just(HOST_FIREWALL),
            Just(NETWORK_FIREWALL),
            Just(WEB_APP_FIREWALL),
        ]
    }

    /// Strategy for reward events.
    pub fn arb_reward() -> impl Strategy<Value = RewardEvent> {
        prop_oneof![
            (0u32..200).prop_map(|amount| RewardEvent::GrantCurrency { amount }),
            (0u32..3).prop_map(|count| RewardEvent::GrantItem {
                item: "patch".to_string(),
                count
            }),
            any::<bool>().prop_map(|correct| RewardEvent::QuizAnswered { correct }),
        ]
    }

    /// Strategy for one player action, weighted towards building a network.
    pub fn arb_action() -> impl Strategy<Value = PlayerAction> {
        prop_oneof![
            3 => arb_build_pos().prop_map(PlayerAction::Unlock),
            3 => (arb_device(), arb_build_pos()).prop_map(|(id, p)| PlayerAction::Place(id, p)),
            1 => (arb_firewall(), arb_tile_pos(9))
                .prop_map(|(id, p)| PlayerAction::Firewall(id, p)),
            1 => arb_build_pos().prop_map(PlayerAction::Remove),
            6 => (arb_build_pos(), arb_build_pos()).prop_map(|(a, b)| PlayerAction::Connect(a, b)),
            1 => any::<usize>().prop_map(PlayerAction::Disconnect),
            1 => arb_reward().prop_map(PlayerAction::Reward),
        ]
    }

    /// Strategy for a script of player actions.
    pub fn arb_script(max_len: usize) -> impl Strategy<Value = Vec<PlayerAction>> {
        prop::collection::vec(arb_action(), 0..max_len)
    }
}
