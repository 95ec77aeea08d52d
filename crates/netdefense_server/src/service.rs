//! Request-scoped game operations over the document store.
//!
//! Every mutating request is one read-modify-write of the player's
//! document: load the current revision, run one engine operation on a copy,
//! and save with compare-and-set. A rejected operation saves nothing.

use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use netdefense_core::engine::GameEngine;
use netdefense_core::error::GameError;
use netdefense_core::player::PlayerState;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::ApiError;
use crate::session::PlayerId;
use crate::store::{PlayerStore, StoreError, Versioned, NEW_DOCUMENT};

/// How many times a write is retried after losing a compare-and-set race.
pub const MAX_WRITE_ATTEMPTS: usize = 3;

/// Per-request context passed to mutating operations.
pub struct Turn<'a> {
    /// Rule engine.
    pub engine: &'a GameEngine,
    /// Incident RNG.
    pub rng: &'a mut StdRng,
    /// Request time in milliseconds since the Unix epoch.
    pub now_ms: u64,
}

/// Game operations bound to a store.
pub struct GameService<S> {
    engine: GameEngine,
    store: S,
    rng: Mutex<StdRng>,
}

impl<S: PlayerStore> GameService<S> {
    /// Create a service. `seed` fixes the incident sequence; `None` seeds
    /// from the OS.
    #[must_use]
    pub fn new(engine: GameEngine, store: S, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            engine,
            store,
            rng: Mutex::new(rng),
        }
    }

    /// The rule engine.
    #[must_use]
    pub fn engine(&self) -> &GameEngine {
        &self.engine
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    fn load(&self, player: &PlayerId) -> Result<Versioned<PlayerState>, StoreError> {
        Ok(self.store.load(player)?.unwrap_or_else(|| Versioned {
            revision: NEW_DOCUMENT,
            value: self.engine.new_player(),
        }))
    }

    /// Read a player's state; a new player gets a fresh state.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Store`] if the document cannot be read.
    pub fn read(&self, player: &PlayerId) -> Result<PlayerState, ApiError> {
        Ok(self.load(player)?.value)
    }

    /// Run one engine operation against a player's state and persist it.
    ///
    /// The operation sees a private copy; it is saved only if the operation
    /// succeeds. A lost compare-and-set race reruns the operation against
    /// the fresh state, up to [`MAX_WRITE_ATTEMPTS`] times.
    ///
    /// # Errors
    ///
    /// Returns the operation's [`GameError`], or [`ApiError::Store`] if the
    /// document cannot be read or keeps conflicting.
    pub fn update<T>(
        &self,
        player: &PlayerId,
        mut op: impl FnMut(&mut Turn<'_>, &mut PlayerState) -> Result<T, GameError>,
    ) -> Result<T, ApiError> {
        let mut attempt = 1;
        loop {
            let Versioned {
                revision,
                value: mut state,
            } = self.load(player)?;

            let output = {
                let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                let mut turn = Turn {
                    engine: &self.engine,
                    rng: &mut *rng,
                    now_ms: now_ms(),
                };
                op(&mut turn, &mut state)?
            };

            match self.store.save(player, &state, revision) {
                Ok(_) => return Ok(output),
                Err(StoreError::Conflict { .. }) if attempt < MAX_WRITE_ATTEMPTS => {
                    tracing::debug!(%player, attempt, "Write conflict, retrying");
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use netdefense_core::catalog::BuildingTypeId;
    use netdefense_core::error::ErrorKind;
    use netdefense_core::grid::TilePos;

    fn service() -> GameService<MemoryStore> {
        GameService::new(GameEngine::default(), MemoryStore::new(), Some(7))
    }

    fn alice() -> PlayerId {
        PlayerId::new("alice").unwrap()
    }

    #[test]
    fn test_read_new_player_does_not_save() {
        let svc = service();
        let state = svc.read(&alice()).unwrap();
        assert_eq!(state.profile.currency, 500);
        assert!(svc.store().is_empty());
    }

    #[test]
    fn test_update_persists() {
        let svc = service();
        svc.update(&alice(), |turn, state| {
            turn.engine
                .unlock_tile(state, TilePos::new(3, 3), turn.rng, turn.now_ms)
        })
        .unwrap();

        let state = svc.read(&alice()).unwrap();
        assert_eq!(state.profile.developed_count, 1);
        assert_eq!(svc.store().load(&alice()).unwrap().unwrap().revision, 1);
    }

    #[test]
    fn test_rejected_update_saves_nothing() {
        let svc = service();
        let err = svc
            .update(&alice(), |turn, state| {
                turn.engine
                    .place_building(state, BuildingTypeId(1), TilePos::new(5, 5))
            })
            .unwrap_err();
        assert!(matches!(err, ApiError::Game(ref e) if e.kind() == ErrorKind::InvalidTransition));
        assert!(svc.store().is_empty());
    }

    #[test]
    fn test_conflict_reruns_against_fresh_state() {
        let svc = service();
        let mut interfered = false;

        // A concurrent writer sneaks in during the first attempt.
        svc.update(&alice(), |turn, state| {
            if !interfered {
                interfered = true;
                let mut other = turn.engine.new_player();
                other.profile.currency = 1_000;
                svc.store().save(&alice(), &other, NEW_DOCUMENT).unwrap();
            }
            state.profile.currency += 1;
            Ok(())
        })
        .unwrap();

        assert_eq!(svc.read(&alice()).unwrap().profile.currency, 1_001);
    }
}
