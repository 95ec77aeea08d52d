//! Player document store.
//!
//! Each player's state is one document. Writes are compare-and-set on a
//! revision number so two concurrent requests from the same player cannot
//! silently overwrite each other.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use netdefense_core::player::PlayerState;
use thiserror::Error;

use crate::session::PlayerId;

/// Revision of a document that has never been saved.
pub const NEW_DOCUMENT: u64 = 0;

/// A stored value with its revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Versioned<T> {
    /// Revision the value was read at.
    pub revision: u64,
    /// The value.
    pub value: T,
}

/// Errors from the document store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document changed since it was read.
    #[error(
        "Player '{player}' was modified concurrently \
         (expected revision {expected}, found {actual})"
    )]
    Conflict {
        /// Player whose document conflicted.
        player: PlayerId,
        /// Revision the writer read.
        expected: u64,
        /// Revision currently stored.
        actual: u64,
    },

    /// Document could not be encoded or decoded.
    #[error("Failed to encode player document: {0}")]
    Codec(#[from] bincode::Error),
}

/// Persistent storage for player documents.
pub trait PlayerStore: Send + Sync + 'static {
    /// Load a player's state, or `None` if the player has no document yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Codec`] if the stored document is unreadable.
    fn load(&self, player: &PlayerId) -> Result<Option<Versioned<PlayerState>>, StoreError>;

    /// Save a player's state if the stored revision is still `expected`.
    ///
    /// Pass [`NEW_DOCUMENT`] for a player with no document yet. Returns the
    /// new revision.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] if the document moved on.
    fn save(
        &self,
        player: &PlayerId,
        state: &PlayerState,
        expected: u64,
    ) -> Result<u64, StoreError>;
}

/// In-memory store holding bincode-encoded documents.
#[derive(Debug, Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<PlayerId, Versioned<Vec<u8>>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored players.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Check if no player has been stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl PlayerStore for MemoryStore {
    fn load(&self, player: &PlayerId) -> Result<Option<Versioned<PlayerState>>, StoreError> {
        let documents = self.documents.read().unwrap_or_else(PoisonError::into_inner);
        let Some(doc) = documents.get(player) else {
            return Ok(None);
        };
        let value = bincode::deserialize(&doc.value)?;
        Ok(Some(Versioned {
            revision: doc.revision,
            value,
        }))
    }

    fn save(
        &self,
        player: &PlayerId,
        state: &PlayerState,
        expected: u64,
    ) -> Result<u64, StoreError> {
        let bytes = bincode::serialize(state)?;
        let mut documents = self.documents.write().unwrap_or_else(PoisonError::into_inner);

        let actual = documents.get(player).map_or(NEW_DOCUMENT, |doc| doc.revision);
        if actual != expected {
            return Err(StoreError::Conflict {
                player: player.clone(),
                expected,
                actual,
            });
        }

        let revision = actual + 1;
        documents.insert(
            player.clone(),
            Versioned {
                revision,
                value: bytes,
            },
        );
        tracing::debug!(%player, revision, "Player document saved");
        Ok(revision)
    }
}
