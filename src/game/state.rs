//! Arena State Definitions
//!
//! Entity types and the id-keyed registries that hold them.
//! Uses BTreeMap so snapshots iterate in a stable order.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::arena::{index_to_value, COLLECTIBLE_SIZE, PLAYER_SIZE, SPRITE_VARIANTS, VALUE_INDEX_MAX};
use crate::core::rng::ArenaRng;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique identifier for one client connection, and therefore for the
/// player it controls. Opaque on the wire; the server mints UUID v4 strings
/// but accepts whatever a client echoes back.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(String);

impl ConnectionId {
    /// Mint a fresh connection id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// View as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ConnectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ConnectionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a spawned collectible.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollectibleId(String);

impl CollectibleId {
    /// Mint a fresh collectible id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// View as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CollectibleId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for CollectibleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// ENTITIES
// =============================================================================

/// State of a single connected player.
///
/// Coordinates are bounded at creation so the sprite lands fully
/// on-screen; afterwards they are whatever the client last reported.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Connection id this player belongs to.
    pub id: ConnectionId,
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Accumulated score. Carried for the client; this core never mutates it.
    pub score: i64,
    /// Sprite variant in `[1, 9]`, fixed for the connection's lifetime.
    pub sprite_index: u32,
}

impl Player {
    /// Create a freshly connected player at a random on-screen position.
    pub fn spawn(id: ConnectionId, rng: &mut ArenaRng) -> Self {
        let (x, y) = rng.random_position(PLAYER_SIZE);
        let sprite_index = rng.random_range(1, SPRITE_VARIANTS as i32) as u32;

        Self {
            id,
            x,
            y,
            score: 0,
            sprite_index,
        }
    }
}

/// A spawned collectible waiting to be claimed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Collectible {
    /// Unique item id.
    pub id: CollectibleId,
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
    /// Worth, drawn through the value lookup table at spawn time.
    pub value: u32,
}

impl Collectible {
    /// Create a new collectible at a random on-screen position with a
    /// table-drawn worth.
    pub fn spawn(rng: &mut ArenaRng) -> Self {
        let (x, y) = rng.random_position(COLLECTIBLE_SIZE);
        let value = index_to_value(rng.random_range(1, VALUE_INDEX_MAX as i32) as u32);

        Self {
            id: CollectibleId::generate(),
            x,
            y,
            value,
        }
    }
}

// =============================================================================
// REGISTRIES
// =============================================================================

/// An entity that knows its own registry key.
pub trait Keyed {
    /// Key type the registry indexes by.
    type Id: Ord + Clone;

    /// This entity's key.
    fn key(&self) -> Self::Id;
}

impl Keyed for Player {
    type Id = ConnectionId;

    fn key(&self) -> ConnectionId {
        self.id.clone()
    }
}

impl Keyed for Collectible {
    type Id = CollectibleId;

    fn key(&self) -> CollectibleId {
        self.id.clone()
    }
}

/// In-memory mapping from entity id to entity record: the sole
/// authoritative store for one entity kind.
///
/// Every operation is a plain map access; broadcast reads go through
/// [`Registry::snapshot`], which clones the current entries so the caller
/// never iterates a registry that a later command might mutate.
pub struct Registry<E: Keyed> {
    entries: BTreeMap<E::Id, E>,
}

impl<E: Keyed + Clone> Registry<E> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Insert an entity under its own key. Returns the displaced entry if
    /// the key was already present.
    pub fn insert(&mut self, entity: E) -> Option<E> {
        self.entries.insert(entity.key(), entity)
    }

    /// Remove the entry for `id`. Removing an absent id is a no-op and
    /// returns `None`.
    pub fn remove(&mut self, id: &E::Id) -> Option<E> {
        self.entries.remove(id)
    }

    /// Replace the entry stored under `id` with `entity`, verbatim: the
    /// stored record is keyed by `id` even if the entity claims another.
    /// Does nothing and returns `None` when `id` has no entry.
    pub fn replace(&mut self, id: &E::Id, entity: E) -> Option<E> {
        self.entries
            .get_mut(id)
            .map(|slot| std::mem::replace(slot, entity))
    }

    /// Look up an entity by id.
    pub fn get(&self, id: &E::Id) -> Option<&E> {
        self.entries.get(id)
    }

    /// Whether an entry exists for `id`.
    pub fn contains(&self, id: &E::Id) -> bool {
        self.entries.contains_key(id)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Clone the current entries out for broadcast, in key order.
    pub fn snapshot(&self) -> Vec<E> {
        self.entries.values().cloned().collect()
    }
}

impl<E: Keyed + Clone> Default for Registry<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> fmt::Debug for Registry<E>
where
    E: Keyed + fmt::Debug,
    E::Id: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries.iter()).finish()
    }
}

// =============================================================================
// ARENA STATE
// =============================================================================

/// The whole shared state of one arena process: both registries.
///
/// Never shared between tasks directly: the state task owns it and all
/// mutation arrives as commands on that task's queue. Reset to empty on
/// process restart; there is no persistence.
#[derive(Debug, Default)]
pub struct ArenaState {
    /// Connected players, keyed by connection id.
    pub players: Registry<Player>,
    /// Live collectibles, keyed by item id.
    pub collectibles: Registry<Collectible>,
}

impl ArenaState {
    /// Create an empty arena.
    pub fn new() -> Self {
        Self::default()
    }
}
