//! Collectible Spawning
//!
//! Periodic spawn policy: at most one new collectible per tick, capped both
//! in absolute terms and relative to the current player count so density
//! scales with the lobby without unbounded growth.

use crate::core::rng::ArenaRng;
use crate::game::state::{ArenaState, Collectible, CollectibleId};

/// Configuration for collectible spawning.
#[derive(Debug, Clone)]
pub struct SpawnConfig {
    /// Maximum collectibles on the field at once.
    pub max_collectibles: usize,
    /// Collectibles allowed per connected player.
    pub per_player: usize,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            max_collectibles: 20,
            per_player: 5,
        }
    }
}

/// Pure spawn decision, evaluated fresh each tick: spawn exactly one new
/// collectible iff the field is under both the absolute cap and the
/// population-scaled cap.
///
/// With zero players `per_player * players` is zero, so an empty lobby
/// never accumulates collectibles.
pub fn spawn_due(collectibles: usize, players: usize, config: &SpawnConfig) -> bool {
    collectibles < config.max_collectibles && collectibles < config.per_player * players
}

/// Run one spawn tick against the arena. Returns the id of the spawned
/// collectible, or `None` when the decision came up empty.
pub fn maybe_spawn(
    state: &mut ArenaState,
    rng: &mut ArenaRng,
    config: &SpawnConfig,
) -> Option<CollectibleId> {
    if !spawn_due(state.collectibles.len(), state.players.len(), config) {
        return None;
    }

    let collectible = Collectible::spawn(rng);
    let id = collectible.id.clone();
    state.collectibles.insert(collectible);

    Some(id)
}
