//! Core transport-free primitives.
//!
//! Placement randomness and the fixed arena constants shared with clients.
//! Nothing in this module knows about connections or the wire protocol.

pub mod arena;
pub mod rng;

// Re-export core types
pub use arena::{index_to_value, AREA_HEIGHT, AREA_WIDTH, COLLECTIBLE_SIZE, PLAYER_SIZE};
pub use rng::ArenaRng;
