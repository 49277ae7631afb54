//! Game Logic Module
//!
//! The synchronization core: registries, spawn policy, and the command
//! dispatch that serializes every mutation. No networking in here.
//!
//! ## Module Structure
//!
//! - `state`: entity records and the id-keyed registries
//! - `spawn`: collectible spawn policy
//! - `command`: tagged commands and the single dispatch function

pub mod command;
pub mod spawn;
pub mod state;

// Re-export key types
pub use command::{apply, ArenaConfig, Command, Update};
pub use spawn::{maybe_spawn, spawn_due, SpawnConfig};
pub use state::{ArenaState, Collectible, CollectibleId, ConnectionId, Player, Registry};
