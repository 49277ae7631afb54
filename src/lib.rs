//! # Orb Arena Server
//!
//! Authoritative real-time state server for the Orb Arena multiplayer game.
//! Tracks connected players and spawnable collectibles, mutates that shared
//! state on a timer and on player input, and broadcasts every change to all
//! connected clients.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    ORB ARENA SERVER                          │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Transport-free primitives                 │
//! │  ├── rng.rs      - Xorshift128+ PRNG, placement draws        │
//! │  └── arena.rs    - Arena bounds, footprints, value table     │
//! │                                                              │
//! │  game/           - Game logic (no networking)                │
//! │  ├── state.rs    - Entities and id-keyed registries          │
//! │  ├── spawn.rs    - Collectible spawn policy                  │
//! │  └── command.rs  - Tagged commands, single dispatch          │
//! │                                                              │
//! │  network/        - WebSocket transport                       │
//! │  ├── protocol.rs - Wire messages (JSON envelopes)            │
//! │  ├── session.rs  - Connected-client hub, broadcasting        │
//! │  └── server.rs   - Accept loop, state task, spawn ticker     │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Synchronization model
//!
//! All registry mutation flows through a single state task: connection
//! events, player input, and spawn ticks become [`game::command::Command`]
//! values on one mpsc queue, so there is at most one mutator at any time
//! and no locking around the registries. Each applied command yields full
//! registry snapshots that the client hub fans out, which means no client
//! can ever observe a half-applied mutation.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod network;

// Re-export commonly used types
pub use crate::core::arena::{AREA_HEIGHT, AREA_WIDTH, COLLECTIBLE_SIZE, PLAYER_SIZE};
pub use crate::core::rng::ArenaRng;
pub use game::command::{apply, ArenaConfig, Command, Update};
pub use game::spawn::SpawnConfig;
pub use game::state::{ArenaState, Collectible, CollectibleId, ConnectionId, Player};
pub use network::protocol::{ClientMessage, OutboundMessage, ServerMessage};
pub use network::server::{ArenaServer, ArenaServerError, ServerConfig};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Reference spawn tick period (one decision per second).
pub const TICK_PERIOD: std::time::Duration = std::time::Duration::from_secs(1);
