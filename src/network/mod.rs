//! Network Layer
//!
//! WebSocket transport for real-time state synchronization. All game logic
//! lives in `game/`; this layer only parses frames, queues commands, and
//! fans snapshots back out.

pub mod protocol;
pub mod server;
pub mod session;

pub use protocol::{ClientMessage, OutboundMessage, ServerMessage};
pub use server::{ArenaServer, ArenaServerError, ServerConfig};
pub use session::ClientHub;
