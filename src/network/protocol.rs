//! Protocol Messages
//!
//! Wire format for client-server communication over WebSocket. Every frame
//! is a JSON envelope `{"type": <name>, "data": <payload>}`; the names are
//! the protocol contract and must match the client exactly.

use serde::{Deserialize, Serialize};

use crate::game::command::Update;
use crate::game::state::{Collectible, CollectibleId, ConnectionId, Player};

// =============================================================================
// CLIENT -> SERVER MESSAGES
// =============================================================================

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// The client reports its own player record, in full.
    PlayerMove(Player),

    /// The client claims it picked up a collectible.
    Collect(CollectPayload),
}

/// Payload of a `collect` message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectPayload {
    /// Id of the claimed collectible.
    pub id: CollectibleId,
}

impl ClientMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

// =============================================================================
// SERVER -> CLIENT MESSAGES
// =============================================================================

/// Messages sent from server to client. List payloads are always full
/// snapshots, never deltas.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Every live collectible.
    CollectiblesList(Vec<Collectible>),

    /// Every connected player.
    PlayerList(Vec<Player>),

    /// One player record, sent only to the connection it belongs to:
    /// self-identification on connect, acknowledgment on move.
    UpdatePlayer(Player),
}

impl ServerMessage {
    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

// =============================================================================
// GAME -> WIRE CONVERSION
// =============================================================================

/// A wire message with its audience attached.
#[derive(Debug, Clone)]
pub enum OutboundMessage {
    /// Goes to every connected client.
    Broadcast(ServerMessage),
    /// Goes to one connection only.
    Direct(ConnectionId, ServerMessage),
}

impl From<Update> for OutboundMessage {
    fn from(update: Update) -> Self {
        match update {
            Update::Collectibles(list) => {
                OutboundMessage::Broadcast(ServerMessage::CollectiblesList(list))
            }
            Update::Players(list) => OutboundMessage::Broadcast(ServerMessage::PlayerList(list)),
            Update::SelfPlayer(conn, player) => {
                OutboundMessage::Direct(conn, ServerMessage::UpdatePlayer(player))
            }
        }
    }
}
