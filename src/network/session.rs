//! Connected-Client Hub
//!
//! Tracks every open connection's outbound queue and fans registry
//! snapshots out to all of them. This is the broadcast dispatcher: the
//! state task hands it addressed messages and it never blocks on a slow
//! client. A full queue drops that client's copy rather than stalling
//! everyone else's.

use std::collections::BTreeMap;
use std::time::Instant;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

use crate::game::state::ConnectionId;
use crate::network::protocol::{OutboundMessage, ServerMessage};

/// One connected client as the hub sees it.
struct ConnectedClient {
    /// Outbound queue drained by the connection's writer task.
    sender: mpsc::Sender<ServerMessage>,
    /// Connection time.
    #[allow(dead_code)]
    connected_at: Instant,
}

/// The set of currently connected clients.
pub struct ClientHub {
    clients: RwLock<BTreeMap<ConnectionId, ConnectedClient>>,
}

impl ClientHub {
    /// Create an empty hub.
    pub fn new() -> Self {
        Self {
            clients: RwLock::new(BTreeMap::new()),
        }
    }

    /// Register a connection's outbound queue. Must happen before the
    /// connect command is enqueued so the connect broadcasts reach the
    /// new client too.
    pub async fn register(&self, conn: ConnectionId, sender: mpsc::Sender<ServerMessage>) {
        let mut clients = self.clients.write().await;
        clients.insert(
            conn,
            ConnectedClient {
                sender,
                connected_at: Instant::now(),
            },
        );
    }

    /// Drop a connection from the hub. Returns whether it was present.
    pub async fn unregister(&self, conn: &ConnectionId) -> bool {
        let mut clients = self.clients.write().await;
        clients.remove(conn).is_some()
    }

    /// Number of currently connected clients.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Send a message to every connected client.
    pub async fn broadcast(&self, msg: ServerMessage) {
        // Clone the senders out so the lock is not held while sending.
        let senders: Vec<(ConnectionId, mpsc::Sender<ServerMessage>)> = {
            let clients = self.clients.read().await;
            clients
                .iter()
                .map(|(conn, client)| (conn.clone(), client.sender.clone()))
                .collect()
        };

        for (conn, sender) in senders {
            match sender.try_send(msg.clone()) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(%conn, "outbound queue full, dropping broadcast for client");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    // Connection is tearing down; its task unregisters it.
                    debug!(%conn, "outbound queue closed during broadcast");
                }
            }
        }
    }

    /// Send a message to a single connection. Returns false when the
    /// connection is unknown or already tearing down.
    pub async fn send_to(&self, conn: &ConnectionId, msg: ServerMessage) -> bool {
        let sender = {
            let clients = self.clients.read().await;
            clients.get(conn).map(|client| client.sender.clone())
        };

        match sender {
            Some(sender) => sender.try_send(msg).is_ok(),
            None => false,
        }
    }

    /// Deliver one addressed message.
    pub async fn dispatch(&self, out: OutboundMessage) {
        match out {
            OutboundMessage::Broadcast(msg) => self.broadcast(msg).await,
            OutboundMessage::Direct(conn, msg) => {
                self.send_to(&conn, msg).await;
            }
        }
    }
}

impl Default for ClientHub {
    fn default() -> Self {
        Self::new()
    }
}
