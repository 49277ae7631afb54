//! WebSocket Arena Server
//!
//! Async WebSocket server for multiplayer connections. Owns the accept
//! loop, the per-connection reader/writer tasks, the spawn ticker, and the
//! single state task that every mutation is funneled through.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, mpsc};
use tokio::time::interval;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

use crate::core::rng::ArenaRng;
use crate::game::command::{apply, ArenaConfig, Command};
use crate::game::state::{ArenaState, ConnectionId};
use crate::network::protocol::{ClientMessage, OutboundMessage, ServerMessage};
use crate::network::session::ClientHub;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections. The player registry has no cap of
    /// its own, so this is the only bound on its growth.
    pub max_connections: usize,
    /// Period of the collectible spawn tick.
    pub spawn_interval: Duration,
    /// Reject move payloads whose id differs from the sender's.
    pub strict_move_identity: bool,
    /// Seed for the arena RNG; `None` derives one from the system clock.
    pub rng_seed: Option<u64>,
    /// Server version string.
    pub version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".parse().expect("static bind address"),
            max_connections: 1000,
            spawn_interval: crate::TICK_PERIOD,
            strict_move_identity: false,
            rng_seed: None,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl ServerConfig {
    /// The game-layer switches this transport configuration implies.
    fn arena_config(&self) -> ArenaConfig {
        ArenaConfig {
            spawn: Default::default(),
            strict_move_identity: self.strict_move_identity,
        }
    }
}

/// Arena server errors.
#[derive(Debug, thiserror::Error)]
pub enum ArenaServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The state task's command queue is gone.
    #[error("Command channel closed")]
    CommandChannelClosed,
}

/// The arena server.
pub struct ArenaServer {
    /// Server configuration.
    config: ServerConfig,
    /// Connected clients.
    hub: Arc<ClientHub>,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl ArenaServer {
    /// Create a new arena server.
    pub fn new(config: ServerConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            hub: Arc::new(ClientHub::new()),
            shutdown_tx,
        }
    }

    /// Number of currently connected clients.
    pub async fn connection_count(&self) -> usize {
        self.hub.connection_count().await
    }

    /// Signal the accept loop and all connections to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Run the server until shutdown.
    pub async fn run(&self) -> Result<(), ArenaServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("Arena server listening on {}", self.config.bind_addr);

        let (command_tx, command_rx) = mpsc::channel::<Command>(256);

        let seed = self.config.rng_seed.unwrap_or_else(seed_from_clock);
        let state_handle = tokio::spawn(state_task(
            command_rx,
            self.hub.clone(),
            self.config.arena_config(),
            seed,
        ));

        let ticker_handle = tokio::spawn(spawn_ticker(
            command_tx.clone(),
            self.config.spawn_interval,
            self.shutdown_tx.subscribe(),
        ));

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let connected = self.hub.connection_count().await;
                            if connected >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr, command_tx.clone());
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        // Stop background tasks; connections see the shutdown broadcast.
        ticker_handle.abort();
        state_handle.abort();

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(
        &self,
        stream: TcpStream,
        addr: SocketAddr,
        command_tx: mpsc::Sender<Command>,
    ) {
        let hub = self.hub.clone();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(64);

            let conn = ConnectionId::generate();
            debug!(%conn, %addr, "connection established");

            // Register before enqueueing the connect command so the
            // connect broadcasts include this client.
            hub.register(conn.clone(), msg_tx).await;

            if command_tx
                .send(Command::Connect { conn: conn.clone() })
                .await
                .is_err()
            {
                error!(%conn, "state task unavailable, dropping connection");
                hub.unregister(&conn).await;
                return;
            }

            // Writer task: drain this client's queue onto the socket.
            let writer_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            // Reader loop: parse frames into commands until the client
            // goes away. A frame that fails to parse is ignored; a failed
            // connection never takes the shared state down with it.
            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                let client_msg = match ClientMessage::from_json(&text) {
                                    Ok(m) => m,
                                    Err(e) => {
                                        debug!(%conn, "ignoring unparseable frame: {}", e);
                                        continue;
                                    }
                                };

                                if command_tx.send(command_for(&conn, client_msg)).await.is_err() {
                                    error!(%conn, "state task unavailable, closing connection");
                                    break;
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!(%conn, "client disconnected");
                                break;
                            }
                            Some(Err(e)) => {
                                error!(%conn, "websocket error: {}", e);
                                break;
                            }
                            // Ping/Pong/Binary carry nothing for the state task
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        debug!(%conn, "closing connection for shutdown");
                        break;
                    }
                }
            }

            // Cleanup: stop the writer, leave the hub, then retire the
            // player. Exactly one disconnect command per connection.
            writer_task.abort();
            hub.unregister(&conn).await;
            let _ = command_tx.send(Command::Disconnect { conn: conn.clone() }).await;

            info!(%conn, "connection cleaned up");
        });
    }
}

/// Map one parsed client message onto its command.
fn command_for(conn: &ConnectionId, msg: ClientMessage) -> Command {
    match msg {
        ClientMessage::PlayerMove(payload) => Command::Move {
            conn: conn.clone(),
            payload,
        },
        ClientMessage::Collect(payload) => Command::Collect {
            conn: conn.clone(),
            id: payload.id,
        },
    }
}

/// The single mutator: owns the arena state, applies every command in
/// arrival order, and hands the resulting snapshots to the hub. Because
/// each command's updates are dispatched before the next command is
/// received, no client ever observes a half-applied mutation.
async fn state_task(
    mut command_rx: mpsc::Receiver<Command>,
    hub: Arc<ClientHub>,
    config: ArenaConfig,
    seed: u64,
) {
    let mut state = ArenaState::new();
    let mut rng = ArenaRng::new(seed);

    while let Some(command) = command_rx.recv().await {
        for update in apply(&mut state, &mut rng, &config, command) {
            hub.dispatch(OutboundMessage::from(update)).await;
        }
    }

    debug!("state task finished");
}

/// Enqueue one spawn tick per period until shutdown.
async fn spawn_ticker(
    command_tx: mpsc::Sender<Command>,
    period: Duration,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let mut ticker = interval(period);
    // An interval's first tick completes immediately; consume it so the
    // first spawn decision lands one full period after boot.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if command_tx.send(Command::SpawnTick).await.is_err() {
                    break;
                }
            }
            _ = shutdown_rx.recv() => break,
        }
    }
}

/// Seed for deployments that did not pin one in the config.
fn seed_from_clock() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64
}
