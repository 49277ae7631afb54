//! Orb Arena Server
//!
//! Authoritative state server for the Orb Arena multiplayer game. Binds a
//! WebSocket listener and synchronizes every connected client against the
//! shared arena state.

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use orb_arena::{ArenaServer, ServerConfig, VERSION};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let mut config = ServerConfig::default();
    if let Ok(port) = std::env::var("PORT") {
        let port: u16 = port.parse().context("invalid PORT value")?;
        config.bind_addr.set_port(port);
    }

    info!("Orb Arena Server v{}", VERSION);
    info!(
        "Spawn tick every {:?}, up to {} connections",
        config.spawn_interval, config.max_connections
    );

    let server = ArenaServer::new(config);
    server.run().await?;

    Ok(())
}
