//! Command Dispatch
//!
//! Every mutation of the shared arena state enters through [`apply`] as a
//! tagged [`Command`]: connection lifecycle, player input, and spawn ticks
//! all take the same path. The function returns the [`Update`]s the
//! mutation produced (full registry snapshots, taken only after the
//! mutation has fully applied) and the transport layer turns those into
//! wire messages. Nothing in this module touches a socket, which is what
//! makes the whole state machine testable without a live transport.

use tracing::warn;

use crate::core::rng::ArenaRng;
use crate::game::spawn::{maybe_spawn, SpawnConfig};
use crate::game::state::{ArenaState, Collectible, CollectibleId, ConnectionId, Player};

/// Arena-level behavior switches.
#[derive(Debug, Clone, Default)]
pub struct ArenaConfig {
    /// Spawn policy caps.
    pub spawn: SpawnConfig,
    /// Reject move payloads whose `id` differs from the sender's
    /// connection id. Off by default: the reference behavior trusts the
    /// payload verbatim, and this switch is the single place that trust
    /// boundary can be tightened.
    pub strict_move_identity: bool,
}

/// One mutation request for the arena state.
#[derive(Debug, Clone)]
pub enum Command {
    /// A client connected; create its player.
    Connect {
        /// The new connection.
        conn: ConnectionId,
    },
    /// A client went away; destroy its player.
    Disconnect {
        /// The closed connection.
        conn: ConnectionId,
    },
    /// A client reported its own player record.
    Move {
        /// The sending connection.
        conn: ConnectionId,
        /// Full replacement record, stored verbatim.
        payload: Player,
    },
    /// A client claims it picked up a collectible.
    Collect {
        /// The sending connection. Recorded for provenance; any client
        /// may remove any collectible.
        conn: ConnectionId,
        /// The claimed item.
        id: CollectibleId,
    },
    /// The periodic spawn timer fired.
    SpawnTick,
}

/// Outbound effect of one applied command, in emission order.
///
/// Snapshot payloads are cloned out of the registries before this value is
/// handed to the dispatcher, so later commands can never retroactively
/// change what an earlier update carries.
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    /// Full collectible registry, for every connected client.
    Collectibles(Vec<Collectible>),
    /// Full player registry, for every connected client.
    Players(Vec<Player>),
    /// One player's own record, for that connection only.
    SelfPlayer(ConnectionId, Player),
}

/// Apply one command to the arena and report what must be sent out.
///
/// This is the only mutation path for [`ArenaState`]; callers serialize
/// their commands through a single queue so at most one `apply` runs at a
/// time.
pub fn apply(
    state: &mut ArenaState,
    rng: &mut ArenaRng,
    config: &ArenaConfig,
    command: Command,
) -> Vec<Update> {
    match command {
        Command::Connect { conn } => {
            let player = Player::spawn(conn.clone(), rng);
            state.players.insert(player.clone());

            // Catch the new client up on the field, tell everyone about
            // the new roster, then tell the newcomer which record is
            // theirs, in that order.
            vec![
                Update::Collectibles(state.collectibles.snapshot()),
                Update::Players(state.players.snapshot()),
                Update::SelfPlayer(conn, player),
            ]
        }

        Command::Disconnect { conn } => {
            state.players.remove(&conn);
            vec![Update::Players(state.players.snapshot())]
        }

        Command::Move { conn, payload } => {
            if config.strict_move_identity && payload.id != conn {
                warn!(sender = %conn, claimed = %payload.id, "dropping move with mismatched id");
                return vec![];
            }

            // Stored verbatim under the sender's key; a move that races a
            // disconnect finds no entry and mutates nothing. The roster
            // broadcast and the echo go out either way, matching the
            // reference behavior.
            state.players.replace(&conn, payload.clone());

            vec![
                Update::Players(state.players.snapshot()),
                Update::SelfPlayer(conn, payload),
            ]
        }

        Command::Collect { conn: _, id } => {
            // Removing an absent id is a no-op, so duplicate collect
            // messages are idempotent; the (possibly unchanged) field is
            // rebroadcast regardless.
            state.collectibles.remove(&id);
            vec![Update::Collectibles(state.collectibles.snapshot())]
        }

        Command::SpawnTick => match maybe_spawn(state, rng, &config.spawn) {
            Some(_) => vec![Update::Collectibles(state.collectibles.snapshot())],
            None => vec![],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (ArenaState, ArenaRng, ArenaConfig) {
        (ArenaState::new(), ArenaRng::new(77), ArenaConfig::default())
    }

    fn connect(
        state: &mut ArenaState,
        rng: &mut ArenaRng,
        config: &ArenaConfig,
        conn: &str,
    ) -> Vec<Update> {
        apply(
            state,
            rng,
            config,
            Command::Connect {
                conn: ConnectionId::from(conn),
            },
        )
    }

    #[test]
    fn test_connect_creates_player_and_emits_in_order() {
        let (mut state, mut rng, config) = setup();

        let updates = connect(&mut state, &mut rng, &config, "A");

        assert_eq!(state.players.len(), 1);
        assert_eq!(updates.len(), 3);

        // Collectibles first, then roster, then self-identification.
        assert!(matches!(updates[0], Update::Collectibles(ref list) if list.is_empty()));
        assert!(matches!(updates[1], Update::Players(ref list) if list.len() == 1));

        match &updates[2] {
            Update::SelfPlayer(conn, player) => {
                assert_eq!(conn, &ConnectionId::from("A"));
                assert_eq!(Some(player), state.players.get(&ConnectionId::from("A")));
            }
            other => panic!("expected SelfPlayer, got {other:?}"),
        }
    }

    #[test]
    fn test_registry_size_tracks_connections() {
        let (mut state, mut rng, config) = setup();

        for name in ["A", "B", "C"] {
            connect(&mut state, &mut rng, &config, name);
        }
        assert_eq!(state.players.len(), 3);

        apply(
            &mut state,
            &mut rng,
            &config,
            Command::Disconnect {
                conn: ConnectionId::from("B"),
            },
        );

        assert_eq!(state.players.len(), 2);
        assert!(!state.players.contains(&ConnectionId::from("B")));
        assert!(state.players.contains(&ConnectionId::from("A")));
        assert!(state.players.contains(&ConnectionId::from("C")));
    }

    #[test]
    fn test_disconnect_broadcasts_remaining_roster() {
        let (mut state, mut rng, config) = setup();
        connect(&mut state, &mut rng, &config, "A");
        connect(&mut state, &mut rng, &config, "B");

        let updates = apply(
            &mut state,
            &mut rng,
            &config,
            Command::Disconnect {
                conn: ConnectionId::from("A"),
            },
        );

        assert_eq!(updates.len(), 1);
        match &updates[0] {
            Update::Players(list) => {
                assert_eq!(list.len(), 1);
                assert_eq!(list[0].id, ConnectionId::from("B"));
            }
            other => panic!("expected Players, got {other:?}"),
        }
    }

    #[test]
    fn test_move_replaces_entry_field_for_field() {
        let (mut state, mut rng, config) = setup();
        connect(&mut state, &mut rng, &config, "A");

        let payload = Player {
            id: ConnectionId::from("A"),
            x: 10.0,
            y: 20.0,
            score: 0,
            sprite_index: 3,
        };

        let updates = apply(
            &mut state,
            &mut rng,
            &config,
            Command::Move {
                conn: ConnectionId::from("A"),
                payload: payload.clone(),
            },
        );

        assert_eq!(state.players.get(&ConnectionId::from("A")), Some(&payload));

        // Roster broadcast plus an echo to the sender only.
        assert_eq!(updates.len(), 2);
        assert!(matches!(updates[0], Update::Players(_)));
        assert_eq!(
            updates[1],
            Update::SelfPlayer(ConnectionId::from("A"), payload)
        );
    }

    #[test]
    fn test_move_accepts_mismatched_id_by_default() {
        let (mut state, mut rng, config) = setup();
        connect(&mut state, &mut rng, &config, "A");

        let payload = Player {
            id: ConnectionId::from("spoofed"),
            x: 1.0,
            y: 2.0,
            score: 999,
            sprite_index: 1,
        };

        apply(
            &mut state,
            &mut rng,
            &config,
            Command::Move {
                conn: ConnectionId::from("A"),
                payload: payload.clone(),
            },
        );

        // Trust boundary preserved: stored verbatim under the sender's key.
        assert_eq!(state.players.get(&ConnectionId::from("A")), Some(&payload));
    }

    #[test]
    fn test_strict_mode_drops_mismatched_move() {
        let (mut state, mut rng, config) = setup();
        connect(&mut state, &mut rng, &config, "A");
        let before = state.players.get(&ConnectionId::from("A")).cloned();

        let strict = ArenaConfig {
            strict_move_identity: true,
            ..ArenaConfig::default()
        };

        let updates = apply(
            &mut state,
            &mut rng,
            &strict,
            Command::Move {
                conn: ConnectionId::from("A"),
                payload: Player {
                    id: ConnectionId::from("spoofed"),
                    x: 1.0,
                    y: 2.0,
                    score: 0,
                    sprite_index: 1,
                },
            },
        );

        // No mutation, no broadcast.
        assert!(updates.is_empty());
        assert_eq!(state.players.get(&ConnectionId::from("A")).cloned(), before);
    }

    #[test]
    fn test_strict_mode_still_accepts_honest_move() {
        let (mut state, mut rng, _) = setup();
        let strict = ArenaConfig {
            strict_move_identity: true,
            ..ArenaConfig::default()
        };
        connect(&mut state, &mut rng, &strict, "A");

        let payload = Player {
            id: ConnectionId::from("A"),
            x: 5.0,
            y: 6.0,
            score: 0,
            sprite_index: 2,
        };

        let updates = apply(
            &mut state,
            &mut rng,
            &strict,
            Command::Move {
                conn: ConnectionId::from("A"),
                payload: payload.clone(),
            },
        );

        assert_eq!(updates.len(), 2);
        assert_eq!(state.players.get(&ConnectionId::from("A")), Some(&payload));
    }

    #[test]
    fn test_collect_removes_and_rebroadcasts() {
        let (mut state, mut rng, config) = setup();
        connect(&mut state, &mut rng, &config, "A");
        apply(&mut state, &mut rng, &config, Command::SpawnTick);
        assert_eq!(state.collectibles.len(), 1);

        let id = state.collectibles.snapshot()[0].id.clone();
        let updates = apply(
            &mut state,
            &mut rng,
            &config,
            Command::Collect {
                conn: ConnectionId::from("A"),
                id: id.clone(),
            },
        );

        assert!(state.collectibles.is_empty());
        assert_eq!(updates.len(), 1);
        assert!(matches!(updates[0], Update::Collectibles(ref list) if list.is_empty()));

        // Second collect of the same id: no change, still one broadcast
        // of the (unchanged) field.
        let updates = apply(
            &mut state,
            &mut rng,
            &config,
            Command::Collect {
                conn: ConnectionId::from("A"),
                id,
            },
        );
        assert!(state.collectibles.is_empty());
        assert_eq!(updates.len(), 1);
        assert!(matches!(updates[0], Update::Collectibles(ref list) if list.is_empty()));
    }

    #[test]
    fn test_any_client_may_collect_any_item() {
        let (mut state, mut rng, config) = setup();
        connect(&mut state, &mut rng, &config, "A");
        connect(&mut state, &mut rng, &config, "B");
        apply(&mut state, &mut rng, &config, Command::SpawnTick);

        let id = state.collectibles.snapshot()[0].id.clone();

        // B collects an item A might be standing on; no ownership check.
        apply(
            &mut state,
            &mut rng,
            &config,
            Command::Collect {
                conn: ConnectionId::from("B"),
                id,
            },
        );
        assert!(state.collectibles.is_empty());
    }

    #[test]
    fn test_spawn_tick_empty_lobby_is_silent() {
        let (mut state, mut rng, config) = setup();

        let updates = apply(&mut state, &mut rng, &config, Command::SpawnTick);

        assert!(updates.is_empty());
        assert!(state.collectibles.is_empty());
    }

    #[test]
    fn test_spawn_tick_with_player_spawns_and_broadcasts() {
        let (mut state, mut rng, config) = setup();
        connect(&mut state, &mut rng, &config, "A");

        let updates = apply(&mut state, &mut rng, &config, Command::SpawnTick);

        assert_eq!(state.collectibles.len(), 1);
        assert_eq!(updates.len(), 1);
        assert!(matches!(updates[0], Update::Collectibles(ref list) if list.len() == 1));
    }

    #[test]
    fn test_spawn_tick_at_cap_is_silent() {
        let (mut state, mut rng, config) = setup();
        connect(&mut state, &mut rng, &config, "A");

        for _ in 0..5 {
            apply(&mut state, &mut rng, &config, Command::SpawnTick);
        }
        assert_eq!(state.collectibles.len(), 5);

        // Sixth tick: population cap reached, nothing spawns, nothing
        // is broadcast.
        let updates = apply(&mut state, &mut rng, &config, Command::SpawnTick);
        assert!(updates.is_empty());
        assert_eq!(state.collectibles.len(), 5);
    }
}
