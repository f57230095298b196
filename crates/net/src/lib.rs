//! Room networking - multiplayer coordination over TCP with a JSON protocol
//!
//! Players connect over TCP, join a named room, and once at least two are
//! present any of them can start a match. Each client runs its own
//! [`BoardEngine`](crate::core::BoardEngine) and reports its board after every
//! change; the server relays opponent boards, forwards line clears as penalty
//! rows and declares a winner once every participant has topped out.
//!
//! # Protocol Overview
//!
//! The server speaks a **line-delimited JSON protocol**: one object per line,
//! tagged by `"type"`, camelCase fields.
//!
//! 1. **Connection**: the server sends `welcome` with the connection's player id
//! 2. **Lobby**: `joinRoom` puts the player in a room; everyone there gets
//!    `playerList` and `roomInfo`
//! 3. **Match**: `startGame` (two or more players) broadcasts `gameStarted`
//! 4. **Play**: `updateBoard` fans out as `updateOpponentBoard`, plus
//!    `addPenaltyLines` when rows were cleared and penalties are on
//! 5. **End**: after the last `gameOver` (or a forfeit) the room gets `gameEnded`
//!
//! # Architecture
//!
//! - [`server`]: TCP accept loop, per-connection reader and writer tasks
//! - [`coordinator`]: the single task that owns every room and applies commands in order
//! - [`directory`]: named rooms, the default room, and stale-room reaping
//! - [`room`]: the per-room state machine and winner selection
//! - [`client`]: player-side driver for one engine
//!
//! # Environment Variables
//!
//! - `TETRIS_BATTLE_HOST` / `TETRIS_BATTLE_PORT`: listen address (default 127.0.0.1:3000)
//! - `TETRIS_BATTLE_DEFAULT_ROOM`: the room that always exists (default `main`)
//! - `TETRIS_BATTLE_ROOM_MAX_AGE_SECS` / `TETRIS_BATTLE_REAP_INTERVAL_SECS`: stale room sweep

pub use tetris_battle_core as core;
pub use tetris_battle_types as types;

pub mod client;
pub mod config;
pub mod coordinator;
pub mod directory;
pub mod error;
pub mod protocol;
pub mod room;
pub mod runtime;
pub mod server;

pub use client::{run_client, ClientOptions, MatchClient, MatchOutcome};
pub use config::ServerConfig;
pub use coordinator::Coordinator;
pub use directory::SessionDirectory;
pub use error::SessionError;
pub use protocol::*;
pub use room::{Audience, Dispatch, Room, RoomPhase};
pub use runtime::{InboundCommand, InboundPayload, OutboundMessage};
pub use server::{run_server, serve};
