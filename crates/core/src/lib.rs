//! Board engine crate - pure, deterministic, and testable
//!
//! This crate contains one player's simulation: the grid, the falling piece,
//! gravity, rotation, line clears, penalty rows, scoring and levels.
//! It has **zero dependencies** on networking or I/O, so it runs the same on a
//! headless bot, inside tests, or behind any renderer.
//!
//! # Module Structure
//!
//! - [`board`]: 10x20 grid with collision checks, line clearing and penalty rows
//! - [`engine`]: the [`BoardEngine`] state machine driven by ticks and commands
//! - [`pieces`]: shape matrices, 90° matrix rotation and horizontal wall kicks
//! - [`rng`]: seeded uniform piece selection and penalty hole placement
//! - [`scoring`]: `100 × level` per cleared row, fall interval per level
//! - [`snapshot`]: immutable engine view reported to the room
//!
//! # Game Rules
//!
//! - **Uniform randomizer**: every spawn is an independent draw over I, O, T, L, J, S, Z
//! - **Spawn**: horizontally centered on the top row, orientation 0
//! - **Rotation**: clockwise only, when the match enables it; kicks try -1, +1, -2, +2 columns
//! - **No lock delay**: a piece that cannot fall locks on the next gravity step
//! - **Levels**: raised by an external timer, never by clears
//!
//! # Example
//!
//! ```
//! use tetris_battle_core::{BoardEngine, EngineRules};
//! use tetris_battle_types::PlayerCommand;
//!
//! let mut engine = BoardEngine::new(12345, EngineRules::default());
//! engine.start();
//!
//! engine.apply_command(PlayerCommand::MoveRight);
//! engine.apply_command(PlayerCommand::Rotate);
//! let report = engine.apply_command(PlayerCommand::HardDrop);
//!
//! assert!(report.locked);
//! assert!(!engine.game_over());
//! ```

pub mod board;
pub mod engine;
pub mod pieces;
pub mod rng;
pub mod scoring;
pub mod snapshot;

pub use tetris_battle_types as types;

// Re-export commonly used types for convenience
pub use board::{penalty_row, Board, Grid, Row};
pub use engine::{BoardEngine, EngineReport, EngineRules};
pub use pieces::{try_rotate, Piece, Shape, KICK_OFFSETS};
pub use rng::PieceRandomizer;
pub use scoring::{calculate_line_score, next_fall_interval_ms};
pub use snapshot::{ActiveSnapshot, EngineSnapshot, PIECE_CELLS};
