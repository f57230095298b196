//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! All types are pure data structures with no external dependencies, making them
//! usable in any context (board engine, room coordinator, wire protocol).
//!
//! # Board Dimensions
//!
//! - **Width**: 10 columns (indexed 0-9)
//! - **Height**: 20 rows (indexed 0-19, row 0 at the top)
//!
//! # Timing Constants
//!
//! Timing values are in milliseconds:
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `BASE_FALL_INTERVAL_MS` | 500 | Gravity step at level 1 |
//! | `MIN_FALL_INTERVAL_MS` | 100 | Floor for the gravity step |
//! | `DEFAULT_LEVEL_UP_INTERVAL_MS` | 60000 | Default level-up timer |
//! | `MIN_LEVEL_UP_INTERVAL_MS` | 1000 | Floor for a requested level-up timer |
//!
//! # Difficulty Tiers
//!
//! Each level-up shortens the gravity step by the tier's decrement:
//!
//! | Tier | Decrement |
//! |------|-----------|
//! | Easy | 25ms |
//! | Normal | 50ms |
//! | Hard | 100ms |
//!
//! # Examples
//!
//! ```
//! use tetris_battle_types::{Difficulty, PieceKind, PlayerCommand, BOARD_HEIGHT, BOARD_WIDTH};
//!
//! assert_eq!(PieceKind::from_str("t"), Some(PieceKind::T));
//! assert_eq!(PlayerCommand::from_str("hardDrop"), Some(PlayerCommand::HardDrop));
//! assert_eq!(Difficulty::Hard.fall_interval_decrement_ms(), 100);
//!
//! assert_eq!(BOARD_WIDTH, 10);
//! assert_eq!(BOARD_HEIGHT, 20);
//! ```

/// Board width in cells (10 columns)
pub const BOARD_WIDTH: u8 = 10;

/// Board height in cells (20 rows)
pub const BOARD_HEIGHT: u8 = 20;

/// Gravity interval at level 1 (500ms per row)
pub const BASE_FALL_INTERVAL_MS: u32 = 500;

/// Absolute minimum gravity interval (100ms)
pub const MIN_FALL_INTERVAL_MS: u32 = 100;

/// Default interval of the level-up timer (one minute)
pub const DEFAULT_LEVEL_UP_INTERVAL_MS: u32 = 60_000;

/// Shortest level-up interval a room accepts; smaller requests are raised to it
pub const MIN_LEVEL_UP_INTERVAL_MS: u32 = 1_000;

/// Points per cleared row, multiplied by the current level
pub const LINE_CLEAR_POINTS: u32 = 100;

/// Starting level of every match
pub const START_LEVEL: u32 = 1;

/// The seven piece kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    O,
    T,
    L,
    J,
    S,
    Z,
}

impl PieceKind {
    /// Every kind, in the order the randomizer indexes them
    pub const ALL: [PieceKind; 7] = [
        PieceKind::I,
        PieceKind::O,
        PieceKind::T,
        PieceKind::L,
        PieceKind::J,
        PieceKind::S,
        PieceKind::Z,
    ];

    /// Parse piece kind from string (case-insensitive)
    ///
    /// # Examples
    ///
    /// ```
    /// use tetris_battle_types::PieceKind;
    ///
    /// assert_eq!(PieceKind::from_str("i"), Some(PieceKind::I));
    /// assert_eq!(PieceKind::from_str("Z"), Some(PieceKind::Z));
    /// assert_eq!(PieceKind::from_str("unknown"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "i" => Some(PieceKind::I),
            "o" => Some(PieceKind::O),
            "t" => Some(PieceKind::T),
            "l" => Some(PieceKind::L),
            "j" => Some(PieceKind::J),
            "s" => Some(PieceKind::S),
            "z" => Some(PieceKind::Z),
            _ => None,
        }
    }

    /// Convert to lowercase string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            PieceKind::I => "i",
            PieceKind::O => "o",
            PieceKind::T => "t",
            PieceKind::L => "l",
            PieceKind::J => "j",
            PieceKind::S => "s",
            PieceKind::Z => "z",
        }
    }
}

/// A cell on the game board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Cell {
    #[default]
    Empty,
    Filled,
}

impl Cell {
    pub fn is_filled(self) -> bool {
        matches!(self, Cell::Filled)
    }

    /// Wire encoding: 0 = empty, 1 = filled
    pub fn as_u8(self) -> u8 {
        match self {
            Cell::Empty => 0,
            Cell::Filled => 1,
        }
    }

    /// Any non-zero value decodes as filled
    pub fn from_u8(v: u8) -> Self {
        if v == 0 {
            Cell::Empty
        } else {
            Cell::Filled
        }
    }
}

/// Horizontal movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Column delta for one step in this direction
    pub fn dx(self) -> i8 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }
}

/// Difficulty tier chosen in the match options
///
/// The tier only controls how much each level-up shortens the fall interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    /// Milliseconds removed from the fall interval on every level-up
    pub fn fall_interval_decrement_ms(self) -> u32 {
        match self {
            Difficulty::Easy => 25,
            Difficulty::Normal => 50,
            Difficulty::Hard => 100,
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "normal" => Some(Difficulty::Normal),
            "hard" => Some(Difficulty::Hard),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }
}

/// Discrete input commands a player can issue against their own board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Move piece one cell left
    MoveLeft,
    /// Move piece one cell right
    MoveRight,
    /// Advance gravity by one step
    SoftDrop,
    /// Rotate piece 90° clockwise (only when rotation is enabled)
    Rotate,
    /// Drop to the lowest placeable row and lock immediately
    HardDrop,
}

impl PlayerCommand {
    /// Parse command from string (case-insensitive camelCase)
    ///
    /// # Examples
    ///
    /// ```
    /// use tetris_battle_types::PlayerCommand;
    ///
    /// assert_eq!(PlayerCommand::from_str("moveLeft"), Some(PlayerCommand::MoveLeft));
    /// assert_eq!(PlayerCommand::from_str("ROTATE"), Some(PlayerCommand::Rotate));
    /// assert_eq!(PlayerCommand::from_str("hold"), None);
    /// ```
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "moveleft" => Some(PlayerCommand::MoveLeft),
            "moveright" => Some(PlayerCommand::MoveRight),
            "softdrop" => Some(PlayerCommand::SoftDrop),
            "rotate" => Some(PlayerCommand::Rotate),
            "harddrop" => Some(PlayerCommand::HardDrop),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlayerCommand::MoveLeft => "moveLeft",
            PlayerCommand::MoveRight => "moveRight",
            PlayerCommand::SoftDrop => "softDrop",
            PlayerCommand::Rotate => "rotate",
            PlayerCommand::HardDrop => "hardDrop",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timing_defaults() {
        assert_eq!(BASE_FALL_INTERVAL_MS, 500);
        assert_eq!(MIN_FALL_INTERVAL_MS, 100);
        assert_eq!(LINE_CLEAR_POINTS, 100);
        assert_eq!(START_LEVEL, 1);
    }

    #[test]
    fn cell_wire_encoding() {
        assert_eq!(Cell::Filled.as_u8(), 1);
        assert_eq!(Cell::Empty.as_u8(), 0);
        assert_eq!(Cell::from_u8(7), Cell::Filled);
        assert_eq!(Cell::from_u8(0), Cell::Empty);
    }

    #[test]
    fn difficulty_round_trips_through_str() {
        for d in [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard] {
            assert_eq!(Difficulty::from_str(d.as_str()), Some(d));
        }
        assert!(Difficulty::Easy.fall_interval_decrement_ms() < Difficulty::Hard.fall_interval_decrement_ms());
    }

    #[test]
    fn every_piece_kind_parses() {
        for kind in PieceKind::ALL {
            assert_eq!(PieceKind::from_str(kind.as_str()), Some(kind));
        }
    }
}
