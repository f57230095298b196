use crate::board::Grid;
use crate::pieces::Piece;
use crate::types::{PieceKind, BOARD_HEIGHT, BOARD_WIDTH};

/// Minos in every piece
pub const PIECE_CELLS: usize = 4;

/// Live piece as reported alongside the board.
///
/// `cells` are absolute board coordinates `(x, y)`; rows above the board are negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActiveSnapshot {
    pub kind: PieceKind,
    pub orientation: u8,
    pub x: i8,
    pub y: i8,
    pub cells: [(i8, i8); PIECE_CELLS],
}

impl From<Piece> for ActiveSnapshot {
    fn from(value: Piece) -> Self {
        let mut cells = [(value.x, value.y); PIECE_CELLS];
        for (slot, cell) in cells.iter_mut().zip(value.cells()) {
            *slot = cell;
        }
        Self {
            kind: value.kind,
            orientation: value.orientation,
            x: value.x,
            y: value.y,
            cells,
        }
    }
}

/// Immutable view of one engine, as reported to the room.
///
/// `board` holds locked cells only; the live piece is carried in `active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EngineSnapshot {
    pub board: Grid,
    pub active: Option<ActiveSnapshot>,
    pub score: u32,
    pub level: u32,
    pub fall_interval_ms: u32,
    pub game_over: bool,
}

impl Default for EngineSnapshot {
    fn default() -> Self {
        Self {
            board: [[0u8; BOARD_WIDTH as usize]; BOARD_HEIGHT as usize],
            active: None,
            score: 0,
            level: 0,
            fall_interval_ms: 0,
            game_over: false,
        }
    }
}
