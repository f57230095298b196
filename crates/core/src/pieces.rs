//! Pieces module - shape matrices, matrix rotation and wall kicks
//!
//! A shape is a small matrix of filled/empty cells anchored at its top-left
//! corner. Rotation turns the matrix 90° clockwise around that anchor; when the
//! result does not fit, a fixed list of horizontal kicks is tried in order.

use crate::types::{PieceKind, BOARD_WIDTH};

/// Offset of a single mino relative to the piece anchor
pub type MinoOffset = (i8, i8);

/// Largest matrix side of any shape
const MAX_SIDE: usize = 4;

/// Horizontal offsets tried after the in-place rotation fails, in order
pub const KICK_OFFSETS: [i8; 4] = [-1, 1, -2, 2];

/// Shape matrix, `cells[row][col]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Shape {
    cells: [[bool; MAX_SIDE]; MAX_SIDE],
    width: u8,
    height: u8,
}

impl Shape {
    /// Build a shape from rows of 0/1 values
    fn from_rows(rows: &[&[u8]]) -> Self {
        let mut cells = [[false; MAX_SIDE]; MAX_SIDE];
        let mut width = 0;
        for (r, row) in rows.iter().enumerate() {
            width = width.max(row.len());
            for (c, v) in row.iter().enumerate() {
                cells[r][c] = *v != 0;
            }
        }
        Self {
            cells,
            width: width as u8,
            height: rows.len() as u8,
        }
    }

    /// Spawn-orientation matrix for a piece kind
    pub fn of(kind: PieceKind) -> Self {
        match kind {
            PieceKind::I => Self::from_rows(&[&[1, 1, 1, 1]]),
            PieceKind::O => Self::from_rows(&[&[1, 1], &[1, 1]]),
            PieceKind::T => Self::from_rows(&[&[1, 1, 1], &[0, 1, 0]]),
            PieceKind::L => Self::from_rows(&[&[1, 1, 1], &[1, 0, 0]]),
            PieceKind::J => Self::from_rows(&[&[1, 1, 1], &[0, 0, 1]]),
            PieceKind::S => Self::from_rows(&[&[0, 1, 1], &[1, 1, 0]]),
            PieceKind::Z => Self::from_rows(&[&[1, 1, 0], &[0, 1, 1]]),
        }
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    pub fn is_filled(&self, row: usize, col: usize) -> bool {
        row < self.height as usize && col < self.width as usize && self.cells[row][col]
    }

    /// The matrix turned 90° clockwise: `new[r][c] = old[h - 1 - c][r]`
    pub fn rotated_cw(&self) -> Self {
        let (w, h) = (self.width as usize, self.height as usize);
        let mut cells = [[false; MAX_SIDE]; MAX_SIDE];
        for (r, row) in cells.iter_mut().enumerate().take(w) {
            for (c, cell) in row.iter_mut().enumerate().take(h) {
                *cell = self.cells[h - 1 - c][r];
            }
        }
        Self {
            cells,
            width: self.height,
            height: self.width,
        }
    }

    /// Filled cells as (dx, dy) offsets, row-major
    pub fn minos(&self) -> impl Iterator<Item = MinoOffset> + '_ {
        (0..self.height as usize).flat_map(move |r| {
            (0..self.width as usize)
                .filter(move |&c| self.cells[r][c])
                .map(move |c| (c as i8, r as i8))
        })
    }

    /// Small matrix view, rows of 0/1
    pub fn to_rows(&self) -> Vec<Vec<u8>> {
        (0..self.height as usize)
            .map(|r| {
                (0..self.width as usize)
                    .map(|c| u8::from(self.cells[r][c]))
                    .collect()
            })
            .collect()
    }
}

/// Live falling piece
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub kind: PieceKind,
    pub shape: Shape,
    pub x: i8,
    pub y: i8,
    /// Quarter turns applied since spawn, 0..=3
    pub orientation: u8,
}

impl Piece {
    /// Create a piece horizontally centered on the top row, orientation 0
    pub fn spawn(kind: PieceKind) -> Self {
        let shape = Shape::of(kind);
        Self {
            kind,
            shape,
            x: spawn_x(&shape),
            y: 0,
            orientation: 0,
        }
    }

    /// Absolute board coordinates of every mino
    pub fn cells(&self) -> impl Iterator<Item = (i8, i8)> + '_ {
        self.shape.minos().map(|(dx, dy)| (self.x + dx, self.y + dy))
    }

    pub fn shifted(&self, dx: i8, dy: i8) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// Leftmost column that centers `shape` horizontally
pub fn spawn_x(shape: &Shape) -> i8 {
    (BOARD_WIDTH / 2) as i8 - (shape.width() / 2) as i8
}

/// Try to rotate a piece clockwise with wall kicks
///
/// `is_placeable(shape, x, y)` decides whether a candidate fits. The rotated
/// shape is tried at the current anchor first, then at each of
/// [`KICK_OFFSETS`]. Returns None if every candidate fails.
pub fn try_rotate(
    piece: &Piece,
    is_placeable: impl Fn(&Shape, i8, i8) -> bool,
) -> Option<Piece> {
    let rotated = piece.shape.rotated_cw();
    let orientation = (piece.orientation + 1) % 4;

    std::iter::once(0)
        .chain(KICK_OFFSETS)
        .find(|&dx| is_placeable(&rotated, piece.x + dx, piece.y))
        .map(|dx| Piece {
            shape: rotated,
            x: piece.x + dx,
            orientation,
            ..*piece
        })
}
