//! Board module - manages the game grid
//!
//! The board is a 10x20 grid where each cell is either empty or filled.
//! Uses a flat array for better cache locality and zero-allocation.
//! Coordinates: (x, y) where x ranges 0..9 (left to right), y ranges 0..19 (top to bottom)

use crate::types::{Cell, BOARD_HEIGHT, BOARD_WIDTH};

/// Total number of cells on the board
const BOARD_SIZE: usize = (BOARD_WIDTH as usize) * (BOARD_HEIGHT as usize);

const WIDTH: usize = BOARD_WIDTH as usize;
const HEIGHT: usize = BOARD_HEIGHT as usize;

/// One board row, left to right
pub type Row = [Cell; WIDTH];

/// Wire-friendly grid, 0 = empty and 1 = filled
pub type Grid = [[u8; WIDTH]; HEIGHT];

/// The game board - 10 columns x 20 rows using flat array storage
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    /// Flat array of cells, row-major order (y * WIDTH + x)
    cells: [Cell; BOARD_SIZE],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Self {
            cells: [Cell::Empty; BOARD_SIZE],
        }
    }

    /// Calculate flat index from (x, y) coordinates
    #[inline(always)]
    fn index(x: i8, y: i8) -> Option<usize> {
        if x < 0 || x >= BOARD_WIDTH as i8 || y < 0 || y >= BOARD_HEIGHT as i8 {
            return None;
        }
        Some((y as usize) * WIDTH + (x as usize))
    }

    pub fn width(&self) -> u8 {
        BOARD_WIDTH
    }

    pub fn height(&self) -> u8 {
        BOARD_HEIGHT
    }

    /// Get cell at position (x, y)
    /// Returns None if out of bounds
    pub fn get(&self, x: i8, y: i8) -> Option<Cell> {
        Self::index(x, y).map(|idx| self.cells[idx])
    }

    /// Set cell at position (x, y)
    /// Returns false if out of bounds
    pub fn set(&mut self, x: i8, y: i8, cell: Cell) -> bool {
        match Self::index(x, y) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    /// Check if position is occupied (within bounds and filled)
    pub fn is_occupied(&self, x: i8, y: i8) -> bool {
        matches!(self.get(x, y), Some(Cell::Filled))
    }

    /// Check whether a mino may sit at (x, y).
    ///
    /// Columns must be inside the board and rows must be above the floor.
    /// Rows above the ceiling (negative y) are never checked for occupancy.
    pub fn is_free(&self, x: i8, y: i8) -> bool {
        if x < 0 || x >= BOARD_WIDTH as i8 || y >= BOARD_HEIGHT as i8 {
            return false;
        }
        y < 0 || !self.is_occupied(x, y)
    }

    /// Check if a row is completely filled
    pub fn is_row_full(&self, y: usize) -> bool {
        if y >= HEIGHT {
            return false;
        }
        let start = y * WIDTH;
        self.cells[start..start + WIDTH].iter().all(|c| c.is_filled())
    }

    /// Copy of row `y`, or None if out of bounds
    pub fn row(&self, y: usize) -> Option<Row> {
        if y >= HEIGHT {
            return None;
        }
        let mut row = [Cell::Empty; WIDTH];
        row.copy_from_slice(&self.cells[y * WIDTH..(y + 1) * WIDTH]);
        Some(row)
    }

    /// Remove every full row, shifting the rows above down and refilling the top
    /// with empty rows. Returns the number of rows removed.
    ///
    /// Two-pointer scan from the bottom: a row that slides into a cleared slot is
    /// examined on its own, so stacked full rows are all removed in one pass.
    pub fn clear_full_rows(&mut self) -> usize {
        let mut cleared = 0;
        let mut write_y = HEIGHT;

        for read_y in (0..HEIGHT).rev() {
            if self.is_row_full(read_y) {
                cleared += 1;
            } else {
                write_y -= 1;
                if write_y != read_y {
                    let src = read_y * WIDTH;
                    self.cells.copy_within(src..src + WIDTH, write_y * WIDTH);
                }
            }
        }

        for cell in &mut self.cells[..write_y * WIDTH] {
            *cell = Cell::Empty;
        }

        cleared
    }

    /// Drop the top `rows.len()` rows and append `rows` at the bottom, in order.
    ///
    /// Content in the removed top rows is discarded. Extra rows beyond the board
    /// height are ignored.
    pub fn push_rows_from_bottom(&mut self, rows: &[Row]) {
        let n = rows.len().min(HEIGHT);
        if n == 0 {
            return;
        }
        self.cells.copy_within(n * WIDTH.., 0);
        for (i, row) in rows[..n].iter().enumerate() {
            let start = (HEIGHT - n + i) * WIDTH;
            self.cells[start..start + WIDTH].copy_from_slice(row);
        }
    }

    /// Fill every cell of `minos` (absolute coordinates). Cells outside the
    /// visible grid are skipped. Returns false if any mino fell outside.
    pub fn fill(&mut self, minos: impl IntoIterator<Item = (i8, i8)>) -> bool {
        let mut all_inside = true;
        for (x, y) in minos {
            all_inside &= self.set(x, y, Cell::Filled);
        }
        all_inside
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Count of filled cells
    pub fn filled_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_filled()).count()
    }

    /// Clear the entire board
    pub fn clear(&mut self) {
        self.cells = [Cell::Empty; BOARD_SIZE];
    }

    /// Write the board into a 0/1 grid
    pub fn write_u8_grid(&self, out: &mut Grid) {
        for (y, row) in out.iter_mut().enumerate() {
            for (x, v) in row.iter_mut().enumerate() {
                *v = self.cells[y * WIDTH + x].as_u8();
            }
        }
    }

    pub fn to_grid(&self) -> Grid {
        let mut grid = [[0u8; WIDTH]; HEIGHT];
        self.write_u8_grid(&mut grid);
        grid
    }

    /// Build a board from a 0/1 grid (any non-zero value is filled)
    pub fn from_grid(grid: &Grid) -> Self {
        let mut board = Self::new();
        for (y, row) in grid.iter().enumerate() {
            for (x, v) in row.iter().enumerate() {
                board.cells[y * WIDTH + x] = Cell::from_u8(*v);
            }
        }
        board
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

/// A row with every cell filled except `hole`
pub fn penalty_row(hole: usize) -> Row {
    let mut row = [Cell::Filled; WIDTH];
    if hole < WIDTH {
        row[hole] = Cell::Empty;
    }
    row
}
