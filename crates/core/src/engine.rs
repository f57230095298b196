//! Board engine - one player's simulation
//!
//! This module ties together the board, pieces, randomizer and scoring.
//! It handles gravity, movement, rotation, locking, line clears, penalty rows
//! and level-ups. Every mutating operation returns an [`EngineReport`] so the
//! driver can decide what to send to the room; nothing here does I/O.
//!
//! All operations are total. Once `game_over` is set they are no-ops.

use arrayvec::ArrayVec;

use crate::board::{penalty_row, Board, Row};
use crate::pieces::{try_rotate, Piece, Shape};
use crate::rng::PieceRandomizer;
use crate::scoring::{calculate_line_score, next_fall_interval_ms};
use crate::snapshot::{ActiveSnapshot, EngineSnapshot};
use crate::types::*;

const HEIGHT: usize = BOARD_HEIGHT as usize;

/// Per-match rules taken from the room's options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineRules {
    pub rotation_enabled: bool,
    pub difficulty: Difficulty,
}

impl Default for EngineRules {
    fn default() -> Self {
        Self {
            rotation_enabled: true,
            difficulty: Difficulty::Normal,
        }
    }
}

/// What an operation did to the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineReport {
    /// The live piece changed position or orientation
    pub moved: bool,
    /// A piece was committed into the board
    pub locked: bool,
    /// Rows removed by the lock (0 when nothing locked)
    pub lines_cleared: u32,
    /// This operation ended the game
    pub topped_out: bool,
}

impl EngineReport {
    /// Whether the visible state changed and a snapshot is worth sending
    pub fn changed(&self) -> bool {
        self.moved || self.locked || self.topped_out
    }
}

/// One player's board simulation
#[derive(Debug, Clone)]
pub struct BoardEngine {
    board: Board,
    piece: Option<Piece>,
    randomizer: PieceRandomizer,
    rules: EngineRules,
    score: u32,
    level: u32,
    fall_interval_ms: u32,
    game_over: bool,
    started: bool,
}

impl BoardEngine {
    /// Create an engine with a deterministic piece sequence
    pub fn new(seed: u64, rules: EngineRules) -> Self {
        Self {
            board: Board::new(),
            piece: None,
            randomizer: PieceRandomizer::new(seed),
            rules,
            score: 0,
            level: START_LEVEL,
            fall_interval_ms: BASE_FALL_INTERVAL_MS,
            game_over: false,
            started: false,
        }
    }

    /// Start the game and spawn the first piece
    pub fn start(&mut self) -> EngineReport {
        if self.started {
            return EngineReport::default();
        }
        self.started = true;
        self.spawn_and_check()
    }

    /// Clear everything for a new match under `rules`. The piece sequence continues.
    pub fn reset(&mut self, rules: EngineRules) {
        self.board.clear();
        self.piece = None;
        self.rules = rules;
        self.score = 0;
        self.level = START_LEVEL;
        self.fall_interval_ms = BASE_FALL_INTERVAL_MS;
        self.game_over = false;
        self.started = false;
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn game_over(&self) -> bool {
        self.game_over
    }

    /// Seed the piece sequence was created from
    pub fn seed(&self) -> u64 {
        self.randomizer.seed()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn fall_interval_ms(&self) -> u32 {
        self.fall_interval_ms
    }

    pub fn rules(&self) -> EngineRules {
        self.rules
    }

    pub fn piece(&self) -> Option<Piece> {
        self.piece
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }

    /// Replace the live piece (tests and replays)
    pub fn set_piece(&mut self, piece: Option<Piece>) {
        self.piece = piece;
    }

    pub fn snapshot(&self) -> EngineSnapshot {
        EngineSnapshot {
            board: self.board.to_grid(),
            active: self.piece.map(ActiveSnapshot::from),
            score: self.score,
            level: self.level,
            fall_interval_ms: self.fall_interval_ms,
            game_over: self.game_over,
        }
    }

    /// Draw a uniformly random kind and make it the live piece at the spawn position.
    ///
    /// Placement is not checked here; see [`BoardEngine::tick`].
    pub fn spawn_piece(&mut self) -> Piece {
        let piece = Piece::spawn(self.randomizer.next_kind());
        self.piece = Some(piece);
        piece
    }

    /// True iff every filled cell of `shape` anchored at (x, y) is inside the
    /// columns, above the floor, and not on a filled cell. Rows above the
    /// ceiling are never checked for occupancy.
    pub fn can_place(&self, shape: &Shape, x: i8, y: i8) -> bool {
        shape
            .minos()
            .all(|(dx, dy)| self.board.is_free(x + dx, y + dy))
    }

    fn fits(&self, piece: &Piece) -> bool {
        self.can_place(&piece.shape, piece.x, piece.y)
    }

    /// Live piece, or None when the game is over or not running.
    ///
    /// A piece that no longer fits where it stands (penalty rows pushed the
    /// stack into it) tops the game out here.
    fn live_piece(&mut self) -> Result<Option<Piece>, EngineReport> {
        if self.game_over {
            return Ok(None);
        }
        let Some(piece) = self.piece else {
            return Ok(None);
        };
        if !self.fits(&piece) {
            self.top_out();
            return Err(EngineReport {
                topped_out: true,
                ..EngineReport::default()
            });
        }
        Ok(Some(piece))
    }

    fn top_out(&mut self) {
        self.game_over = true;
        self.piece = None;
    }

    fn spawn_and_check(&mut self) -> EngineReport {
        let piece = self.spawn_piece();
        if self.fits(&piece) {
            EngineReport::default()
        } else {
            self.top_out();
            EngineReport {
                topped_out: true,
                ..EngineReport::default()
            }
        }
    }

    /// Gravity step: move down one row, or lock, clear and spawn.
    pub fn tick(&mut self) -> EngineReport {
        let piece = match self.live_piece() {
            Ok(Some(p)) => p,
            Ok(None) => return EngineReport::default(),
            Err(report) => return report,
        };

        let below = piece.shifted(0, 1);
        if self.fits(&below) {
            self.piece = Some(below);
            return EngineReport {
                moved: true,
                ..EngineReport::default()
            };
        }

        self.lock_piece(piece)
    }

    /// Commit `piece` into the board, clear rows and spawn the next piece
    fn lock_piece(&mut self, piece: Piece) -> EngineReport {
        self.board.fill(piece.cells());
        self.piece = None;

        let lines_cleared = self.clear_lines();
        let spawned = self.spawn_and_check();

        EngineReport {
            moved: false,
            locked: true,
            lines_cleared,
            topped_out: spawned.topped_out,
        }
    }

    /// Shift the live piece one column if the target is placeable
    pub fn move_horizontal(&mut self, direction: Direction) -> EngineReport {
        let piece = match self.live_piece() {
            Ok(Some(p)) => p,
            Ok(None) => return EngineReport::default(),
            Err(report) => return report,
        };

        let shifted = piece.shifted(direction.dx(), 0);
        if !self.fits(&shifted) {
            return EngineReport::default();
        }
        self.piece = Some(shifted);
        EngineReport {
            moved: true,
            ..EngineReport::default()
        }
    }

    /// Rotate 90° clockwise with wall kicks, if the match allows rotation
    pub fn rotate(&mut self) -> EngineReport {
        if !self.rules.rotation_enabled {
            return EngineReport::default();
        }
        let piece = match self.live_piece() {
            Ok(Some(p)) => p,
            Ok(None) => return EngineReport::default(),
            Err(report) => return report,
        };

        match try_rotate(&piece, |shape, x, y| self.can_place(shape, x, y)) {
            Some(rotated) => {
                self.piece = Some(rotated);
                EngineReport {
                    moved: true,
                    ..EngineReport::default()
                }
            }
            None => EngineReport::default(),
        }
    }

    /// Drop to the lowest placeable row, then lock immediately
    pub fn hard_drop(&mut self) -> EngineReport {
        let mut piece = match self.live_piece() {
            Ok(Some(p)) => p,
            Ok(None) => return EngineReport::default(),
            Err(report) => return report,
        };

        while self.fits(&piece.shifted(0, 1)) {
            piece = piece.shifted(0, 1);
        }

        self.lock_piece(piece)
    }

    /// Remove every full row and credit `LINE_CLEAR_POINTS * level` per row
    pub fn clear_lines(&mut self) -> u32 {
        let cleared = self.board.clear_full_rows() as u32;
        self.score = self
            .score
            .saturating_add(calculate_line_score(cleared, self.level));
        cleared
    }

    /// Remove the top `n` rows and append `n` rows built by `fill` at the bottom.
    ///
    /// `fill(i)` builds the i-th appended row, topmost first. A resulting
    /// overlap with the live piece is detected on the next operation, not here.
    pub fn apply_penalty_rows(&mut self, n: usize, mut fill: impl FnMut(usize) -> Row) {
        if self.game_over || n == 0 {
            return;
        }
        let rows: ArrayVec<Row, HEIGHT> = (0..n.min(HEIGHT)).map(&mut fill).collect();
        self.board.push_rows_from_bottom(&rows);
    }

    /// Append `n` penalty rows, each filled except one random hole
    pub fn add_penalty_lines(&mut self, n: usize) {
        if self.game_over || n == 0 {
            return;
        }
        let rows: ArrayVec<Row, HEIGHT> = (0..n.min(HEIGHT))
            .map(|_| penalty_row(self.randomizer.hole_column()))
            .collect();
        self.board.push_rows_from_bottom(&rows);
    }

    /// Raise the level and shorten the fall interval down to the floor
    pub fn increase_level(&mut self) {
        if self.game_over {
            return;
        }
        self.level += 1;
        self.fall_interval_ms = next_fall_interval_ms(self.fall_interval_ms, self.rules.difficulty);
    }

    /// Apply one input command
    pub fn apply_command(&mut self, command: PlayerCommand) -> EngineReport {
        match command {
            PlayerCommand::MoveLeft => self.move_horizontal(Direction::Left),
            PlayerCommand::MoveRight => self.move_horizontal(Direction::Right),
            PlayerCommand::SoftDrop => self.tick(),
            PlayerCommand::Rotate => self.rotate(),
            PlayerCommand::HardDrop => self.hard_drop(),
        }
    }
}
