//! Scoring module - line-clear points and the level-driven fall interval
//!
//! Each cleared row is worth `LINE_CLEAR_POINTS * level`; there are no multi-line
//! bonuses. Levels are raised by a timer outside the engine, never by clears.

use crate::types::{Difficulty, LINE_CLEAR_POINTS, MIN_FALL_INTERVAL_MS};

/// Points for clearing `lines` rows in a single pass at `level`
pub fn calculate_line_score(lines: u32, level: u32) -> u32 {
    LINE_CLEAR_POINTS.saturating_mul(level).saturating_mul(lines)
}

/// Fall interval after one level-up from `previous_ms`
pub fn next_fall_interval_ms(previous_ms: u32, difficulty: Difficulty) -> u32 {
    previous_ms
        .saturating_sub(difficulty.fall_interval_decrement_ms())
        .max(MIN_FALL_INTERVAL_MS)
}
