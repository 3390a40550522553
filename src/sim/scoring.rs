//! Combo tracking and completion scoring

use serde::{Deserialize, Serialize};

use super::state::GameMode;
use crate::consts::*;

/// Consecutive quick moves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ComboState {
    pub count: u32,
    /// Timestamp (ms) of the previous accepted move
    pub last_move_ms: Option<u64>,
}

impl ComboState {
    /// Record an accepted move at `now_ms` and return the new combo count
    ///
    /// A move within `COMBO_WINDOW_MS` of the previous one extends the combo;
    /// anything slower (or the first move) starts over at 1.
    pub fn register_move(&mut self, now_ms: u64) -> u32 {
        let quick = self
            .last_move_ms
            .is_some_and(|last| now_ms.saturating_sub(last) < COMBO_WINDOW_MS);

        self.count = if quick { self.count + 1 } else { 1 };
        self.last_move_ms = Some(now_ms);
        self.count
    }
}

/// Score awarded for closing the path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub base: u64,
    pub time_bonus: u64,
    pub bonus: u64,
    pub combo_bonus: u64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> u64 {
        self.base + self.time_bonus + self.bonus + self.combo_bonus
    }

    /// Everything beyond the base award
    pub fn extra(&self) -> u64 {
        self.bonus + self.combo_bonus
    }
}

/// Compute the completion award
///
/// `bonus_visited` is the number of bonus points on the path. Time bonus is
/// the remaining seconds, and only in time mode.
pub fn completion_score(
    bonus_visited: usize,
    combo: u32,
    mode: GameMode,
    time_left: u32,
) -> ScoreBreakdown {
    let time_bonus = match mode {
        GameMode::Time => u64::from(time_left),
        GameMode::Free => 0,
    };

    ScoreBreakdown {
        base: BASE_COMPLETION_SCORE,
        time_bonus,
        bonus: BONUS_POINT_SCORE * bonus_visited as u64,
        combo_bonus: u64::from(combo) * COMBO_SCORE_MULTIPLIER,
    }
}
