//! Dot Link - A point-connecting puzzle game
//!
//! Core modules:
//! - `sim`: Path rules engine (validation, special points, scoring, round state)
//! - `game`: Single-threaded actor that feeds events into the rules engine
//! - `layout`: Seeded random point/obstacle generation
//! - `image_sampler`: Turns a bitmap into a free-form point set
//! - `platform`: Renderer, message sink and clock collaborators
//! - `settings`: Player preferences

pub mod game;
pub mod image_sampler;
pub mod layout;
pub mod platform;
pub mod settings;
pub mod sim;

pub use game::{Game, GameEvent, Progression};
pub use settings::{GameMode, Settings, Theme};

/// Game configuration constants
pub mod consts {
    /// Two accepted moves closer than this (ms) extend the combo
    pub const COMBO_WINDOW_MS: u64 = 1000;

    /// Scoring
    pub const BASE_COMPLETION_SCORE: u64 = 100;
    pub const BONUS_POINT_SCORE: u64 = 50;
    pub const COMBO_SCORE_MULTIPLIER: u64 = 10;

    /// Time budget (seconds)
    pub const MAX_TIME_LEFT: u32 = 60;
    pub const MIN_TIME_BUDGET: u32 = 30;
    pub const TIME_BUDGET_STEP: u32 = 5;
    /// Seconds granted by a time point
    pub const TIME_POINT_BONUS: u32 = 5;
    /// Remaining time above which a win promotes the level
    pub const LEVEL_UP_TIME_THRESHOLD: u32 = 30;

    /// Path length extension granted by a split point
    pub const SPLIT_EXTENSION: usize = 2;

    /// Level progression
    pub const MAX_LEVEL: u32 = 5;
    pub const MIN_POINT_COUNT: usize = 3;
    pub const MAX_POINT_COUNT: usize = 20;
    pub const POINT_COUNT_STEP: usize = 2;

    /// Layout
    pub const POINT_RADIUS: f32 = 8.0;
    pub const MIN_POINT_DISTANCE: f32 = 50.0;
    pub const DEFAULT_CANVAS_WIDTH: f32 = 800.0;
    pub const DEFAULT_CANVAS_HEIGHT: f32 = 600.0;
    pub const DEFAULT_POINT_COUNT: usize = 10;

    /// Periodic schedules
    pub const TICK_INTERVAL_MS: u32 = 1000;
}

/// Time budget for a fresh time-mode round at the given level
#[inline]
pub fn round_time_budget(level: u32) -> u32 {
    use consts::*;
    MAX_TIME_LEFT
        .saturating_sub(level * TIME_BUDGET_STEP)
        .max(MIN_TIME_BUDGET)
}

/// Time budget recomputed after a win (one level lower than `round_time_budget`)
#[inline]
pub fn adjusted_time_budget(level: u32) -> u32 {
    round_time_budget(level.saturating_sub(1))
}

/// Path cap for ordered levels: one and a half times the point count, rounded up
#[inline]
pub fn ordered_path_cap(point_count: usize) -> usize {
    (point_count * 3).div_ceil(2)
}
