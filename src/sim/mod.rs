//! Puzzle rules engine
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Time only enters as explicit timestamps
//! - Transitions return new state instead of mutating
//! - No rendering or platform dependencies

pub mod effects;
pub mod geometry;
pub mod scoring;
pub mod state;
pub mod tick;
pub mod validate;

pub use effects::{SpecialEffect, apply_special};
pub use geometry::{point_at, segments_intersect};
pub use scoring::{ComboState, ScoreBreakdown, completion_score};
pub use state::{
    GameMode, GamePhase, Obstacle, Outcome, Point, PointKind, Progression, RoundConfig, RoundId,
    RoundLayout, RoundState,
};
pub use tick::{
    Effect, RoundInput, StepResult, Transition, adjust_difficulty, advance_frame, step,
    submit_move, tick_timer,
};
pub use validate::{MoveRejection, crosses_path, validate};
