//! Round state and core puzzle types
//!
//! Everything one round needs lives in `RoundState`. Transitions in
//! `tick.rs` never mutate a state in place; they return a new one.

use std::collections::BTreeSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::scoring::ComboState;
use crate::consts::*;
use crate::{ordered_path_cap, round_time_budget};

/// Current phase of a round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GamePhase {
    /// No round running (before the first start, or after reset)
    #[default]
    Idle,
    /// Accepting moves
    Playing,
    /// Path closed through every point
    Won,
    /// Countdown reached zero (time mode)
    TimedOut,
    /// New segment crossed the existing path
    Collided,
}

impl GamePhase {
    /// Round is over and needs `start`/`reset` to continue
    pub fn is_terminal(&self) -> bool {
        matches!(self, GamePhase::Won | GamePhase::TimedOut | GamePhase::Collided)
    }
}

/// How a round ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Won,
    TimedOut,
    Collided,
}

impl Outcome {
    pub fn phase(&self) -> GamePhase {
        match self {
            Outcome::Won => GamePhase::Won,
            Outcome::TimedOut => GamePhase::TimedOut,
            Outcome::Collided => GamePhase::Collided,
        }
    }
}

/// Play mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    /// No clock
    #[default]
    Free,
    /// Countdown; remaining seconds add to the completion score
    Time,
}

impl GameMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameMode::Free => "free",
            GameMode::Time => "time",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "free" => Some(GameMode::Free),
            "time" | "timed" => Some(GameMode::Time),
            _ => None,
        }
    }
}

/// Point kinds (assigned once at layout time)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PointKind {
    #[default]
    Normal,
    /// Entering jumps the path to the paired point
    Teleport { paired: usize },
    /// Raises the path length cap
    Split,
    /// Adds seconds to the countdown
    Time,
}

/// A clickable point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub pos: Vec2,
    pub kind: PointKind,
}

impl Point {
    pub fn new(pos: Vec2) -> Self {
        Self {
            pos,
            kind: PointKind::Normal,
        }
    }

    pub fn with_kind(pos: Vec2, kind: PointKind) -> Self {
        Self { pos, kind }
    }
}

/// A drifting rectangle (moving-obstacle variant, drawn only)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    /// Pixels per second
    pub vel: Vec2,
}

impl Obstacle {
    /// Move by `vel * dt`, reversing an axis when an edge reaches the canvas border
    pub fn advance(&mut self, dt: f32, bounds: Vec2) {
        self.pos += self.vel * dt;

        if self.pos.x <= 0.0 || self.pos.x + self.size.x >= bounds.x {
            self.vel.x = -self.vel.x;
        }
        if self.pos.y <= 0.0 || self.pos.y + self.size.y >= bounds.y {
            self.vel.y = -self.vel.y;
        }
    }
}

/// Output of a layout generator, consumed as-is at round start
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoundLayout {
    pub points: Vec<Point>,
    pub obstacles: Vec<Obstacle>,
    pub bonus: BTreeSet<usize>,
}

impl RoundLayout {
    /// Plain points with no specials, bonuses or obstacles
    pub fn free_form(positions: impl IntoIterator<Item = Vec2>) -> Self {
        Self {
            points: positions.into_iter().map(Point::new).collect(),
            ..Default::default()
        }
    }
}

/// Rules active for one round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundConfig {
    pub mode: GameMode,
    /// 1..=MAX_LEVEL
    pub level: u32,
    /// Path may not grow past this many entries
    pub max_path_length: Option<usize>,
    /// Points must be visited in ascending index order
    pub required_order: bool,
}

impl RoundConfig {
    /// Unconstrained rules (level 1, image rounds)
    pub fn free_form(mode: GameMode, level: u32) -> Self {
        Self {
            mode,
            level,
            max_path_length: None,
            required_order: false,
        }
    }

    /// Rules derived from the level: ordering and a path cap from level 2 on
    pub fn for_level(mode: GameMode, level: u32, point_count: usize) -> Self {
        if level >= 2 {
            Self {
                mode,
                level,
                max_path_length: Some(ordered_path_cap(point_count)),
                required_order: true,
            }
        } else {
            Self::free_form(mode, level)
        }
    }
}

/// Cross-round difficulty (level and next round's point count)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progression {
    pub level: u32,
    pub point_count: usize,
}

impl Default for Progression {
    fn default() -> Self {
        Self {
            level: 1,
            point_count: DEFAULT_POINT_COUNT,
        }
    }
}

impl Progression {
    pub fn new(level: u32, point_count: usize) -> Self {
        Self {
            level: level.clamp(1, MAX_LEVEL),
            point_count: point_count.clamp(MIN_POINT_COUNT, MAX_POINT_COUNT),
        }
    }
}

/// Identifies a round so stale scheduled events can be discarded
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct RoundId(pub u64);

/// Complete state of one round
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoundState {
    pub id: RoundId,
    pub phase: GamePhase,
    pub config: RoundConfig,
    pub points: Vec<Point>,
    /// Visited point indices, in order
    pub path: Vec<usize>,
    pub bonus: BTreeSet<usize>,
    pub obstacles: Vec<Obstacle>,
    pub combo: ComboState,
    pub score: u64,
    /// Seconds remaining (only counts down in time mode)
    pub time_left: u32,
    /// Difficulty carried into the next round
    pub progression: Progression,
    /// Canvas size, used to bounce obstacles
    pub bounds: Vec2,
}

impl Default for RoundState {
    fn default() -> Self {
        Self::idle(RoundId::default(), Progression::default())
    }
}

impl RoundState {
    /// An empty round waiting for `start`
    pub fn idle(id: RoundId, progression: Progression) -> Self {
        Self {
            id,
            phase: GamePhase::Idle,
            config: RoundConfig::free_form(GameMode::Free, progression.level),
            points: Vec::new(),
            path: Vec::new(),
            bonus: BTreeSet::new(),
            obstacles: Vec::new(),
            combo: ComboState::default(),
            score: 0,
            time_left: MAX_TIME_LEFT,
            progression,
            bounds: Vec2::new(DEFAULT_CANVAS_WIDTH, DEFAULT_CANVAS_HEIGHT),
        }
    }

    /// Begin a generated round: level-derived rules, fresh path, combo and score
    pub fn start(
        id: RoundId,
        layout: RoundLayout,
        mode: GameMode,
        progression: Progression,
        bounds: Vec2,
    ) -> Self {
        let config = RoundConfig::for_level(mode, progression.level, layout.points.len());
        Self::with_config(id, layout, config, progression, bounds)
    }

    /// Begin a round on a plain point set (image rounds): no order, cap or specials
    pub fn start_free_form(
        id: RoundId,
        positions: Vec<Vec2>,
        progression: Progression,
        bounds: Vec2,
    ) -> Self {
        let config = RoundConfig::free_form(GameMode::Free, progression.level);
        Self::with_config(id, RoundLayout::free_form(positions), config, progression, bounds)
    }

    /// Begin a round with explicit rules
    pub fn with_config(
        id: RoundId,
        layout: RoundLayout,
        config: RoundConfig,
        progression: Progression,
        bounds: Vec2,
    ) -> Self {
        let time_left = match config.mode {
            GameMode::Time => round_time_budget(config.level),
            GameMode::Free => MAX_TIME_LEFT,
        };

        Self {
            id,
            phase: GamePhase::Playing,
            config,
            points: layout.points,
            path: Vec::new(),
            bonus: layout.bonus,
            obstacles: layout.obstacles,
            combo: ComboState::default(),
            score: 0,
            time_left,
            progression,
            bounds,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase == GamePhase::Playing
    }

    /// Index a new move must have when ordering is enforced
    pub fn next_in_order(&self) -> Option<usize> {
        (self.config.required_order && self.path.len() < self.points.len())
            .then_some(self.path.len())
    }

    /// Path visits every point once and returns to where it started
    pub fn is_closed(&self) -> bool {
        self.path.len() == self.points.len() + 1 && self.path.first() == self.path.last()
    }

    /// Number of bonus points the path has visited
    pub fn bonus_visited(&self) -> usize {
        self.bonus.iter().filter(|&&i| self.path.contains(&i)).count()
    }

    /// Positions of the path, in order
    pub fn path_positions(&self) -> impl Iterator<Item = Vec2> + '_ {
        self.path.iter().map(|&i| self.points[i].pos)
    }
}
