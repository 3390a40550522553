//! Platform abstraction layer
//!
//! The rules engine never draws or prints. It hands its output to:
//! - `Renderer`: redraws points, path and obstacles
//! - `MessageSink`: short status lines for the player
//! - `Clock`: monotonic milliseconds for combo timing
//!
//! Native implementations (scripted clock, log sink, text renderer) live
//! here; browser ones are in `web`.

use std::cell::Cell;
use std::collections::BTreeSet;
use std::io::Write;
use std::rc::Rc;

use crate::sim::{GamePhase, Obstacle, Point, PointKind, RoundState};

#[cfg(target_arch = "wasm32")]
pub mod web;

/// Everything a renderer needs for one frame
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub points: &'a [Point],
    pub path: &'a [usize],
    pub obstacles: &'a [Obstacle],
    pub required_order: bool,
    pub bonus: &'a BTreeSet<usize>,
    pub phase: GamePhase,
    pub score: u64,
    pub time_left: u32,
    pub level: u32,
}

impl<'a> Scene<'a> {
    pub fn from_round(round: &'a RoundState) -> Self {
        Self {
            points: &round.points,
            path: &round.path,
            obstacles: &round.obstacles,
            required_order: round.config.required_order,
            bonus: &round.bonus,
            phase: round.phase,
            score: round.score,
            time_left: round.time_left,
            level: round.config.level,
        }
    }

    /// How a point should be coloured
    pub fn point_style(&self, index: usize) -> PointStyle {
        if self.path.contains(&index) {
            PointStyle::Visited
        } else if self.bonus.contains(&index) {
            PointStyle::Bonus
        } else if self.required_order && index == self.path.len() {
            PointStyle::Next
        } else {
            PointStyle::Open
        }
    }

    /// Ordered rounds label unvisited points with their 1-based number
    pub fn label(&self, index: usize) -> Option<String> {
        (self.required_order && !self.path.contains(&index)).then(|| (index + 1).to_string())
    }
}

/// Point colouring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointStyle {
    Visited,
    Bonus,
    /// Next point in an ordered round
    Next,
    Open,
}

pub trait Renderer {
    fn redraw(&mut self, scene: &Scene<'_>);
}

pub trait MessageSink {
    fn show(&mut self, text: &str);
}

pub trait Clock {
    /// Monotonic milliseconds
    fn now_ms(&self) -> u64;
}

/// Clock advanced by hand (scripted play, tests)
///
/// Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u64>>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get() + ms);
    }

    pub fn set(&self, ms: u64) {
        self.now.set(ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Sends messages to the log
#[derive(Debug, Default)]
pub struct LogMessages;

impl MessageSink for LogMessages {
    fn show(&mut self, text: &str) {
        log::info!("{}", text);
    }
}

/// Writes a one-line text summary of each frame
pub struct TextRenderer<W: Write> {
    out: W,
}

impl<W: Write> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Renderer for TextRenderer<W> {
    fn redraw(&mut self, scene: &Scene<'_>) {
        let path = scene
            .path
            .iter()
            .map(|i| (i + 1).to_string())
            .collect::<Vec<_>>()
            .join(" -> ");
        let specials = scene
            .points
            .iter()
            .filter(|p| p.kind != PointKind::Normal)
            .count();

        let result = writeln!(
            self.out,
            "[{:?}] level {} | score {} | time {} | {}/{} points, {} special | path: {}",
            scene.phase,
            scene.level,
            scene.score,
            scene.time_left,
            scene.path.len(),
            scene.points.len(),
            specials,
            if path.is_empty() { "-" } else { path.as_str() }
        );
        if let Err(e) = result {
            log::warn!("Failed to write frame: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{GameMode, Progression, RoundConfig, RoundId, RoundLayout};
    use glam::Vec2;

    fn ordered_round() -> RoundState {
        let mut layout = RoundLayout::free_form([
            Vec2::new(0.0, 0.0),
            Vec2::new(100.0, 0.0),
            Vec2::new(100.0, 100.0),
            Vec2::new(0.0, 100.0),
        ]);
        layout.bonus.insert(3);
        let mut round = RoundState::with_config(
            RoundId(1),
            layout,
            RoundConfig {
                required_order: true,
                ..RoundConfig::free_form(GameMode::Free, 2)
            },
            Progression::new(2, 4),
            Vec2::new(800.0, 600.0),
        );
        round.path = vec![0];
        round
    }

    #[test]
    fn test_point_styles() {
        let round = ordered_round();
        let scene = Scene::from_round(&round);
        assert_eq!(scene.point_style(0), PointStyle::Visited);
        assert_eq!(scene.point_style(1), PointStyle::Next);
        assert_eq!(scene.point_style(2), PointStyle::Open);
        assert_eq!(scene.point_style(3), PointStyle::Bonus);
    }

    #[test]
    fn test_labels_only_in_ordered_rounds() {
        let mut round = ordered_round();
        assert_eq!(Scene::from_round(&round).label(0), None);
        assert_eq!(Scene::from_round(&round).label(2), Some("3".to_string()));
        round.config.required_order = false;
        assert_eq!(Scene::from_round(&round).label(2), None);
    }

    #[test]
    fn test_text_renderer() {
        let round = ordered_round();
        let mut renderer = TextRenderer::new(Vec::new());
        renderer.redraw(&Scene::from_round(&round));
        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert!(text.contains("path: 1"));
        assert!(text.contains("1/4 points"));
    }

    #[test]
    fn test_manual_clock_is_shared() {
        let clock = ManualClock::new(100);
        let other = clock.clone();
        clock.advance(250);
        assert_eq!(other.now_ms(), 350);
        other.set(5);
        assert_eq!(clock.now_ms(), 5);
    }
}
