//! Round transitions
//!
//! Every input is applied to a borrowed `RoundState` and produces a
//! `StepResult`: the new state (if any) plus the effects the outside world
//! should see. The input state is never modified.

use serde::{Deserialize, Serialize};

use super::effects::{SpecialEffect, apply_special};
use super::scoring::{ScoreBreakdown, completion_score};
use super::state::{GameMode, GamePhase, Outcome, RoundState};
use super::validate::{MoveRejection, validate};
use crate::adjusted_time_budget;
use crate::consts::*;

/// Inputs the round reacts to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RoundInput {
    /// Player picked a point
    Move { index: usize },
    /// One second of countdown elapsed
    ClockTick,
    /// Animation frame (seconds since the previous one)
    Frame { dt: f32 },
}

/// Descriptors for the renderer and message sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    Redraw,
    ShowMessage(String),
    ScoreChanged(u64),
    TimeChanged(u32),
    Special(SpecialEffect),
    Scored(ScoreBreakdown),
    RoundEnded(Outcome),
}

/// Result of applying one input
#[derive(Debug, Clone)]
pub enum Transition {
    /// Round goes on with the new state
    Continue(RoundState),
    /// Move refused; state unchanged
    Rejected(MoveRejection),
    /// Round finished
    Terminal { state: RoundState, outcome: Outcome },
    /// Input does not apply in the current phase
    Ignored,
}

#[derive(Debug, Clone)]
pub struct StepResult {
    pub transition: Transition,
    pub effects: Vec<Effect>,
}

impl StepResult {
    fn ignored() -> Self {
        Self {
            transition: Transition::Ignored,
            effects: Vec::new(),
        }
    }

    fn terminal(state: RoundState, outcome: Outcome, effects: Vec<Effect>) -> Self {
        Self {
            transition: Transition::Terminal { state, outcome },
            effects,
        }
    }

    /// The state to adopt, if the step produced one
    pub fn into_state(self) -> Option<RoundState> {
        match self.transition {
            Transition::Continue(state) | Transition::Terminal { state, .. } => Some(state),
            Transition::Rejected(_) | Transition::Ignored => None,
        }
    }

    pub fn state(&self) -> Option<&RoundState> {
        match &self.transition {
            Transition::Continue(state) | Transition::Terminal { state, .. } => Some(state),
            Transition::Rejected(_) | Transition::Ignored => None,
        }
    }

    pub fn rejection(&self) -> Option<MoveRejection> {
        match self.transition {
            Transition::Rejected(reason) => Some(reason),
            Transition::Terminal {
                outcome: Outcome::Collided,
                ..
            } => Some(MoveRejection::SelfCollision),
            _ => None,
        }
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.transition {
            Transition::Terminal { outcome, .. } => Some(outcome),
            _ => None,
        }
    }
}

/// Apply one input to the round
pub fn step(state: &RoundState, input: RoundInput, now_ms: u64) -> StepResult {
    match input {
        RoundInput::Move { index } => submit_move(state, index, now_ms),
        RoundInput::ClockTick => tick_timer(state),
        RoundInput::Frame { dt } => advance_frame(state, dt),
    }
}

/// Try to extend the path with the point at `index`
///
/// Accepted moves update the combo, append the point, fire its special
/// effect and then check for a closed path. A crossing segment ends the
/// round as `Collided`.
pub fn submit_move(state: &RoundState, index: usize, now_ms: u64) -> StepResult {
    if !state.is_playing() {
        return StepResult::ignored();
    }

    if let Err(reason) = validate(&state.path, index, &state.points, &state.config) {
        if reason.is_terminal() {
            log::info!(
                "Round {} over: path collision at point {} (path length {})",
                state.id.0,
                index,
                state.path.len()
            );
            let mut next = state.clone();
            next.phase = GamePhase::Collided;
            let effects = vec![
                Effect::ShowMessage(reason.to_string()),
                Effect::Redraw,
                Effect::RoundEnded(Outcome::Collided),
            ];
            return StepResult::terminal(next, Outcome::Collided, effects);
        }

        log::debug!("Move to {} rejected: {:?}", index, reason);
        return StepResult {
            transition: Transition::Rejected(reason),
            effects: vec![Effect::ShowMessage(reason.to_string())],
        };
    }

    let mut next = state.clone();
    next.combo.register_move(now_ms);
    next.path.push(index);

    let mut effects = Vec::new();
    let time_before = next.time_left;
    if let Some(special) = apply_special(&mut next, index) {
        effects.push(Effect::Special(special));
    }
    if next.time_left != time_before {
        effects.push(Effect::TimeChanged(next.time_left));
    }
    effects.push(Effect::Redraw);

    if next.is_closed() {
        return complete_round(next, effects);
    }

    StepResult {
        transition: Transition::Continue(next),
        effects,
    }
}

fn complete_round(mut state: RoundState, mut effects: Vec<Effect>) -> StepResult {
    let award = completion_score(
        state.bonus_visited(),
        state.combo.count,
        state.config.mode,
        state.time_left,
    );
    state.score += award.total();
    state.phase = GamePhase::Won;

    log::info!(
        "Round {} won: +{} (base {}, time {}, bonus {}, combo {}x)",
        state.id.0,
        award.total(),
        award.base,
        award.time_bonus,
        award.bonus,
        state.combo.count
    );

    effects.push(Effect::Scored(award));
    effects.push(Effect::ScoreChanged(state.score));
    effects.push(Effect::ShowMessage(format!(
        "Puzzle complete! Extra points: {} (combo: {})",
        award.extra(),
        state.combo.count
    )));

    let time_before = state.time_left;
    adjust_difficulty(&mut state);
    if state.time_left != time_before {
        effects.push(Effect::TimeChanged(state.time_left));
    }

    effects.push(Effect::RoundEnded(Outcome::Won));
    StepResult::terminal(state, Outcome::Won, effects)
}

/// Raise difficulty after a win
///
/// Plenty of time left promotes the level and adds points to the next round.
/// In time mode the countdown is reset to the budget for the new level.
/// Returns whether the level went up.
pub fn adjust_difficulty(state: &mut RoundState) -> bool {
    let before = state.progression;

    if state.time_left > LEVEL_UP_TIME_THRESHOLD {
        let progression = &mut state.progression;
        progression.level = (progression.level + 1).min(MAX_LEVEL);
        if progression.point_count < MAX_POINT_COUNT {
            progression.point_count =
                (progression.point_count + POINT_COUNT_STEP).min(MAX_POINT_COUNT);
        }
    }

    if state.config.mode == GameMode::Time {
        state.time_left = adjusted_time_budget(state.progression.level);
    }

    let leveled_up = state.progression.level > before.level;
    if leveled_up {
        log::info!(
            "Level up: {} -> {} ({} points next round)",
            before.level,
            state.progression.level,
            state.progression.point_count
        );
    }
    leveled_up
}

/// Count down one second (time mode only)
pub fn tick_timer(state: &RoundState) -> StepResult {
    if !state.is_playing() || state.config.mode != GameMode::Time {
        return StepResult::ignored();
    }

    let mut next = state.clone();
    next.time_left = next.time_left.saturating_sub(1);
    let mut effects = vec![Effect::TimeChanged(next.time_left), Effect::Redraw];

    if next.time_left == 0 {
        log::info!("Round {} over: time ran out", next.id.0);
        next.phase = GamePhase::TimedOut;
        effects.push(Effect::ShowMessage("Time's up! Game over".to_string()));
        effects.push(Effect::RoundEnded(Outcome::TimedOut));
        return StepResult::terminal(next, Outcome::TimedOut, effects);
    }

    StepResult {
        transition: Transition::Continue(next),
        effects,
    }
}

/// Move obstacles by one animation frame
pub fn advance_frame(state: &RoundState, dt: f32) -> StepResult {
    if !state.is_playing() || state.obstacles.is_empty() {
        return StepResult::ignored();
    }

    let mut next = state.clone();
    let bounds = next.bounds;
    for obstacle in &mut next.obstacles {
        obstacle.advance(dt, bounds);
    }

    StepResult {
        transition: Transition::Continue(next),
        effects: vec![Effect::Redraw],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{
        Obstacle, Point, PointKind, Progression, RoundConfig, RoundId, RoundLayout,
    };
    use glam::Vec2;

    const BOUNDS: Vec2 = Vec2::new(800.0, 600.0);

    fn layout(coords: &[(f32, f32)]) -> RoundLayout {
        RoundLayout::free_form(coords.iter().map(|&(x, y)| Vec2::new(x, y)))
    }

    fn triangle() -> RoundState {
        RoundState::with_config(
            RoundId(1),
            layout(&[(100.0, 100.0), (300.0, 100.0), (200.0, 300.0)]),
            RoundConfig::free_form(GameMode::Free, 1),
            Progression::new(1, 3),
            BOUNDS,
        )
    }

    /// Apply moves spaced `gap_ms` apart, panicking on anything but Continue/Terminal
    fn play(mut state: RoundState, moves: &[usize], gap_ms: u64) -> (RoundState, Vec<Effect>) {
        let mut all_effects = Vec::new();
        for (i, &index) in moves.iter().enumerate() {
            let result = submit_move(&state, index, 10_000 + i as u64 * gap_ms);
            all_effects.extend(result.effects.iter().cloned());
            state = result.into_state().expect("move should be accepted");
        }
        (state, all_effects)
    }

    #[test]
    fn test_basic_free_mode_win() {
        // Slow moves keep the combo at 1
        let (state, effects) = play(triangle(), &[0, 1, 2, 0], 2_000);
        assert_eq!(state.phase, GamePhase::Won);
        assert_eq!(state.path, vec![0, 1, 2, 0]);
        assert_eq!(state.combo.count, 1);
        // Base 100 plus 10 for the 1x combo
        assert_eq!(state.score, 110);
        assert!(effects.contains(&Effect::RoundEnded(Outcome::Won)));
        assert!(effects.contains(&Effect::ScoreChanged(110)));
    }

    #[test]
    fn test_fast_win_scores_combo() {
        let (state, _) = play(triangle(), &[0, 1, 2, 0], 300);
        assert_eq!(state.combo.count, 4);
        assert_eq!(state.score, 140);
    }

    #[test]
    fn test_bonus_points_score_on_win() {
        let mut start = triangle();
        start.bonus = [1, 2].into_iter().collect();
        let (state, _) = play(start, &[0, 1, 2, 0], 2_000);
        assert_eq!(state.score, 100 + 100 + 10);
    }

    #[test]
    fn test_time_mode_win_adds_time_bonus() {
        let start = RoundState::with_config(
            RoundId(1),
            layout(&[(100.0, 100.0), (300.0, 100.0), (200.0, 300.0)]),
            RoundConfig::free_form(GameMode::Time, 1),
            Progression::new(1, 3),
            BOUNDS,
        );
        assert_eq!(start.time_left, 55);
        let (state, _) = play(start, &[0, 1, 2, 0], 2_000);
        assert_eq!(state.score, 100 + 55 + 10);
        // Level went up, countdown reset for level 2
        assert_eq!(state.progression.level, 2);
        assert_eq!(state.time_left, 55);
    }

    #[test]
    fn test_input_state_is_untouched() {
        let state = triangle();
        let result = submit_move(&state, 0, 0);
        assert!(state.path.is_empty());
        assert_eq!(result.state().map(|s| s.path.clone()), Some(vec![0]));
    }

    #[test]
    fn test_ordered_rejection() {
        let start = RoundState::with_config(
            RoundId(1),
            layout(&[(100.0, 100.0), (300.0, 100.0), (200.0, 300.0)]),
            RoundConfig {
                required_order: true,
                ..RoundConfig::free_form(GameMode::Free, 2)
            },
            Progression::new(2, 3),
            BOUNDS,
        );
        let result = submit_move(&start, 1, 0);
        assert_eq!(
            result.rejection(),
            Some(MoveRejection::OutOfOrder { expected: 0 })
        );
        assert!(matches!(result.effects.as_slice(), [Effect::ShowMessage(_)]));

        let result = submit_move(&start, 0, 0);
        assert!(matches!(result.transition, Transition::Continue(_)));
    }

    #[test]
    fn test_teleport_chain() {
        let mut l = layout(&[
            (100.0, 100.0),
            (300.0, 100.0),
            (500.0, 120.0),
            (500.0, 400.0),
            (300.0, 400.0),
            (600.0, 300.0),
        ]);
        l.points[2] = Point::with_kind(l.points[2].pos, PointKind::Teleport { paired: 5 });
        l.points[5] = Point::with_kind(l.points[5].pos, PointKind::Teleport { paired: 2 });
        let start = RoundState::with_config(
            RoundId(1),
            l,
            RoundConfig::free_form(GameMode::Free, 3),
            Progression::new(3, 6),
            BOUNDS,
        );

        let (state, effects) = play(start, &[0, 1, 2], 2_000);
        assert_eq!(state.path, vec![0, 1, 2, 5]);
        assert!(effects.contains(&Effect::Special(SpecialEffect::Teleported { from: 2, to: 5 })));
    }

    #[test]
    fn test_max_length_exceeded() {
        let start = RoundState::with_config(
            RoundId(1),
            layout(&[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (0.0, 100.0)]),
            RoundConfig {
                max_path_length: Some(3),
                ..RoundConfig::free_form(GameMode::Free, 2)
            },
            Progression::new(2, 4),
            BOUNDS,
        );
        let (state, _) = play(start, &[0, 1, 2], 2_000);
        for candidate in 0..4 {
            let result = submit_move(&state, candidate, 99_000);
            assert_eq!(
                result.rejection(),
                Some(MoveRejection::MaxLengthExceeded { max: 3 })
            );
        }
    }

    #[test]
    fn test_self_collision_ends_round() {
        let start = RoundState::with_config(
            RoundId(7),
            layout(&[(0.0, 0.0), (100.0, 0.0), (100.0, 100.0), (50.0, -50.0)]),
            RoundConfig::free_form(GameMode::Free, 1),
            Progression::default(),
            BOUNDS,
        );
        let (state, _) = play(start, &[0, 1, 2], 2_000);

        let result = submit_move(&state, 3, 50_000);
        assert_eq!(result.outcome(), Some(Outcome::Collided));
        assert_eq!(result.rejection(), Some(MoveRejection::SelfCollision));
        assert!(result.effects.contains(&Effect::RoundEnded(Outcome::Collided)));

        let ended = result.into_state().expect("terminal state");
        assert_eq!(ended.phase, GamePhase::Collided);
        assert_eq!(ended.path, vec![0, 1, 2]);

        // Further moves are ignored
        let after = submit_move(&ended, 3, 60_000);
        assert!(matches!(after.transition, Transition::Ignored));
    }

    #[test]
    fn test_combo_resets_after_pause() {
        let state = triangle();
        let state = submit_move(&state, 0, 1_000).into_state().expect("accepted");
        let state = submit_move(&state, 1, 1_500).into_state().expect("accepted");
        assert_eq!(state.combo.count, 2);
        let state = submit_move(&state, 2, 2_500).into_state().expect("accepted");
        assert_eq!(state.combo.count, 1);
    }

    #[test]
    fn test_rejected_move_keeps_combo() {
        let state = triangle();
        let state = submit_move(&state, 0, 1_000).into_state().expect("accepted");
        let rejected = submit_move(&state, 0, 1_100);
        assert_eq!(
            rejected.rejection(),
            Some(MoveRejection::AlreadyVisited { index: 0 })
        );
        assert!(rejected.into_state().is_none());
    }

    #[test]
    fn test_timer_counts_down_to_timeout() {
        let mut state = RoundState::with_config(
            RoundId(1),
            layout(&[(100.0, 100.0), (300.0, 100.0), (200.0, 300.0)]),
            RoundConfig::free_form(GameMode::Time, 1),
            Progression::default(),
            BOUNDS,
        );
        state.time_left = 2;

        let result = tick_timer(&state);
        assert_eq!(result.effects, vec![Effect::TimeChanged(1), Effect::Redraw]);
        let state = result.into_state().expect("still playing");

        let result = tick_timer(&state);
        assert_eq!(result.outcome(), Some(Outcome::TimedOut));
        assert_eq!(
            &result.effects[..2],
            &[Effect::TimeChanged(0), Effect::Redraw]
        );
        let state = result.into_state().expect("terminal");
        assert_eq!(state.phase, GamePhase::TimedOut);
        assert_eq!(state.time_left, 0);

        assert!(matches!(tick_timer(&state).transition, Transition::Ignored));
    }

    #[test]
    fn test_timer_ignored_in_free_mode() {
        let state = triangle();
        assert!(matches!(tick_timer(&state).transition, Transition::Ignored));
    }

    #[test]
    fn test_time_point_effect_reported() {
        let mut l = layout(&[(100.0, 100.0), (300.0, 100.0), (200.0, 300.0)]);
        l.points[1].kind = PointKind::Time;
        let mut state = RoundState::with_config(
            RoundId(1),
            l,
            RoundConfig::free_form(GameMode::Time, 5),
            Progression::new(5, 3),
            BOUNDS,
        );
        state.time_left = 12;
        let (state, effects) = play(state, &[0, 1], 2_000);
        assert_eq!(state.time_left, 17);
        assert!(effects.contains(&Effect::TimeChanged(17)));
    }

    #[test]
    fn test_adjust_difficulty_caps() {
        let mut state = triangle();
        state.progression = Progression::new(5, 20);
        state.time_left = 60;
        assert!(!adjust_difficulty(&mut state));
        assert_eq!(state.progression, Progression::new(5, 20));

        let mut state = triangle();
        state.progression = Progression::new(2, 19);
        assert!(adjust_difficulty(&mut state));
        assert_eq!(state.progression.level, 3);
        assert_eq!(state.progression.point_count, 20);
    }

    #[test]
    fn test_adjust_difficulty_needs_time() {
        let mut state = triangle();
        state.config.mode = GameMode::Time;
        state.progression = Progression::new(3, 10);
        state.time_left = 30;
        assert!(!adjust_difficulty(&mut state));
        assert_eq!(state.progression.level, 3);
        assert_eq!(state.time_left, 50);
    }

    #[test]
    fn test_frame_moves_obstacles() {
        let mut state = triangle();
        state.obstacles.push(Obstacle {
            pos: Vec2::new(100.0, 100.0),
            size: Vec2::new(40.0, 40.0),
            vel: Vec2::new(60.0, -30.0),
        });
        let result = advance_frame(&state, 0.5);
        let next = result.into_state().expect("frame applied");
        assert_eq!(next.obstacles[0].pos, Vec2::new(130.0, 85.0));

        // No obstacles, nothing to animate
        assert!(matches!(advance_frame(&triangle(), 0.5).transition, Transition::Ignored));
    }

    #[test]
    fn test_step_dispatch() {
        let state = triangle();
        let result = step(&state, RoundInput::Move { index: 2 }, 0);
        assert_eq!(result.state().map(|s| s.path.clone()), Some(vec![2]));
        assert!(matches!(
            step(&state, RoundInput::ClockTick, 0).transition,
            Transition::Ignored
        ));
    }
}
