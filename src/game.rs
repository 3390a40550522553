//! Game actor
//!
//! One `Game` owns the current round and processes events strictly in order
//! from its queue. Periodic producers (the one-second countdown and the
//! obstacle animation) only ever enqueue `Tick`/`Frame` events stamped with
//! the round they were started for. `schedules()` says which producers should
//! be running; once a round ends or is replaced, stale events are dropped.

use std::collections::VecDeque;

use glam::Vec2;

use crate::layout::LayoutGenerator;
use crate::platform::{Clock, MessageSink, Renderer, Scene};
use crate::settings::Settings;
use crate::sim::{
    Effect, GameMode, Outcome, RoundId, RoundInput, RoundState, StepResult, Transition, point_at,
    step,
};

pub use crate::sim::Progression;

/// Events the actor consumes
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    /// New generated round at the current difficulty
    Start,
    /// New free-form round on the given points (image rounds)
    StartWithPoints(Vec<Vec2>),
    /// Drop the current round and go idle
    Reset,
    /// Mode for the next round
    SetMode(GameMode),
    /// Point picked by index
    Click { index: usize },
    /// Canvas click; resolved to the point under it, if any
    ClickAt { pos: Vec2 },
    /// Countdown second elapsed
    Tick { round: RoundId },
    /// Animation frame
    Frame { round: RoundId, dt: f32 },
}

/// Which periodic producers should be running, and for which round
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Schedules {
    pub timer: Option<RoundId>,
    pub frames: Option<RoundId>,
}

impl Schedules {
    pub fn is_idle(&self) -> bool {
        self.timer.is_none() && self.frames.is_none()
    }
}

/// External collaborators the actor drives
pub struct Collaborators {
    pub layout: Box<dyn LayoutGenerator>,
    pub renderer: Box<dyn Renderer>,
    pub messages: Box<dyn MessageSink>,
    pub clock: Box<dyn Clock>,
}

pub struct Game {
    settings: Settings,
    round: RoundState,
    progression: Progression,
    mode: GameMode,
    last_round_id: u64,
    queue: VecDeque<GameEvent>,
    layout: Box<dyn LayoutGenerator>,
    renderer: Box<dyn Renderer>,
    messages: Box<dyn MessageSink>,
    clock: Box<dyn Clock>,
}

impl Game {
    pub fn new(settings: Settings, collaborators: Collaborators) -> Self {
        let progression = settings.progression();
        Self {
            mode: settings.mode,
            round: RoundState::idle(RoundId(0), progression),
            progression,
            last_round_id: 0,
            queue: VecDeque::new(),
            layout: collaborators.layout,
            renderer: collaborators.renderer,
            messages: collaborators.messages,
            clock: collaborators.clock,
            settings,
        }
    }

    pub fn round(&self) -> &RoundState {
        &self.round
    }

    pub fn progression(&self) -> Progression {
        self.progression
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Periodic producers the current round needs
    pub fn schedules(&self) -> Schedules {
        if !self.round.is_playing() {
            return Schedules::default();
        }
        let id = self.round.id;
        Schedules {
            timer: (self.round.config.mode == GameMode::Time).then_some(id),
            frames: (!self.round.obstacles.is_empty()).then_some(id),
        }
    }

    /// Queue an event for the next `run_pending`
    pub fn push(&mut self, event: GameEvent) {
        self.queue.push_back(event);
    }

    /// Process queued events in order; returns how many were handled
    pub fn run_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.queue.pop_front() {
            self.handle(event);
            handled += 1;
        }
        handled
    }

    /// Queue an event and process the queue
    pub fn dispatch(&mut self, event: GameEvent) {
        self.push(event);
        self.run_pending();
    }

    fn handle(&mut self, event: GameEvent) {
        match event {
            GameEvent::Start => self.start_round(),
            GameEvent::StartWithPoints(points) => self.start_free_form(points),
            GameEvent::Reset => self.reset(),
            GameEvent::SetMode(mode) => {
                log::info!("Mode set to {} (applies to the next round)", mode.as_str());
                self.mode = mode;
            }
            GameEvent::Click { index } => self.apply_input(RoundInput::Move { index }),
            GameEvent::ClickAt { pos } => {
                let centres = self.round.points.iter().map(|p| p.pos);
                match point_at(centres, pos, self.settings.point_radius) {
                    Some(index) => self.apply_input(RoundInput::Move { index }),
                    None => log::trace!("Click at ({}, {}) hit no point", pos.x, pos.y),
                }
            }
            GameEvent::Tick { round } => {
                if self.schedules().timer == Some(round) {
                    self.apply_input(RoundInput::ClockTick);
                } else {
                    log::debug!("Dropping stale tick for round {}", round.0);
                }
            }
            GameEvent::Frame { round, dt } => {
                if self.schedules().frames == Some(round) {
                    self.apply_input(RoundInput::Frame { dt });
                } else {
                    log::trace!("Dropping stale frame for round {}", round.0);
                }
            }
        }
    }

    fn next_round_id(&mut self) -> RoundId {
        self.last_round_id += 1;
        RoundId(self.last_round_id)
    }

    fn start_round(&mut self) {
        let id = self.next_round_id();
        let request = self.settings.layout_request(self.progression);
        let layout = self.layout.generate(&request);

        self.round = RoundState::start(id, layout, self.mode, self.progression, request.bounds());
        log::info!(
            "Round {} started: {} mode, level {}, {} points",
            id.0,
            self.mode.as_str(),
            self.progression.level,
            self.round.points.len()
        );
        self.redraw();
    }

    fn start_free_form(&mut self, points: Vec<Vec2>) {
        let id = self.next_round_id();
        let bounds = Vec2::new(self.settings.canvas_width, self.settings.canvas_height);
        self.round = RoundState::start_free_form(id, points, self.progression, bounds);
        log::info!(
            "Round {} started from image: {} points",
            id.0,
            self.round.points.len()
        );
        self.redraw();
    }

    fn reset(&mut self) {
        let id = self.next_round_id();
        self.round = RoundState::idle(id, self.progression);
        log::info!("Game reset");
        self.redraw();
    }

    fn apply_input(&mut self, input: RoundInput) {
        let now = self.clock.now_ms();
        let result = step(&self.round, input, now);
        self.apply(result);
    }

    fn apply(&mut self, result: StepResult) {
        let StepResult { transition, effects } = result;

        match transition {
            Transition::Continue(state) => self.round = state,
            Transition::Terminal { state, outcome } => {
                if outcome == Outcome::Won {
                    self.progression = state.progression;
                }
                self.round = state;
            }
            Transition::Rejected(_) | Transition::Ignored => {}
        }

        for effect in effects {
            match effect {
                Effect::Redraw => self.redraw(),
                Effect::ShowMessage(text) => self.messages.show(&text),
                Effect::RoundEnded(outcome) => {
                    log::info!("Round {} ended: {:?}", self.round.id.0, outcome);
                }
                Effect::ScoreChanged(score) => log::debug!("Score: {}", score),
                Effect::TimeChanged(time_left) => log::trace!("Time left: {}", time_left),
                Effect::Special(special) => log::debug!("Special point: {:?}", special),
                Effect::Scored(award) => log::debug!("Award: {:?}", award),
            }
        }
    }

    fn redraw(&mut self) {
        self.renderer.redraw(&Scene::from_round(&self.round));
    }
}
