//! Dot Link entry point
//!
//! Native: plays scripted demo rounds through the game actor and prints each
//! frame as text. Web: mounts the game on the page's `<canvas>`.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_game {
    use std::cell::RefCell;
    use std::rc::Rc;

    use glam::Vec2;
    use wasm_bindgen::prelude::*;
    use web_sys::{HtmlCanvasElement, MouseEvent};

    use dot_link::consts::*;
    use dot_link::game::{Collaborators, Schedules};
    use dot_link::image_sampler::{RgbaImage, sample_points};
    use dot_link::layout::RandomLayout;
    use dot_link::platform::web::{CanvasRenderer, DomMessages, PerformanceClock};
    use dot_link::sim::RoundId;
    use dot_link::{Game, GameEvent, GameMode, Settings};

    /// Game plus the periodic producers currently feeding it
    struct App {
        game: Game,
        /// Interval handle and the round it ticks for
        timer: Option<(RoundId, i32)>,
        /// Round the animation loop is running for
        frames_for: Option<RoundId>,
    }

    thread_local! {
        static APP: RefCell<Option<Rc<RefCell<App>>>> = const { RefCell::new(None) };
    }

    fn window() -> Result<web_sys::Window, JsValue> {
        web_sys::window().ok_or_else(|| JsValue::from_str("no window"))
    }

    /// Feed one event to the game, then bring producers in line with it
    fn dispatch(app: &Rc<RefCell<App>>, event: GameEvent) {
        app.borrow_mut().game.dispatch(event);
        if let Err(e) = sync_producers(app) {
            log::error!("Failed to update schedules: {:?}", e);
        }
    }

    fn sync_producers(app: &Rc<RefCell<App>>) -> Result<(), JsValue> {
        let Schedules { timer, frames } = app.borrow().game.schedules();
        let window = window()?;

        let running = app.borrow().timer.map(|(round, _)| round);
        if running != timer {
            if let Some((_, handle)) = app.borrow_mut().timer.take() {
                window.clear_interval_with_handle(handle);
            }
            if let Some(round) = timer {
                let target = app.clone();
                let closure = Closure::<dyn FnMut()>::new(move || {
                    dispatch(&target, GameEvent::Tick { round });
                });
                let handle = window.set_interval_with_callback_and_timeout_and_arguments_0(
                    closure.as_ref().unchecked_ref(),
                    TICK_INTERVAL_MS as i32,
                )?;
                closure.forget();
                app.borrow_mut().timer = Some((round, handle));
            }
        }

        let animating = app.borrow().frames_for;
        if animating != frames {
            app.borrow_mut().frames_for = frames;
            if let Some(round) = frames {
                request_animation_frame(app.clone(), round, None)?;
            }
        }
        Ok(())
    }

    fn request_animation_frame(
        app: Rc<RefCell<App>>,
        round: RoundId,
        last_time: Option<f64>,
    ) -> Result<(), JsValue> {
        let closure = Closure::once(move |time: f64| {
            // Stop once the round is over or replaced
            if app.borrow().frames_for != Some(round) {
                return;
            }
            let dt = last_time.map_or(0.0, |last| ((time - last) / 1000.0) as f32);
            dispatch(&app, GameEvent::Frame { round, dt: dt.min(0.1) });

            if app.borrow().frames_for == Some(round) {
                if let Err(e) = request_animation_frame(app.clone(), round, Some(time)) {
                    log::error!("Animation frame request failed: {:?}", e);
                }
            }
        });
        window()?.request_animation_frame(closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    fn on_click(
        id: &str,
        app: &Rc<RefCell<App>>,
        make_event: impl Fn(&Game) -> GameEvent + 'static,
    ) {
        let Some(document) = web_sys::window().and_then(|w| w.document()) else {
            return;
        };
        let Some(button) = document.get_element_by_id(id) else {
            log::debug!("No #{} button on the page", id);
            return;
        };
        let app = app.clone();
        let closure = Closure::<dyn FnMut(_)>::new(move |_event: MouseEvent| {
            let event = make_event(&app.borrow().game);
            dispatch(&app, event);
        });
        let _ = button.add_event_listener_with_callback("click", closure.as_ref().unchecked_ref());
        closure.forget();
    }

    fn setup_input_handlers(canvas: &HtmlCanvasElement, app: &Rc<RefCell<App>>) {
        // Canvas clicks, scaled from CSS pixels to canvas pixels
        {
            let app = app.clone();
            let canvas_clone = canvas.clone();
            let closure = Closure::<dyn FnMut(_)>::new(move |event: MouseEvent| {
                let rect = canvas_clone.get_bounding_client_rect();
                let scale_x = f64::from(canvas_clone.width()) / rect.width().max(1.0);
                let scale_y = f64::from(canvas_clone.height()) / rect.height().max(1.0);
                let pos = Vec2::new(
                    ((f64::from(event.client_x()) - rect.left()) * scale_x) as f32,
                    ((f64::from(event.client_y()) - rect.top()) * scale_y) as f32,
                );
                dispatch(&app, GameEvent::ClickAt { pos });
            });
            let _ = canvas
                .add_event_listener_with_callback("mousedown", closure.as_ref().unchecked_ref());
            closure.forget();
        }

        on_click("start-btn", app, |_| GameEvent::Start);
        on_click("reset-btn", app, |_| GameEvent::Reset);
        on_click("mode-btn", app, |game| {
            let next = match game.mode() {
                GameMode::Free => GameMode::Time,
                GameMode::Time => GameMode::Free,
            };
            if let Some(el) = web_sys::window()
                .and_then(|w| w.document())
                .and_then(|d| d.get_element_by_id("mode-btn"))
            {
                el.set_text_content(Some(&format!("Mode: {}", next.as_str())));
            }
            GameEvent::SetMode(next)
        });
    }

    /// Start a free-form round from raw RGBA pixels (e.g. `ImageData.data`)
    #[wasm_bindgen]
    pub fn start_from_image(width: u32, height: u32, data: Vec<u8>) -> Result<usize, JsValue> {
        let image =
            RgbaImage::new(width, height, data).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let points = sample_points(&image);
        let count = points.len();

        let app = APP
            .with(|slot| slot.borrow().clone())
            .ok_or_else(|| JsValue::from_str("game not mounted"))?;
        dispatch(&app, GameEvent::StartWithPoints(points));
        Ok(count)
    }

    pub fn run() -> Result<(), JsValue> {
        console_error_panic_hook::set_once();
        console_log::init_with_level(log::Level::Info)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;

        log::info!("Dot Link starting...");

        let window = window()?;
        let document = window
            .document()
            .ok_or_else(|| JsValue::from_str("no document"))?;

        let canvas: HtmlCanvasElement = document
            .get_element_by_id("canvas")
            .ok_or_else(|| JsValue::from_str("no canvas"))?
            .dyn_into()?;

        let mut settings = Settings::default();
        if canvas.width() > 0 && canvas.height() > 0 {
            settings.canvas_width = canvas.width() as f32;
            settings.canvas_height = canvas.height() as f32;
        } else {
            canvas.set_width(DEFAULT_CANVAS_WIDTH as u32);
            canvas.set_height(DEFAULT_CANVAS_HEIGHT as u32);
        }
        let seed = settings.seed.unwrap_or(js_sys::Date::now() as u64);
        log::info!("Layout seed: {}", seed);

        let collaborators = Collaborators {
            layout: Box::new(RandomLayout::new(seed)),
            renderer: Box::new(CanvasRenderer::new(&canvas, &settings)?),
            messages: Box::new(DomMessages::new("message")?),
            clock: Box::new(PerformanceClock::new()?),
        };

        let app = Rc::new(RefCell::new(App {
            game: Game::new(settings, collaborators),
            timer: None,
            frames_for: None,
        }));
        APP.with(|slot| *slot.borrow_mut() = Some(app.clone()));

        setup_input_handlers(&canvas, &app);
        dispatch(&app, GameEvent::Start);

        log::info!("Dot Link running!");
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() -> Result<(), JsValue> {
    wasm_game::run()
}

#[cfg(not(target_arch = "wasm32"))]
mod demo {
    use std::io;

    use dot_link::consts::*;
    use dot_link::game::Collaborators;
    use dot_link::layout::RandomLayout;
    use dot_link::platform::{LogMessages, ManualClock, TextRenderer};
    use dot_link::sim::RoundState;
    use dot_link::{Game, GameEvent, Settings};

    /// Simulated delay between clicks (fast enough to build combos)
    const CLICK_GAP_MS: u64 = 400;
    const DEMO_ROUNDS: usize = 5;

    /// Unordered rounds: visit points by angle around their centroid, which
    /// never crosses itself
    fn angular_tour(round: &RoundState) -> Vec<usize> {
        let n = round.points.len();
        if n == 0 {
            return Vec::new();
        }
        let centroid = round.points.iter().map(|p| p.pos).sum::<glam::Vec2>() / n as f32;
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            let da = round.points[a].pos - centroid;
            let db = round.points[b].pos - centroid;
            da.y.atan2(da.x).total_cmp(&db.y.atan2(db.x))
        });
        order
    }

    /// Next point the scripted player picks
    fn next_click(round: &RoundState, tour: &[usize]) -> Option<usize> {
        if round.path.len() >= round.points.len() {
            return round.path.first().copied();
        }
        if let Some(index) = round.next_in_order() {
            return Some(index);
        }
        tour.iter().copied().find(|i| !round.path.contains(i))
    }

    fn play_round(game: &mut Game, clock: &ManualClock) {
        game.dispatch(GameEvent::Start);
        let tour = angular_tour(game.round());
        let mut since_tick = 0;

        // Teleports and rejections can stall the script; give up eventually
        for _ in 0..game.round().points.len() * 3 {
            if !game.round().is_playing() {
                break;
            }
            let Some(index) = next_click(game.round(), &tour) else {
                break;
            };

            clock.advance(CLICK_GAP_MS);
            since_tick += CLICK_GAP_MS;
            if since_tick >= u64::from(TICK_INTERVAL_MS) {
                since_tick -= u64::from(TICK_INTERVAL_MS);
                if let Some(round) = game.schedules().timer {
                    game.push(GameEvent::Tick { round });
                }
            }
            if let Some(round) = game.schedules().frames {
                game.push(GameEvent::Frame {
                    round,
                    dt: CLICK_GAP_MS as f32 / 1000.0,
                });
            }
            game.push(GameEvent::Click { index });
            game.run_pending();
        }

        let round = game.round();
        println!(
            "Round {} finished: {:?}, score {}, next level {}",
            round.id.0,
            round.phase,
            round.score,
            game.progression().level
        );
    }

    pub fn run() {
        let path = std::env::args()
            .nth(1)
            .unwrap_or_else(|| "dot-link.json".to_string());
        let settings = Settings::load_or_default(&path);
        let seed = settings.seed.unwrap_or_else(rand::random);
        log::info!("Layout seed: {}", seed);

        let clock = ManualClock::new(0);
        let mut game = Game::new(
            settings,
            Collaborators {
                layout: Box::new(RandomLayout::new(seed)),
                renderer: Box::new(TextRenderer::new(io::stdout())),
                messages: Box::new(LogMessages),
                clock: Box::new(clock.clone()),
            },
        );

        for _ in 0..DEMO_ROUNDS {
            play_round(&mut game, &clock);
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    log::info!("Dot Link (native demo) starting...");
    demo::run();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // WASM entry point is wasm_main, this is just to satisfy the compiler
}
