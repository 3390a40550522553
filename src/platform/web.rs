//! Browser collaborators: 2D canvas renderer, DOM message line and
//! `performance.now()` clock.

use std::f64::consts::TAU;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, Document, HtmlCanvasElement, Performance};

use super::{Clock, MessageSink, PointStyle, Renderer, Scene};
use crate::settings::{Palette, Settings};
use crate::sim::PointKind;

/// Draws rounds onto a `<canvas>` and mirrors score/time/level into the HUD
pub struct CanvasRenderer {
    ctx: CanvasRenderingContext2d,
    document: Document,
    width: f64,
    height: f64,
    radius: f64,
    palette: Palette,
    path_color: String,
    canvas_color: String,
}

impl CanvasRenderer {
    pub fn new(canvas: &HtmlCanvasElement, settings: &Settings) -> Result<Self, JsValue> {
        let ctx: CanvasRenderingContext2d = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into()?;
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;

        Ok(Self {
            ctx,
            document,
            width: f64::from(canvas.width()),
            height: f64::from(canvas.height()),
            radius: f64::from(settings.point_radius),
            palette: settings.theme.palette(),
            path_color: settings.path_color().to_string(),
            canvas_color: settings.canvas_color().to_string(),
        })
    }

    fn draw_path(&self, scene: &Scene<'_>) {
        let mut positions = scene.path.iter().filter_map(|&i| scene.points.get(i));
        let Some(first) = positions.next() else {
            return;
        };

        self.ctx.begin_path();
        self.ctx.set_stroke_style_str(&self.path_color);
        self.ctx.set_line_width(3.0);
        self.ctx
            .move_to(f64::from(first.pos.x), f64::from(first.pos.y));
        for p in positions {
            self.ctx.line_to(f64::from(p.pos.x), f64::from(p.pos.y));
        }
        self.ctx.stroke();
    }

    fn draw_points(&self, scene: &Scene<'_>) {
        self.ctx.set_font("12px sans-serif");
        self.ctx.set_text_align("center");
        self.ctx.set_text_baseline("middle");

        for (index, point) in scene.points.iter().enumerate() {
            let (x, y) = (f64::from(point.pos.x), f64::from(point.pos.y));
            let color = match scene.point_style(index) {
                PointStyle::Visited => self.palette.visited,
                PointStyle::Bonus => self.palette.bonus,
                PointStyle::Next => self.palette.next,
                PointStyle::Open => self.palette.open,
            };

            self.ctx.begin_path();
            self.ctx.set_fill_style_str(color);
            if self.ctx.arc(x, y, self.radius, 0.0, TAU).is_ok() {
                self.ctx.fill();
            }

            // Ring marks special points
            if point.kind != PointKind::Normal {
                self.ctx.begin_path();
                self.ctx.set_stroke_style_str(self.palette.path);
                self.ctx.set_line_width(2.0);
                if self.ctx.arc(x, y, self.radius + 4.0, 0.0, TAU).is_ok() {
                    self.ctx.stroke();
                }
            }

            if let Some(label) = scene.label(index) {
                self.ctx.set_fill_style_str(self.palette.label);
                let _ = self.ctx.fill_text(&label, x, y);
            }
        }
    }

    fn draw_obstacles(&self, scene: &Scene<'_>) {
        self.ctx.set_fill_style_str(self.palette.obstacle);
        for o in scene.obstacles {
            self.ctx.fill_rect(
                f64::from(o.pos.x),
                f64::from(o.pos.y),
                f64::from(o.size.x),
                f64::from(o.size.y),
            );
        }
    }

    fn update_hud(&self, scene: &Scene<'_>) {
        let fields = [
            ("score", scene.score.to_string()),
            ("time", scene.time_left.to_string()),
            ("level", scene.level.to_string()),
        ];
        for (id, value) in fields {
            if let Some(el) = self.document.get_element_by_id(id) {
                el.set_text_content(Some(&value));
            }
        }
    }
}

impl Renderer for CanvasRenderer {
    fn redraw(&mut self, scene: &Scene<'_>) {
        self.ctx.set_fill_style_str(&self.canvas_color);
        self.ctx.fill_rect(0.0, 0.0, self.width, self.height);

        self.draw_obstacles(scene);
        self.draw_path(scene);
        self.draw_points(scene);
        self.update_hud(scene);
    }
}

/// Writes messages into a DOM element (and the log)
pub struct DomMessages {
    document: Document,
    element_id: String,
}

impl DomMessages {
    pub fn new(element_id: impl Into<String>) -> Result<Self, JsValue> {
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;
        Ok(Self {
            document,
            element_id: element_id.into(),
        })
    }
}

impl MessageSink for DomMessages {
    fn show(&mut self, text: &str) {
        log::info!("{}", text);
        match self.document.get_element_by_id(&self.element_id) {
            Some(el) => el.set_text_content(Some(text)),
            None => log::warn!("Message element #{} not found", self.element_id),
        }
    }
}

/// `performance.now()` in whole milliseconds
pub struct PerformanceClock {
    performance: Performance,
}

impl PerformanceClock {
    pub fn new() -> Result<Self, JsValue> {
        let performance = web_sys::window()
            .and_then(|w| w.performance())
            .ok_or_else(|| JsValue::from_str("performance API unavailable"))?;
        Ok(Self { performance })
    }
}

impl Clock for PerformanceClock {
    fn now_ms(&self) -> u64 {
        self.performance.now() as u64
    }
}
