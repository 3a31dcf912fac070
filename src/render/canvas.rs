//! Canvas 2D painter for the browser build

use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::{DrawCmd, css};
use crate::consts::ARENA_PX;

pub struct CanvasPainter {
    ctx: CanvasRenderingContext2d,
}

impl CanvasPainter {
    /// Grab the 2D context of `canvas`
    pub fn new(canvas: &HtmlCanvasElement) -> Option<Self> {
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()?
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        Some(Self { ctx })
    }

    pub fn paint(&self, cmds: &[DrawCmd]) {
        let ctx = &self.ctx;
        for cmd in cmds {
            match *cmd {
                DrawCmd::Clear { color } => {
                    ctx.set_fill_style_str(&css(color));
                    ctx.fill_rect(0.0, 0.0, ARENA_PX as f64, ARENA_PX as f64);
                }
                DrawCmd::Rect { x, y, w, h, color } => {
                    ctx.set_fill_style_str(&css(color));
                    ctx.fill_rect(x as f64, y as f64, w as f64, h as f64);
                }
                DrawCmd::Triangle { a, b, c, color } => {
                    ctx.set_fill_style_str(&css(color));
                    ctx.begin_path();
                    ctx.move_to(a.x as f64, a.y as f64);
                    ctx.line_to(b.x as f64, b.y as f64);
                    ctx.line_to(c.x as f64, c.y as f64);
                    ctx.close_path();
                    ctx.fill();
                }
                DrawCmd::Circle {
                    center,
                    radius,
                    color,
                } => {
                    ctx.set_fill_style_str(&css(color));
                    ctx.begin_path();
                    ctx.arc(
                        center.x as f64,
                        center.y as f64,
                        radius as f64,
                        0.0,
                        std::f64::consts::TAU,
                    )
                    .ok();
                    ctx.fill();
                }
                DrawCmd::PushTransform { origin, rotation } => {
                    ctx.save();
                    ctx.translate(origin.x as f64, origin.y as f64).ok();
                    ctx.rotate(rotation as f64).ok();
                }
                DrawCmd::PopTransform => ctx.restore(),
                DrawCmd::SetAlpha(alpha) => ctx.set_global_alpha(alpha as f64),
            }
        }
    }
}
