//! Ergonomic wrapper around a [`DrawingContext`].
//!
//! Widget paint callbacks receive a [`Graphics`] rather than the raw
//! context: it adds color/rect conveniences, replays recorded [`Path`]
//! objects, and scopes save/restore pairs.

use crate::color::{Color, Fill};
use crate::font::Font;
use crate::geometry::{Bounds, Rectangle};
use crate::path::{Path, PathOp};
use crate::render::context::DrawingContext;

pub struct Graphics<'a> {
    ctx: &'a mut dyn DrawingContext,
}

impl<'a> Graphics<'a> {
    pub fn new(ctx: &'a mut dyn DrawingContext) -> Self {
        Self { ctx }
    }

    /// Direct access to the underlying context for operations the wrapper
    /// does not re-export (metrics, images, transforms).
    pub fn context(&mut self) -> &mut dyn DrawingContext {
        self.ctx
    }

    pub fn set_color(&mut self, color: impl Into<Color>) {
        self.ctx.set_fill(Fill::from(color.into()));
    }

    pub fn set_fill(&mut self, fill: Fill) {
        self.ctx.set_fill(fill);
    }

    pub fn set_font(&mut self, font: Font) {
        self.ctx.set_font(font);
    }

    pub fn fill_rect(&mut self, r: impl Into<Rectangle<f64>>) {
        self.ctx.fill_rect(r.into());
    }

    /// Replay a recorded path into the context and fill it.
    pub fn fill_path(&mut self, path: &Path) {
        self.replay(path);
        self.ctx.fill();
    }

    /// Replay a recorded path into the context and stroke it.
    pub fn stroke_path(&mut self, path: &Path) {
        self.replay(path);
        self.ctx.stroke();
    }

    /// Draw `text` with its start position at `(x, y)`.
    pub fn draw_text(&mut self, text: &str, x: f64, y: f64) -> bool {
        self.ctx.clear_path();
        self.ctx.move_to(x, y);
        self.ctx.show_text(text)
    }

    pub fn save(&mut self) {
        self.ctx.save();
    }

    pub fn restore(&mut self) {
        self.ctx.restore();
    }

    /// Run `f` between a save/restore pair.
    pub fn saved(&mut self, f: impl FnOnce(&mut Graphics<'_>)) {
        self.ctx.save();
        f(self);
        self.ctx.restore();
    }

    pub fn clip(&mut self, r: Bounds) {
        self.ctx.clip(r);
    }

    pub fn last_clip(&self) -> Bounds {
        self.ctx.last_clip()
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.ctx.translate(dx, dy);
    }

    pub fn device_scale(&self) -> f64 {
        self.ctx.device_scale()
    }

    fn replay(&mut self, path: &Path) {
        self.ctx.clear_path();
        for op in path {
            match *op {
                PathOp::MoveTo(p) => self.ctx.move_to(p.x, p.y),
                PathOp::LineTo(p) => self.ctx.line_to(p.x, p.y),
                PathOp::QuadTo(c, p) => self.ctx.quad_to(c.x, c.y, p.x, p.y),
                PathOp::CubicTo(c1, c2, p) => {
                    self.ctx.cubic_to(c1.x, c1.y, c2.x, c2.y, p.x, p.y)
                }
                PathOp::Close => self.ctx.close_path(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Bounds;
    use crate::render::backends::null::{NativeCall, NullContext};

    fn frame() -> NullContext {
        let mut ctx = NullContext::new();
        ctx.begin_frame(Bounds::new(0, 0, 200, 200), 1.0).unwrap();
        ctx
    }

    #[test]
    fn fill_path_replays_all_ops() {
        let mut ctx = frame();
        let mut path = Path::new();
        path.move_to(0.0, 0.0);
        path.line_to(10.0, 0.0);
        path.quad_to(15.0, 5.0, 10.0, 10.0);
        path.close_path();

        let mut g = Graphics::new(&mut ctx);
        g.set_color(0xffff0000u32);
        g.fill_path(&path);

        match ctx.calls().last().unwrap() {
            NativeCall::FillPath { ops, color } => {
                assert_eq!(*ops, 4);
                assert_eq!(*color, Color::new(0xffff0000));
            }
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[test]
    fn stroke_path_uses_line_width() {
        let mut ctx = frame();
        let mut path = Path::new();
        path.add_rectangle(0.0, 0.0, 10.0, 10.0);

        let mut g = Graphics::new(&mut ctx);
        g.context().set_line_width(2.0);
        g.stroke_path(&path);

        match ctx.calls().last().unwrap() {
            NativeCall::StrokePath { line_width, .. } => assert_eq!(*line_width, 2.0),
            other => panic!("unexpected call {other:?}"),
        }
    }

    #[test]
    fn draw_text_positions_then_shows() {
        let mut ctx = frame();
        let mut g = Graphics::new(&mut ctx);
        assert!(g.draw_text("hi", 5.0, 9.0));

        assert!(ctx
            .calls()
            .iter()
            .any(|c| matches!(c, NativeCall::ShowText { text, .. } if text == "hi")));
    }

    #[test]
    fn saved_scope_restores_state() {
        let mut ctx = frame();
        let mut g = Graphics::new(&mut ctx);
        g.set_color(0xff0000ffu32);
        g.saved(|g| {
            g.set_color(0xff00ff00u32);
            g.translate(10.0, 10.0);
        });
        g.fill_rect(Rectangle::new(0.0, 0.0, 1.0, 1.0));

        match ctx.calls().last().unwrap() {
            NativeCall::FillRect { color, .. } => assert_eq!(*color, Color::new(0xff0000ff)),
            other => panic!("unexpected call {other:?}"),
        }
    }
}
