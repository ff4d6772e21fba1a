//! Recording backend that performs no real rendering.
//!
//! Every operation that would touch a native API is appended to a call log
//! instead. The test-suite uses the log to observe exactly which native
//! calls a sequence of contract operations produces, in particular the
//! deferred materialization of fill colors and fonts. This also serves as
//! the reference implementation of the shared frame state machine.

use crate::color::{Color, Fill};
use crate::config::RenderConfig;
use crate::errors::RenderError;
use crate::font::{Font, FontMetrics, TextMetrics};
use crate::geometry::{Bounds, Point, Rectangle, Transform};
use crate::image::Image;
use crate::path::Path;
use crate::render::context::{DrawingContext, StateStack};
use crate::render::graphics::Graphics;
use crate::render::view::{RenderFn, View};

/// One recorded native-equivalent call.
#[derive(Clone, Debug, PartialEq)]
pub enum NativeCall {
    CreateBrush(Color),
    CreateFont(Font),
    Save,
    Restore,
    PushClip(Bounds),
    ExcludeClip(Bounds),
    ResetClip,
    Translate(f64, f64),
    Transform(Transform),
    FillPath { ops: usize, color: Color },
    StrokePath { ops: usize, color: Color, line_width: f64 },
    FillRect { rect: Rectangle<f64>, color: Color },
    ShowText { text: String, at: Point<f64>, color: Color },
    DrawImage { width: u32, height: u32 },
}

/// Drawing context that records calls instead of rasterizing.
#[derive(Debug, Default)]
pub struct NullContext {
    states: StateStack,
    pending_fill: Option<Color>,
    pending_font: Option<Font>,
    brush: Option<Color>,
    native_font: Option<Font>,
    path: Path,
    current_point: Point<f64>,
    in_frame: bool,
    scale: f64,
    calls: Vec<NativeCall>,
}

impl NullContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a frame. Resets all paint state, clears the call log of the
    /// previous frame, and applies the initial clip to `bounds`.
    pub fn begin_frame(&mut self, bounds: Bounds, scale: f64) -> Result<(), RenderError> {
        self.states.reset();
        self.pending_fill = None;
        self.pending_font = None;
        self.brush = None;
        self.native_font = None;
        self.path.clear();
        self.current_point = Point::default();
        self.calls.clear();
        self.scale = scale;
        self.in_frame = true;
        self.clip(bounds);
        Ok(())
    }

    /// Release per-frame resources and unbind the frame. The call log is
    /// kept until the next `begin_frame` so callers can inspect it.
    pub fn end_frame(&mut self) {
        self.brush = None;
        self.native_font = None;
        self.path.clear();
        self.in_frame = false;
    }

    pub fn calls(&self) -> &[NativeCall] {
        &self.calls
    }

    pub fn in_frame(&self) -> bool {
        self.in_frame
    }

    fn guard(&self, op: &str) -> bool {
        if !self.in_frame {
            log::debug!("NullContext: {op} called outside a frame, ignoring");
        }
        self.in_frame
    }

    fn effective_color(&self) -> Color {
        self.brush.unwrap_or(self.states.current().color)
    }

    /// Materialize pending fill/font state into "native" objects, gated so
    /// unchanged state never re-creates a resource.
    fn apply_pending_state(&mut self) {
        if let Some(color) = self.pending_fill.take() {
            if self.brush != Some(color) {
                self.calls.push(NativeCall::CreateBrush(color));
                self.brush = Some(color);
            }
        }
        if self.brush.is_none() {
            let color = self.states.current().color;
            self.calls.push(NativeCall::CreateBrush(color));
            self.brush = Some(color);
        }
        if let Some(font) = self.pending_font.take() {
            if self.native_font.as_ref() != Some(&font) {
                self.calls.push(NativeCall::CreateFont(font.clone()));
                self.native_font = Some(font);
            }
        }
    }
}

impl DrawingContext for NullContext {
    fn device_scale(&self) -> f64 {
        if self.in_frame {
            self.scale
        } else {
            1.0
        }
    }

    fn save(&mut self) {
        if !self.guard("save") {
            return;
        }
        self.states.save();
        self.calls.push(NativeCall::Save);
    }

    fn restore(&mut self) {
        if !self.guard("restore") {
            return;
        }
        if self.states.restore() {
            self.calls.push(NativeCall::Restore);
            // Native brush/font objects survive a restore on several real
            // backends; flag them stale when the restored state disagrees.
            let state = self.states.current();
            if self.brush.is_some() && self.brush != Some(state.color) {
                self.pending_fill = Some(state.color);
            }
            if self.native_font.is_some() && self.native_font.as_ref() != Some(&state.font) {
                self.pending_font = Some(state.font.clone());
            }
        }
    }

    fn set_line_width(&mut self, width: f64) {
        if !self.guard("set_line_width") {
            return;
        }
        self.states.current_mut().line_width = width;
    }

    fn clear_path(&mut self) {
        self.path.clear();
    }

    fn move_to(&mut self, x: f64, y: f64) {
        self.path.move_to(x, y);
        self.current_point = Point::new(x, y);
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.path.line_to(x, y);
        self.current_point = Point::new(x, y);
    }

    fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        self.path.quad_to(cx, cy, x, y);
        self.current_point = Point::new(x, y);
    }

    fn cubic_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        self.path.cubic_to(c1x, c1y, c2x, c2y, x, y);
        self.current_point = Point::new(x, y);
    }

    fn close_path(&mut self) {
        self.path.close_path();
    }

    fn fill(&mut self) {
        if !self.guard("fill") {
            return;
        }
        self.apply_pending_state();
        self.calls.push(NativeCall::FillPath {
            ops: self.path.ops().len(),
            color: self.effective_color(),
        });
        self.path.clear();
    }

    fn stroke(&mut self) {
        if !self.guard("stroke") {
            return;
        }
        self.apply_pending_state();
        self.calls.push(NativeCall::StrokePath {
            ops: self.path.ops().len(),
            color: self.effective_color(),
            line_width: self.states.current().line_width,
        });
        self.path.clear();
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        if !self.guard("translate") {
            return;
        }
        self.states.translate_clip(dx, dy);
        self.calls.push(NativeCall::Translate(dx, dy));
    }

    fn transform(&mut self, mat: Transform) {
        if !self.guard("transform") {
            return;
        }
        self.calls.push(NativeCall::Transform(mat));
    }

    fn clip(&mut self, r: Bounds) {
        if !self.guard("clip") {
            return;
        }
        self.states.set_clip(r);
        self.calls.push(NativeCall::PushClip(r));
    }

    fn exclude_clip(&mut self, r: Bounds) {
        if !self.guard("exclude_clip") {
            return;
        }
        // The tracked clip rectangle deliberately does not shrink.
        self.calls.push(NativeCall::ExcludeClip(r));
    }

    fn last_clip(&self) -> Bounds {
        self.states.last_clip()
    }

    fn reset_clip(&mut self) {
        if !self.guard("reset_clip") {
            return;
        }
        self.states.clear_clip();
        self.calls.push(NativeCall::ResetClip);
    }

    fn font(&self) -> Font {
        self.states.current().font.clone()
    }

    fn set_font(&mut self, font: Font) {
        if !self.guard("set_font") {
            return;
        }
        self.states.current_mut().font = font.clone();
        self.pending_font = Some(font);
    }

    fn set_fill(&mut self, fill: Fill) {
        if !self.guard("set_fill") {
            return;
        }
        let color = fill.color();
        self.states.current_mut().color = color;
        self.pending_fill = Some(color);
    }

    fn fill_rect(&mut self, r: Rectangle<f64>) {
        if !self.guard("fill_rect") {
            return;
        }
        self.apply_pending_state();
        self.calls.push(NativeCall::FillRect {
            rect: r,
            color: self.effective_color(),
        });
    }

    fn font_metrics(&self) -> FontMetrics {
        // Synthetic metrics derived from the font height, stable enough for
        // layout code exercised in tests.
        let height = self.states.current().font.height();
        FontMetrics {
            ascent: height * 0.8,
            descent: height * 0.2,
            height,
            max_x_advance: height,
            max_y_advance: height,
        }
    }

    fn text_metrics(&self, text: &str) -> TextMetrics {
        let height = self.states.current().font.height();
        let width = text.chars().count() as f64 * height * 0.5;
        TextMetrics {
            width,
            height,
            x_bearing: 0.0,
            y_bearing: -height * 0.8,
            x_advance: width,
            y_advance: 0.0,
        }
    }

    fn show_text(&mut self, text: &str) -> bool {
        if !self.guard("show_text") {
            return false;
        }
        if text.is_empty() {
            return true;
        }
        self.apply_pending_state();
        self.calls.push(NativeCall::ShowText {
            text: text.to_string(),
            at: self.current_point,
            color: self.effective_color(),
        });
        true
    }

    fn draw_image(&mut self, image: &Image, _transform: Transform) {
        if !self.guard("draw_image") {
            return;
        }
        if !image.is_valid() {
            log::debug!("NullContext: ignoring invalid image");
            return;
        }
        self.calls.push(NativeCall::DrawImage {
            width: image.width(),
            height: image.height(),
        });
    }
}

/// View bound to a [`NullContext`]; drives the expose cycle without any
/// native surface behind it.
pub struct NullView {
    context: Option<NullContext>,
    render: RenderFn,
    bounds: Bounds,
}

impl NullView {
    pub fn new(config: &RenderConfig, render: RenderFn) -> Self {
        Self {
            context: None,
            render,
            bounds: config.surface_size.bounds(),
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn context(&self) -> Option<&NullContext> {
        self.context.as_ref()
    }
}

/// Factory mirroring the per-backend `create_view` entry point.
pub fn create_view(config: &RenderConfig, render: RenderFn) -> NullView {
    NullView::new(config, render)
}

impl View for NullView {
    fn created(&mut self) {
        self.context = Some(NullContext::new());
    }

    fn destroyed(&mut self) {
        self.context = None;
    }

    fn expose(&mut self, frame: Bounds) {
        let Some(ctx) = self.context.as_mut() else {
            log::warn!("NullView: expose before created");
            return;
        };

        if ctx.begin_frame(frame, 1.0).is_ok() {
            let mut g = Graphics::new(ctx);
            (self.render)(&mut g);
            ctx.end_frame();
        }
    }

    fn scale_factor(&self) -> f64 {
        1.0
    }
}
