//! Cairo rendering backend.
//!
//! Coordinate system strategy: cairo's native origin is already top-left
//! with y growing downward, which matches this crate's convention, so no
//! flip correction is needed anywhere. The two real adaptations are the
//! quadratic curve (cairo only has cubics, so quadratics are
//! degree-elevated around the current point) and clip exclusion, which is
//! intentionally disabled (the native even-odd trick never produced correct
//! results upstream and is left out rather than half-fixed).

use crate::color::{Color, Fill};
use crate::config::RenderConfig;
use crate::errors::RenderError;
use crate::font::{Font, FontMetrics, FontStyle, TextMetrics};
use crate::geometry::{Bounds, Point, Rectangle, Transform};
use crate::image::{Image, PixelFormat};
use crate::path::quad_to_cubic;
use crate::render::context::{DrawingContext, StateStack};
use crate::render::graphics::Graphics;
use crate::render::surface::{RgbaImage, SnapshotFormat, SurfaceSize};
use crate::render::view::{RenderFn, View};

/// Drawing context mapped onto a `cairo::Context`.
///
/// The native context handle is held only between `begin_frame` and
/// `end_frame`; cairo refcounts it, so the clone taken at frame start is
/// cheap and dropped at frame end.
pub struct CairoContext {
    cr: Option<cairo::Context>,
    states: StateStack,
    pending_fill: Option<Color>,
    applied_color: Option<Color>,
    default_family: String,
}

impl CairoContext {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            cr: None,
            states: StateStack::default(),
            pending_fill: None,
            applied_color: None,
            default_family: config.default_font_family.clone(),
        }
    }

    /// Bind the frame's native context, reset all paint state, and apply
    /// the initial clip to `bounds`. Fails when the native context is
    /// already in an error state; the caller should skip the frame.
    pub fn begin_frame(&mut self, cr: &cairo::Context, bounds: Bounds) -> Result<(), RenderError> {
        cr.status()
            .map_err(|e| RenderError::Backend(e.to_string()))?;
        self.cr = Some(cr.clone());
        self.states.reset();
        self.pending_fill = None;
        self.applied_color = None;
        self.sync_font();
        self.clip(bounds);
        Ok(())
    }

    pub fn end_frame(&mut self) {
        self.cr = None;
        self.applied_color = None;
    }

    pub fn in_frame(&self) -> bool {
        self.cr.is_some()
    }

    fn cr(&self) -> Option<&cairo::Context> {
        if self.cr.is_none() {
            log::debug!("CairoContext: operation outside a frame, ignoring");
        }
        self.cr.as_ref()
    }

    /// Materialize a pending fill color into the native source. Gated so
    /// back-to-back draws with unchanged color touch cairo once.
    fn apply_pending_state(&mut self) {
        let Some(cr) = self.cr.as_ref() else {
            return;
        };

        if let Some(color) = self.pending_fill.take() {
            if self.applied_color != Some(color) {
                cr.set_source_rgba(color.red_f(), color.green_f(), color.blue_f(), color.alpha_f());
                self.applied_color = Some(color);
            }
        }
        if self.applied_color.is_none() {
            let color = self.states.current().color;
            cr.set_source_rgba(color.red_f(), color.green_f(), color.blue_f(), color.alpha_f());
            self.applied_color = Some(color);
        }
    }

    /// Push the active font into cairo's toy text state. Cheap enough to
    /// apply eagerly; cairo holds no per-font native object we would churn.
    fn sync_font(&self) {
        let Some(cr) = self.cr.as_ref() else {
            return;
        };

        let font = &self.states.current().font;
        let family = font.family().unwrap_or(&self.default_family);
        let slant = if font.italic() {
            cairo::FontSlant::Italic
        } else {
            cairo::FontSlant::Normal
        };
        let weight = if font.style().contains(FontStyle::BOLD) {
            cairo::FontWeight::Bold
        } else {
            cairo::FontWeight::Normal
        };
        cr.select_font_face(family, slant, weight);
        cr.set_font_size(font.height());
    }

    fn current_point(&self, cr: &cairo::Context) -> Point<f64> {
        match cr.current_point() {
            Ok((x, y)) => Point::new(x, y),
            Err(_) => Point::new(0.0, 0.0),
        }
    }

    /// Figures started without a `move_to` begin at the origin.
    fn ensure_current_point(&self, cr: &cairo::Context) {
        if !cr.has_current_point().unwrap_or(false) {
            cr.move_to(0.0, 0.0);
        }
    }
}

impl DrawingContext for CairoContext {
    fn device_scale(&self) -> f64 {
        match self.cr.as_ref() {
            Some(cr) => cr.target().device_scale().1,
            None => 1.0,
        }
    }

    fn save(&mut self) {
        let Some(cr) = self.cr() else { return };
        if let Err(e) = cr.save() {
            log::debug!("CairoContext: save failed: {e}");
        }
        self.states.save();
    }

    fn restore(&mut self) {
        let Some(cr) = self.cr() else { return };
        if let Err(e) = cr.restore() {
            log::debug!("CairoContext: restore failed: {e}");
        }
        if self.states.restore() {
            // The native source/font were rewound with the graphics state;
            // forget what we think is applied and re-materialize on the
            // next draw.
            self.applied_color = None;
            self.pending_fill = None;
            self.sync_font();
        }
    }

    fn set_line_width(&mut self, width: f64) {
        self.states.current_mut().line_width = width;
        if let Some(cr) = self.cr() {
            cr.set_line_width(width);
        }
    }

    fn clear_path(&mut self) {
        if let Some(cr) = self.cr() {
            cr.new_path();
        }
    }

    fn move_to(&mut self, x: f64, y: f64) {
        if let Some(cr) = self.cr() {
            cr.move_to(x, y);
        }
    }

    fn line_to(&mut self, x: f64, y: f64) {
        let Some(cr) = self.cr() else { return };
        self.ensure_current_point(cr);
        cr.line_to(x, y);
    }

    fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        let Some(cr) = self.cr() else { return };
        self.ensure_current_point(cr);
        // cairo has no quadratic primitive; elevate around the current point.
        let p0 = self.current_point(cr);
        let (c1, c2) = quad_to_cubic(p0, Point::new(cx, cy), Point::new(x, y));
        cr.curve_to(c1.x, c1.y, c2.x, c2.y, x, y);
    }

    fn cubic_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        let Some(cr) = self.cr() else { return };
        self.ensure_current_point(cr);
        cr.curve_to(c1x, c1y, c2x, c2y, x, y);
    }

    fn close_path(&mut self) {
        if let Some(cr) = self.cr() {
            cr.close_path();
        }
    }

    fn fill(&mut self) {
        if self.cr().is_none() {
            return;
        }
        self.apply_pending_state();
        if let Some(cr) = self.cr.as_ref() {
            if let Err(e) = cr.fill() {
                log::debug!("CairoContext: fill failed: {e}");
            }
        }
    }

    fn stroke(&mut self) {
        if self.cr().is_none() {
            return;
        }
        self.apply_pending_state();
        if let Some(cr) = self.cr.as_ref() {
            if let Err(e) = cr.stroke() {
                log::debug!("CairoContext: stroke failed: {e}");
            }
        }
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        let Some(cr) = self.cr() else { return };
        cr.translate(dx, dy);
        self.states.translate_clip(dx, dy);
    }

    fn transform(&mut self, mat: Transform) {
        let Some(cr) = self.cr() else { return };
        // cairo_matrix_t field order is xx, yx, xy, yy, x0, y0.
        cr.transform(cairo::Matrix::new(
            mat.m00, mat.m10, mat.m01, mat.m11, mat.m02, mat.m12,
        ));
    }

    fn clip(&mut self, r: Bounds) {
        if self.cr().is_none() {
            return;
        }
        self.states.set_clip(r);
        if let Some(cr) = self.cr.as_ref() {
            cr.new_path();
            cr.rectangle(r.x as f64, r.y as f64, r.width as f64, r.height as f64);
            cr.clip();
        }
    }

    fn exclude_clip(&mut self, _r: Bounds) {
        // Disabled: the even-odd clip trick never produced correct
        // exclusions on this backend. Callers are documented not to rely
        // on exclusion narrowing the drawable area.
    }

    fn last_clip(&self) -> Bounds {
        self.states.last_clip()
    }

    fn reset_clip(&mut self) {
        if self.cr().is_none() {
            return;
        }
        self.states.clear_clip();
        if let Some(cr) = self.cr.as_ref() {
            cr.reset_clip();
        }
    }

    fn font(&self) -> Font {
        self.states.current().font.clone()
    }

    fn set_font(&mut self, font: Font) {
        self.states.current_mut().font = font;
        self.sync_font();
    }

    fn set_fill(&mut self, fill: Fill) {
        let color = fill.color();
        self.states.current_mut().color = color;
        self.pending_fill = Some(color);
    }

    fn fill_rect(&mut self, r: Rectangle<f64>) {
        if self.cr().is_none() {
            return;
        }
        self.apply_pending_state();
        if let Some(cr) = self.cr.as_ref() {
            cr.rectangle(r.x, r.y, r.width, r.height);
            if let Err(e) = cr.fill() {
                log::debug!("CairoContext: fill_rect failed: {e}");
            }
        }
    }

    fn font_metrics(&self) -> FontMetrics {
        let Some(cr) = self.cr.as_ref() else {
            return FontMetrics::default();
        };

        match cr.font_extents() {
            Ok(fe) => FontMetrics {
                ascent: fe.ascent(),
                descent: fe.descent(),
                height: fe.height(),
                max_x_advance: fe.max_x_advance(),
                max_y_advance: fe.max_y_advance(),
            },
            Err(e) => {
                log::debug!("CairoContext: font_extents failed: {e}");
                FontMetrics::default()
            }
        }
    }

    fn text_metrics(&self, text: &str) -> TextMetrics {
        let Some(cr) = self.cr.as_ref() else {
            return TextMetrics::default();
        };

        match cr.text_extents(text) {
            Ok(te) => TextMetrics {
                width: te.width(),
                height: te.height(),
                x_bearing: te.x_bearing(),
                y_bearing: te.y_bearing(),
                x_advance: te.x_advance(),
                y_advance: te.y_advance(),
            },
            Err(e) => {
                log::debug!("CairoContext: text_extents failed: {e}");
                TextMetrics::default()
            }
        }
    }

    fn show_text(&mut self, text: &str) -> bool {
        if self.cr().is_none() {
            return false;
        }
        if text.is_empty() {
            return true;
        }
        self.apply_pending_state();
        let Some(cr) = self.cr.as_ref() else {
            return false;
        };
        match cr.show_text(text) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("CairoContext: show_text failed: {e}");
                false
            }
        }
    }

    fn draw_image(&mut self, image: &Image, transform: Transform) {
        if self.cr().is_none() {
            return;
        }
        if !image.is_valid() {
            log::debug!("CairoContext: ignoring invalid image");
            return;
        }

        let format = match image.format() {
            PixelFormat::Argb32 => cairo::Format::ARgb32,
            PixelFormat::Rgb24 => cairo::Format::Rgb24,
        };

        // cairo takes ownership of the pixel memory for the lifetime of the
        // surface, so hand it a copy.
        let data = image.data().to_vec();
        let surface = match cairo::ImageSurface::create_for_data(
            data,
            format,
            image.width() as i32,
            image.height() as i32,
            image.stride() as i32,
        ) {
            Ok(s) => s,
            Err(e) => {
                log::debug!("CairoContext: image surface creation failed: {e}");
                return;
            }
        };

        self.save();
        self.transform(transform);
        if let Some(cr) = self.cr.as_ref() {
            if cr.set_source_surface(&surface, 0.0, 0.0).is_ok() {
                if let Err(e) = cr.paint() {
                    log::debug!("CairoContext: image paint failed: {e}");
                }
            }
        }
        self.restore();
        // The source pattern changed behind our bookkeeping.
        self.applied_color = None;
    }
}

/// Headless view rendering into an owned cairo image surface.
///
/// The surface is allocated at device resolution; the device scale is
/// re-applied on every expose so a scale change between frames simply takes
/// effect on the next repaint.
pub struct CairoView {
    surface: Option<cairo::ImageSurface>,
    context: Option<CairoContext>,
    render: RenderFn,
    config: RenderConfig,
    size: SurfaceSize,
    scale: f64,
}

impl CairoView {
    pub fn new(config: &RenderConfig, render: RenderFn) -> Self {
        Self {
            surface: None,
            context: None,
            render,
            config: config.clone(),
            size: config.surface_size,
            scale: 1.0,
        }
    }

    pub fn size(&self) -> SurfaceSize {
        self.size
    }

    /// Change the backing store size; takes effect immediately.
    pub fn resize(&mut self, size: SurfaceSize) {
        self.size = size;
        if self.context.is_some() {
            self.surface = Self::create_surface(size, self.scale);
        }
    }

    /// Update the device scale reported by the host windowing layer.
    pub fn set_scale_factor(&mut self, scale: f64) {
        if (scale - self.scale).abs() > f64::EPSILON {
            self.scale = scale;
            if self.context.is_some() {
                self.surface = Self::create_surface(self.size, scale);
            }
        }
    }

    /// Copy out the rendered pixels.
    pub fn snapshot(&mut self) -> Option<RgbaImage> {
        let surface = self.surface.as_mut()?;
        surface.flush();

        let width = surface.width() as u32;
        let height = surface.height() as u32;
        let stride = surface.stride() as u32;
        let pixels = match surface.data() {
            Ok(data) => data.to_vec(),
            Err(e) => {
                log::warn!("CairoView: snapshot failed: {e}");
                return None;
            }
        };

        Some(RgbaImage::from_raw(
            pixels,
            width,
            height,
            stride,
            SnapshotFormat::PremulArgb32,
        ))
    }

    fn create_surface(size: SurfaceSize, scale: f64) -> Option<cairo::ImageSurface> {
        let device_w = (size.width as f64 * scale).ceil() as i32;
        let device_h = (size.height as f64 * scale).ceil() as i32;
        match cairo::ImageSurface::create(cairo::Format::ARgb32, device_w, device_h) {
            Ok(s) => Some(s),
            Err(e) => {
                log::error!("CairoView: surface creation failed: {e}");
                None
            }
        }
    }
}

/// Factory the windowing layer calls when a window needs a cairo surface.
pub fn create_view(config: &RenderConfig, render: RenderFn) -> CairoView {
    CairoView::new(config, render)
}

impl View for CairoView {
    fn created(&mut self) {
        self.surface = Self::create_surface(self.size, self.scale);
        self.context = Some(CairoContext::new(&self.config));
    }

    fn destroyed(&mut self) {
        self.context = None;
        self.surface = None;
    }

    fn expose(&mut self, frame: Bounds) {
        let (Some(surface), Some(ctx)) = (self.surface.as_ref(), self.context.as_mut()) else {
            log::warn!("CairoView: expose before created");
            return;
        };

        let cr = match cairo::Context::new(surface) {
            Ok(cr) => cr,
            Err(e) => {
                log::error!("CairoView: cannot create cairo context: {e}");
                return;
            }
        };

        // Re-applied every expose: the window may have migrated to a
        // monitor with a different scale since the last frame.
        surface.set_device_scale(self.scale, self.scale);

        if ctx.begin_frame(&cr, frame).is_ok() {
            let mut g = Graphics::new(ctx);
            (self.render)(&mut g);
            ctx.end_frame();
        }
    }

    fn scale_factor(&self) -> f64 {
        self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::Path;

    fn pixel(img: &RgbaImage, x: u32, y: u32) -> [u8; 4] {
        let o = (y * img.stride + x * 4) as usize;
        // little-endian ARGB32 words: B, G, R, A in memory
        [
            img.pixels[o],
            img.pixels[o + 1],
            img.pixels[o + 2],
            img.pixels[o + 3],
        ]
    }

    fn view_with(render: RenderFn) -> CairoView {
        let config = RenderConfig {
            surface_size: SurfaceSize::new(100, 100),
            ..Default::default()
        };
        let mut view = create_view(&config, render);
        view.created();
        view
    }

    #[test]
    fn fill_rect_renders_red_pixels() {
        let mut view = view_with(Box::new(|g| {
            g.set_color(0xffff0000u32);
            g.fill_rect(Rectangle::new(10.0, 10.0, 50.0, 50.0));
        }));

        view.expose(Bounds::new(0, 0, 100, 100));
        let img = view.snapshot().unwrap();

        assert_eq!(pixel(&img, 20, 20), [0, 0, 255, 255]);
        // outside the rectangle stays untouched
        assert_eq!(pixel(&img, 80, 80)[3], 0);
    }

    #[test]
    fn clip_discards_outside_drawing() {
        let mut view = view_with(Box::new(|g| {
            g.clip(Bounds::new(0, 0, 30, 30));
            g.set_color(0xff00ff00u32);
            g.fill_rect(Rectangle::new(0.0, 0.0, 100.0, 100.0));
        }));

        view.expose(Bounds::new(0, 0, 100, 100));
        let img = view.snapshot().unwrap();

        assert_eq!(pixel(&img, 10, 10), [0, 255, 0, 255]);
        assert_eq!(pixel(&img, 50, 50)[3], 0);
    }

    #[test]
    fn state_resets_between_frames() {
        let mut frames = 0u32;
        let mut view = view_with(Box::new(move |g| {
            frames += 1;
            if frames == 1 {
                g.set_color(0xffff0000u32);
            }
            // Frame two sets no color, so it must fill with the per-frame
            // default (opaque black), not the red left by frame one.
            g.fill_rect(Rectangle::new(0.0, 0.0, 10.0, 10.0));
        }));

        view.expose(Bounds::new(0, 0, 100, 100));
        view.expose(Bounds::new(0, 0, 100, 100));

        let img = view.snapshot().unwrap();
        assert_eq!(pixel(&img, 5, 5), [0, 0, 0, 255]);
    }

    #[test]
    fn filled_path_renders_triangle_interior() {
        let mut view = view_with(Box::new(|g| {
            let mut tri = Path::new();
            tri.move_to(50.0, 10.0);
            tri.line_to(90.0, 90.0);
            tri.line_to(10.0, 90.0);
            tri.close_path();
            g.set_color(0xff0000ffu32);
            g.fill_path(&tri);
        }));

        view.expose(Bounds::new(0, 0, 100, 100));
        let img = view.snapshot().unwrap();

        // centroid is inside, top corners are outside
        assert_eq!(pixel(&img, 50, 60), [255, 0, 0, 255]);
        assert_eq!(pixel(&img, 5, 5)[3], 0);
    }

    #[test]
    fn last_clip_tracks_translate() {
        let config = RenderConfig::default();
        let mut ctx = CairoContext::new(&config);
        let surface = cairo::ImageSurface::create(cairo::Format::ARgb32, 50, 50).unwrap();
        let cr = cairo::Context::new(&surface).unwrap();

        ctx.begin_frame(&cr, Bounds::new(0, 0, 50, 50)).unwrap();
        assert_eq!(ctx.last_clip(), Bounds::new(0, 0, 50, 50));

        ctx.translate(10.0, 5.0);
        assert_eq!(ctx.last_clip(), Bounds::new(-10, -5, 50, 50));

        ctx.clip(Bounds::new(1, 2, 3, 4));
        assert_eq!(ctx.last_clip(), Bounds::new(1, 2, 3, 4));
        ctx.end_frame();
    }

    #[test]
    fn ops_outside_frame_do_not_crash() {
        let mut ctx = CairoContext::new(&RenderConfig::default());
        ctx.fill_rect(Rectangle::new(0.0, 0.0, 10.0, 10.0));
        ctx.save();
        ctx.restore();
        assert!(!ctx.show_text("x"));
        assert_eq!(ctx.device_scale(), 1.0);
        assert_eq!(ctx.font_metrics(), FontMetrics::default());
    }

    #[test]
    fn text_metrics_measure_nonempty_strings() {
        let mut view = view_with(Box::new(|g| {
            g.set_font(Font::new(14.0));
            let wide = g.context().text_metrics("wide string here");
            let narrow = g.context().text_metrics("i");
            assert!(wide.width > narrow.width);
            assert!(g.context().font_metrics().height > 0.0);
        }));
        view.expose(Bounds::new(0, 0, 100, 100));
    }
}
