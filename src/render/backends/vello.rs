//! Vello rendering backend.
//!
//! Vello is an immediate-mode vector rasterizer: there is no native
//! graphics-state stack, no current-transform register, and no retained
//! clip region. The adapter therefore carries all of that itself. Points
//! are transformed by the tracked CTM as they are recorded (so a transform
//! change mid-path only affects later segments, matching the native
//! backends), clips become balanced scene layers popped back to the saved
//! depth on `restore`, and the frame's output is a [`Scene`] the view
//! submits to the GPU at `end_frame`.

use std::cell::RefCell;
use std::sync::Arc;

use vello::kurbo::{Affine, BezPath, PathEl, Point as KPoint, Rect as KRect, Stroke};
use vello::peniko::{Blob, Color as VColor, Fill as VFill, Format, Image as VImage, Mix};
use vello::wgpu;
use vello::{AaConfig, RenderParams, Renderer, RendererOptions, Scene};

use crate::color::{Color, Fill};
use crate::config::RenderConfig;
use crate::errors::RenderError;
use crate::font::{Font, FontMetrics, TextMetrics};
use crate::geometry::{Bounds, Rectangle, Transform};
use crate::image::{Image, PixelFormat};
use crate::render::context::{DrawingContext, StateStack};
use crate::render::graphics::Graphics;
use crate::render::surface::SurfaceSize;
use crate::render::view::{RenderFn, View};

mod text;
use text::TextEngine;

/// Abstracts over the host's wgpu context (device, queue, texture
/// management) so any wgpu-based host can own the textures this backend
/// renders into.
pub trait WgpuContextProvider {
    fn device(&self) -> &wgpu::Device;
    fn queue(&self) -> &wgpu::Queue;
    fn create_texture(&self, width: u32, height: u32, format: wgpu::TextureFormat) -> u64;
    fn get_texture(&self, id: u64) -> Option<(wgpu::Texture, wgpu::TextureView)>;
    fn remove_texture(&self, id: u64);
}

fn vcolor(c: Color) -> VColor {
    VColor::new([
        c.red_f() as f32,
        c.green_f() as f32,
        c.blue_f() as f32,
        c.alpha_f() as f32,
    ])
}

fn affine(t: Transform) -> Affine {
    // kurbo coefficient order is [xx, yx, xy, yy, x0, y0].
    Affine::new([t.m00, t.m10, t.m01, t.m11, t.m02, t.m12])
}

fn rect_path(r: Bounds) -> KRect {
    KRect::new(
        r.x as f64,
        r.y as f64,
        (r.x + r.width) as f64,
        (r.y + r.height) as f64,
    )
}

/// Native transform/layer state saved alongside the paint state.
#[derive(Clone, Copy)]
struct SavedNative {
    ctm: Affine,
    layers: usize,
}

/// Drawing context that builds a [`Scene`] per frame.
pub struct VelloContext {
    scene: Option<Scene>,
    ctm: Affine,
    path: BezPath,
    current_point: KPoint,
    has_current_point: bool,
    states: StateStack,
    saved: Vec<SavedNative>,
    layers: usize,
    pending_fill: Option<Color>,
    text: RefCell<TextEngine>,
    default_family: String,
    scale: f64,
}

impl VelloContext {
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            scene: None,
            ctm: Affine::IDENTITY,
            path: BezPath::new(),
            current_point: KPoint::ZERO,
            has_current_point: false,
            states: StateStack::default(),
            saved: Vec::new(),
            layers: 0,
            pending_fill: None,
            text: RefCell::new(TextEngine::new()),
            default_family: config.default_font_family.clone(),
            scale: 1.0,
        }
    }

    /// Start a frame: fresh scene, device scale folded into the CTM, all
    /// paint state reset, initial clip applied to `bounds`.
    pub fn begin_frame(&mut self, bounds: Bounds, scale: f64) -> Result<(), RenderError> {
        self.scene = Some(Scene::new());
        self.ctm = Affine::scale(scale);
        self.path = BezPath::new();
        self.current_point = KPoint::ZERO;
        self.has_current_point = false;
        self.states.reset();
        self.saved.clear();
        self.layers = 0;
        self.pending_fill = None;
        self.scale = scale;
        self.clip(bounds);
        Ok(())
    }

    /// Close the frame and hand the built scene to the caller. Any clip
    /// layers still open are drained so the scene is balanced. Calling
    /// without an open frame is a contract violation reported as
    /// [`RenderError::NotInFrame`].
    pub fn end_frame(&mut self) -> Result<Scene, RenderError> {
        let Some(mut scene) = self.scene.take() else {
            return Err(RenderError::NotInFrame);
        };
        for _ in 0..self.layers {
            scene.pop_layer();
        }
        self.layers = 0;
        self.saved.clear();
        self.path = BezPath::new();
        Ok(scene)
    }

    pub fn in_frame(&self) -> bool {
        self.scene.is_some()
    }

    /// Open clip-layer count; balanced against pops by `restore` and
    /// `end_frame`.
    pub fn open_layers(&self) -> usize {
        self.layers
    }

    fn guard(&self, op: &str) -> bool {
        if self.scene.is_none() {
            log::debug!("VelloContext: {op} called outside a frame, ignoring");
        }
        self.scene.is_some()
    }

    /// The color a rasterizing op should use. Vello takes the color per
    /// draw call, so materialization is simply consuming the pending value.
    fn effective_color(&mut self) -> Color {
        self.pending_fill.take();
        self.states.current().color
    }

    /// Record a point in device space using the CTM at insertion time.
    fn device_point(&self, x: f64, y: f64) -> KPoint {
        self.ctm * KPoint::new(x, y)
    }

    fn ensure_figure(&mut self) {
        if !self.has_current_point {
            let origin = self.device_point(0.0, 0.0);
            self.path.push(PathEl::MoveTo(origin));
            self.current_point = KPoint::ZERO;
            self.has_current_point = true;
        }
    }
}

impl DrawingContext for VelloContext {
    fn device_scale(&self) -> f64 {
        if self.scene.is_some() {
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
        self.saved.push(SavedNative {
            ctm: self.ctm,
            layers: self.layers,
        });
    }

    fn restore(&mut self) {
        if !self.guard("restore") {
            return;
        }
        if self.states.restore() {
            if let Some(native) = self.saved.pop() {
                self.ctm = native.ctm;
                if let Some(scene) = self.scene.as_mut() {
                    while self.layers > native.layers {
                        scene.pop_layer();
                        self.layers -= 1;
                    }
                }
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
        self.path = BezPath::new();
        self.has_current_point = false;
    }

    fn move_to(&mut self, x: f64, y: f64) {
        let p = self.device_point(x, y);
        self.path.push(PathEl::MoveTo(p));
        self.current_point = KPoint::new(x, y);
        self.has_current_point = true;
    }

    fn line_to(&mut self, x: f64, y: f64) {
        self.ensure_figure();
        let p = self.device_point(x, y);
        self.path.push(PathEl::LineTo(p));
        self.current_point = KPoint::new(x, y);
    }

    fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        self.ensure_figure();
        let c = self.device_point(cx, cy);
        let p = self.device_point(x, y);
        self.path.push(PathEl::QuadTo(c, p));
        self.current_point = KPoint::new(x, y);
    }

    fn cubic_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        self.ensure_figure();
        let c1 = self.device_point(c1x, c1y);
        let c2 = self.device_point(c2x, c2y);
        let p = self.device_point(x, y);
        self.path.push(PathEl::CurveTo(c1, c2, p));
        self.current_point = KPoint::new(x, y);
    }

    fn close_path(&mut self) {
        self.ensure_figure();
        self.path.push(PathEl::ClosePath);
    }

    fn fill(&mut self) {
        if !self.guard("fill") {
            return;
        }
        let color = self.effective_color();
        let path = std::mem::take(&mut self.path);
        self.has_current_point = false;
        if let Some(scene) = self.scene.as_mut() {
            // Points are already in device space.
            scene.fill(VFill::NonZero, Affine::IDENTITY, vcolor(color), None, &path);
        }
    }

    fn stroke(&mut self) {
        if !self.guard("stroke") {
            return;
        }
        let color = self.effective_color();
        let width = self.states.current().line_width;
        let path = std::mem::take(&mut self.path);
        self.has_current_point = false;
        if let Some(scene) = self.scene.as_mut() {
            scene.stroke(
                &Stroke::new(width),
                Affine::IDENTITY,
                vcolor(color),
                None,
                &path,
            );
        }
    }

    fn translate(&mut self, dx: f64, dy: f64) {
        if !self.guard("translate") {
            return;
        }
        self.ctm = self.ctm * Affine::translate((dx, dy));
        self.states.translate_clip(dx, dy);
    }

    fn transform(&mut self, mat: Transform) {
        if !self.guard("transform") {
            return;
        }
        self.ctm = self.ctm * affine(mat);
    }

    fn clip(&mut self, r: Bounds) {
        if !self.guard("clip") {
            return;
        }
        self.states.set_clip(r);
        if let Some(scene) = self.scene.as_mut() {
            scene.push_layer(Mix::Clip, 1.0, self.ctm, &rect_path(r));
            self.layers += 1;
        }
    }

    fn exclude_clip(&mut self, _r: Bounds) {
        // Not supported by the layer-based clip model; per contract the
        // visible region is allowed to stay unchanged.
    }

    fn last_clip(&self) -> Bounds {
        self.states.last_clip()
    }

    fn reset_clip(&mut self) {
        if !self.guard("reset_clip") {
            return;
        }
        self.states.clear_clip();
        if let Some(scene) = self.scene.as_mut() {
            while self.layers > 0 {
                scene.pop_layer();
                self.layers -= 1;
            }
        }
    }

    fn font(&self) -> Font {
        self.states.current().font.clone()
    }

    fn set_font(&mut self, font: Font) {
        if !self.guard("set_font") {
            return;
        }
        // Shaping resolves the native font lazily at the next text op.
        self.states.current_mut().font = font;
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
        let color = self.effective_color();
        let ctm = self.ctm;
        if let Some(scene) = self.scene.as_mut() {
            scene.fill(
                VFill::NonZero,
                ctm,
                vcolor(color),
                None,
                &KRect::new(r.x, r.y, r.x + r.width, r.y + r.height),
            );
        }
    }

    fn font_metrics(&self) -> FontMetrics {
        if self.scene.is_none() {
            return FontMetrics::default();
        }
        let font = self.states.current().font.clone();
        self.text
            .borrow_mut()
            .line_metrics(&font, &self.default_family)
    }

    fn text_metrics(&self, text: &str) -> TextMetrics {
        if self.scene.is_none() {
            return TextMetrics::default();
        }
        let font = self.states.current().font.clone();
        self.text
            .borrow_mut()
            .measure(text, &font, &self.default_family)
    }

    fn show_text(&mut self, text: &str) -> bool {
        if !self.guard("show_text") {
            return false;
        }
        if text.is_empty() {
            return true;
        }

        let color = self.effective_color();
        let font = self.states.current().font.clone();
        let runs = match self
            .text
            .borrow_mut()
            .shape(text, &font, &self.default_family)
        {
            Ok(runs) => runs,
            Err(e) => {
                log::debug!("VelloContext: text shaping failed: {e}");
                return false;
            }
        };

        // The current path position is the text origin (first baseline).
        let origin = self.ctm * Affine::translate((self.current_point.x, self.current_point.y));
        let Some(scene) = self.scene.as_mut() else {
            return false;
        };

        for run in runs {
            scene
                .draw_glyphs(&run.font)
                .transform(origin)
                .font_size(run.size)
                .brush(vcolor(color))
                .draw(VFill::NonZero, run.glyphs.into_iter());
        }
        true
    }

    fn draw_image(&mut self, image: &Image, transform: Transform) {
        if !self.guard("draw_image") {
            return;
        }
        if !image.is_valid() {
            log::debug!("VelloContext: ignoring invalid image");
            return;
        }

        let rgba = to_rgba8(image);
        let vimage = VImage::new(
            Blob::new(Arc::new(rgba)),
            Format::Rgba8,
            image.width(),
            image.height(),
        );

        let ctm = self.ctm;
        if let Some(scene) = self.scene.as_mut() {
            scene.draw_image(&vimage, ctm * affine(transform));
        }
    }
}

/// Repack `Argb32`/`Rgb24` words into the byte-order RGBA layout vello
/// uploads. Packed words are little-endian, so memory order is B, G, R, A.
fn to_rgba8(image: &Image) -> Vec<u8> {
    let width = image.width() as usize;
    let height = image.height() as usize;
    let stride = image.stride() as usize;
    let data = image.data();

    let mut out = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        let row = &data[y * stride..];
        for x in 0..width {
            let o = x * 4;
            let (b, g, r) = (row[o], row[o + 1], row[o + 2]);
            let a = match image.format() {
                PixelFormat::Argb32 => row[o + 3],
                PixelFormat::Rgb24 => 0xff,
            };
            out.extend_from_slice(&[r, g, b, a]);
        }
    }
    out
}

/// View rendering frames into a host-owned wgpu texture.
pub struct VelloView<C: WgpuContextProvider> {
    provider: Arc<C>,
    renderer: Option<Renderer>,
    context: Option<VelloContext>,
    texture_id: Option<u64>,
    size: SurfaceSize,
    scale: f64,
    render: RenderFn,
    config: RenderConfig,
}

impl<C: WgpuContextProvider> VelloView<C> {
    pub fn new(config: &RenderConfig, provider: Arc<C>, render: RenderFn) -> Self {
        Self {
            provider,
            renderer: None,
            context: None,
            texture_id: None,
            size: config.surface_size,
            scale: 1.0,
            render,
            config: config.clone(),
        }
    }

    pub fn texture_id(&self) -> Option<u64> {
        self.texture_id
    }

    pub fn set_scale_factor(&mut self, scale: f64) {
        self.scale = scale;
    }

    fn submit(&mut self, scene: &Scene) {
        let (Some(renderer), Some(texture_id)) = (self.renderer.as_mut(), self.texture_id) else {
            return;
        };
        let Some((_texture, view)) = self.provider.get_texture(texture_id) else {
            log::error!("VelloView: texture {texture_id} vanished from the provider");
            return;
        };

        let params = RenderParams {
            base_color: VColor::TRANSPARENT,
            width: self.size.width,
            height: self.size.height,
            antialiasing_method: AaConfig::Area,
        };

        if let Err(e) = renderer.render_to_texture(
            self.provider.device(),
            self.provider.queue(),
            scene,
            &view,
            &params,
        ) {
            log::error!("VelloView: render_to_texture failed: {e}");
        }
    }
}

/// Factory the windowing layer calls when a window needs a GPU surface.
pub fn create_view<C: WgpuContextProvider>(
    config: &RenderConfig,
    provider: Arc<C>,
    render: RenderFn,
) -> VelloView<C> {
    VelloView::new(config, provider, render)
}

impl<C: WgpuContextProvider> View for VelloView<C> {
    fn created(&mut self) {
        match Renderer::new(self.provider.device(), RendererOptions::default()) {
            Ok(renderer) => self.renderer = Some(renderer),
            Err(e) => {
                log::error!("VelloView: renderer creation failed: {e}");
                return;
            }
        }
        self.texture_id = Some(self.provider.create_texture(
            self.size.width,
            self.size.height,
            wgpu::TextureFormat::Rgba8Unorm,
        ));
        self.context = Some(VelloContext::new(&self.config));
    }

    fn destroyed(&mut self) {
        if let Some(id) = self.texture_id.take() {
            self.provider.remove_texture(id);
        }
        self.context = None;
        self.renderer = None;
    }

    fn expose(&mut self, frame: Bounds) {
        let scale = self.scale;
        let Some(ctx) = self.context.as_mut() else {
            log::warn!("VelloView: expose before created");
            return;
        };

        if ctx.begin_frame(frame, scale).is_err() {
            return;
        }
        let mut g = Graphics::new(ctx);
        (self.render)(&mut g);
        if let Ok(scene) = ctx.end_frame() {
            self.submit(&scene);
        }
    }

    fn scale_factor(&self) -> f64 {
        self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;

    fn frame() -> VelloContext {
        let mut ctx = VelloContext::new(&RenderConfig::default());
        ctx.begin_frame(Bounds::new(0, 0, 100, 100), 1.0).unwrap();
        ctx
    }

    #[test]
    fn frame_produces_a_scene() {
        let mut ctx = frame();
        ctx.set_fill(Fill::from(Color::new(0xffff0000)));
        ctx.fill_rect(Rectangle::new(10.0, 10.0, 50.0, 50.0));
        assert!(ctx.in_frame());
        assert!(ctx.end_frame().is_ok());
        assert!(!ctx.in_frame());
        assert!(matches!(ctx.end_frame(), Err(RenderError::NotInFrame)));
    }

    #[test]
    fn clip_layers_balance_across_save_restore() {
        let mut ctx = frame();
        assert_eq!(ctx.open_layers(), 1); // initial frame clip

        ctx.save();
        ctx.clip(Bounds::new(10, 10, 20, 20));
        ctx.clip(Bounds::new(12, 12, 5, 5));
        assert_eq!(ctx.open_layers(), 3);

        ctx.restore();
        assert_eq!(ctx.open_layers(), 1);

        ctx.end_frame().unwrap();
        assert_eq!(ctx.open_layers(), 0);
    }

    #[test]
    fn last_clip_tracks_translate_and_replacement() {
        let mut ctx = frame();
        assert_eq!(ctx.last_clip(), Bounds::new(0, 0, 100, 100));

        ctx.translate(10.0, 5.0);
        assert_eq!(ctx.last_clip(), Bounds::new(-10, -5, 100, 100));

        ctx.clip(Bounds::new(1, 2, 3, 4));
        assert_eq!(ctx.last_clip(), Bounds::new(1, 2, 3, 4));
    }

    #[test]
    fn state_resets_on_begin_frame() {
        let mut ctx = frame();
        ctx.set_fill(Fill::from(Color::new(0xff00ff00)));
        ctx.set_line_width(9.0);
        ctx.end_frame().unwrap();

        ctx.begin_frame(Bounds::new(0, 0, 10, 10), 2.0).unwrap();
        assert_eq!(ctx.device_scale(), 2.0);
        assert_eq!(ctx.font(), Font::default());
        assert_eq!(ctx.last_clip(), Bounds::new(0, 0, 10, 10));
    }

    #[test]
    fn ops_outside_frame_are_noops() {
        let mut ctx = VelloContext::new(&RenderConfig::default());
        ctx.fill_rect(Rectangle::new(0.0, 0.0, 10.0, 10.0));
        ctx.clip(Bounds::new(0, 0, 5, 5));
        ctx.save();
        ctx.restore();
        assert!(!ctx.show_text("x"));
        assert_eq!(ctx.device_scale(), 1.0);
        assert_eq!(ctx.last_clip(), Bounds::default());
    }

    #[test]
    fn empty_text_is_zero_width_success() {
        let mut ctx = frame();
        assert!(ctx.show_text(""));
        assert_eq!(ctx.text_metrics("").width, 0.0);
    }

    #[test]
    fn rgba_conversion_swizzles_argb_words() {
        // One pixel, packed word 0x80112233 stored little-endian.
        let img = Image::new(vec![0x33, 0x22, 0x11, 0x80], 1, 1, PixelFormat::Argb32);
        assert_eq!(to_rgba8(&img), vec![0x11, 0x22, 0x33, 0x80]);

        let opaque = Image::new(vec![0x33, 0x22, 0x11, 0x00], 1, 1, PixelFormat::Rgb24);
        assert_eq!(to_rgba8(&opaque), vec![0x11, 0x22, 0x33, 0xff]);
    }

    #[test]
    fn invalid_image_is_ignored() {
        let mut ctx = frame();
        let bad = Image::new(vec![0u8; 2], 8, 8, PixelFormat::Argb32);
        ctx.draw_image(&bad, Transform::default());
        // No panic and the frame still closes cleanly.
        assert!(ctx.end_frame().is_ok());
    }
}
