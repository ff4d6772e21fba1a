//! Binding between a native window surface and a drawing context.
//!
//! The windowing layer (external to this crate) owns the event pump and
//! calls these hooks: [`View::created`] when the native surface is
//! allocated, [`View::expose`] on every repaint, [`View::destroyed`] at
//! teardown. A view owns exactly one backend context for its lifetime and
//! brackets every expose with `begin_frame`/`end_frame`, so no drawing
//! state survives from one repaint to the next.
//!
//! Device scale is re-read on every expose rather than cached at creation:
//! a window dragged to a monitor with different DPI changes scale
//! mid-session.

use crate::geometry::Bounds;
use crate::render::graphics::Graphics;

/// Paint callback invoked once per frame with a live drawing surface.
///
/// Stands in for the widget tree's `paint` entry point, which lives in the
/// external view/main subsystem.
pub type RenderFn = Box<dyn FnMut(&mut Graphics<'_>)>;

/// One native window surface bound to one drawing context.
pub trait View {
    /// Native surface exists; allocate the context.
    fn created(&mut self);

    /// Native surface is gone; drop the context.
    fn destroyed(&mut self);

    /// Repaint `frame`. Drives `begin_frame`, the render callback, and
    /// `end_frame`; a failed `begin_frame` skips the frame entirely rather
    /// than rendering against a stale target.
    fn expose(&mut self, frame: Bounds);

    /// Current device-pixel scale of the hosting surface.
    fn scale_factor(&self) -> f64 {
        1.0
    }
}
