use crate::render::surface::SurfaceSize;

/// Defaults consumed by backends and views.
///
/// Each backend resolves a [`Font`](crate::font::Font) without an explicit
/// family against `default_font_family`, the way the original per-platform
/// backends pin a default face.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Family used when a font does not name one.
    pub default_font_family: String,
    /// Height assumed for text before the first `set_font` call.
    pub default_font_height: f64,
    /// Initial size for headless view surfaces.
    pub surface_size: SurfaceSize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            default_font_family: "Sans".to_string(),
            default_font_height: 15.0,
            surface_size: SurfaceSize {
                width: 800,
                height: 600,
            },
        }
    }
}
