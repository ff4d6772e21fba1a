use bitflags::bitflags;

bitflags! {
    /// Style flags applied on top of a font family.
    #[derive(Default)]
    pub struct FontStyle: u32 {
        const BOLD      = 1 << 0;
        const ITALIC    = 1 << 1;
        const UNDERLINE = 1 << 2;
    }
}

/// An immutable font description.
///
/// `family` of `None` means "whatever the backend's configured default
/// family is"; backends resolve it against [`crate::config::RenderConfig`].
#[derive(Clone, Debug, PartialEq)]
pub struct Font {
    family: Option<String>,
    height: f64,
    style: FontStyle,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            family: None,
            height: 15.0,
            style: FontStyle::empty(),
        }
    }
}

impl Font {
    pub fn new(height: f64) -> Self {
        Self {
            height,
            ..Default::default()
        }
    }

    pub fn family(&self) -> Option<&str> {
        self.family.as_deref()
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    pub fn style(&self) -> FontStyle {
        self.style
    }

    pub fn bold(&self) -> bool {
        self.style.contains(FontStyle::BOLD)
    }

    pub fn italic(&self) -> bool {
        self.style.contains(FontStyle::ITALIC)
    }

    pub fn with_family(mut self, family: impl Into<String>) -> Self {
        self.family = Some(family.into());
        self
    }

    pub fn with_height(mut self, height: f64) -> Self {
        self.height = height;
        self
    }

    pub fn with_style(mut self, style: FontStyle) -> Self {
        self.style = style;
        self
    }
}

/// Per-font vertical and advance metrics, queried from the backend's text
/// system for the currently active font.
///
/// Backends differ in how they approximate the max advances (some native
/// APIs only report an average character width); callers should treat them
/// as sizing hints, not exact values.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FontMetrics {
    pub ascent: f64,
    pub descent: f64,
    pub height: f64,
    pub max_x_advance: f64,
    pub max_y_advance: f64,
}

/// Measured extents of one run of text in the active font.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct TextMetrics {
    pub width: f64,
    pub height: f64,
    pub x_bearing: f64,
    pub y_bearing: f64,
    pub x_advance: f64,
    pub y_advance: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_font() {
        let f = Font::default();
        assert_eq!(f.height(), 15.0);
        assert_eq!(f.style(), FontStyle::empty());
        assert!(f.family().is_none());
        assert!(!f.bold());
    }

    #[test]
    fn builders_do_not_mutate_source() {
        let base = Font::new(12.0);
        let bold = base.clone().with_style(FontStyle::BOLD);
        assert!(bold.bold());
        assert!(!base.bold());
        assert_eq!(bold.height(), 12.0);
    }

    #[test]
    fn style_flags_combine() {
        let style = FontStyle::BOLD | FontStyle::ITALIC;
        let f = Font::new(10.0).with_style(style);
        assert!(f.bold());
        assert!(f.italic());
        assert!(!f.style().contains(FontStyle::UNDERLINE));
    }

    #[test]
    fn family_override() {
        let f = Font::new(14.0).with_family("Mono");
        assert_eq!(f.family(), Some("Mono"));
    }
}
