use crate::geometry::Bounds;

/// Size of a surface in pixels. It's a simple struct to hold width and height.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Bounds at the origin covering the whole surface.
    pub fn bounds(self) -> Bounds {
        Bounds::new(0, 0, self.width as i32, self.height as i32)
    }
}

impl From<Bounds> for SurfaceSize {
    fn from(b: Bounds) -> Self {
        Self {
            width: b.width.max(0) as u32,
            height: b.height.max(0) as u32,
        }
    }
}

/// Pixel layout of a [`RgbaImage`] snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnapshotFormat {
    /// Premultiplied ARGB words, the native cairo image layout.
    PremulArgb32,
    /// Byte-order RGBA, 8 bits per channel.
    Rgba8,
}

/// Small owned pixel snapshot of a rendered surface, suitable for
/// thumbnails, golden-image tests, or writing to disk from demos.
#[derive(Clone)]
pub struct RgbaImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub stride: u32,
    pub format: SnapshotFormat,
}

impl RgbaImage {
    pub fn from_raw(
        pixels: Vec<u8>,
        width: u32,
        height: u32,
        stride: u32,
        format: SnapshotFormat,
    ) -> Self {
        assert!(
            pixels.len() >= (height as usize) * (stride as usize),
            "pixel buffer too small for image dimensions"
        );

        Self {
            pixels,
            width,
            height,
            stride,
            format,
        }
    }
}

impl std::fmt::Debug for RgbaImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RgbaImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("len", &self.pixels.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn surface_size_from_bounds_clamps_negative() {
        let s = SurfaceSize::from(Bounds::new(10, 10, -5, 20));
        assert_eq!(s.width, 0);
        assert_eq!(s.height, 20);
    }

    #[test]
    fn bounds_cover_surface() {
        let s = SurfaceSize::new(640, 360);
        assert_eq!(s.bounds(), Bounds::new(0, 0, 640, 360));
    }
}
