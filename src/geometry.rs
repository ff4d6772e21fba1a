use std::fmt::Debug;
use std::ops::Mul;

/// A point in 2D space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point<T> {
    pub x: T,
    pub y: T,
}

impl<T> Point<T> {
    pub fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl Point<i32> {
    pub fn to_f64(self) -> Point<f64> {
        Point::new(self.x as f64, self.y as f64)
    }
}

/// Axis-aligned rectangle with a top-left origin.
#[derive(Clone, Copy, Default, PartialEq)]
pub struct Rectangle<T> {
    pub x: T,
    pub y: T,
    pub width: T,
    pub height: T,
}

impl<T: Debug> Debug for Rectangle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Rectangle {{ x: {:?}, y: {:?}, width: {:?}, height: {:?} }}",
            self.x, self.y, self.width, self.height
        )
    }
}

impl<T> Rectangle<T> {
    pub fn new(x: T, y: T, width: T, height: T) -> Self {
        Self { x, y, width, height }
    }
}

impl<T: Copy + std::ops::Add<Output = T>> Rectangle<T> {
    /// Same size, origin shifted by `(dx, dy)`.
    pub fn shifted(self, dx: T, dy: T) -> Self {
        Self::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}

impl Rectangle<i32> {
    pub fn to_f64(self) -> Rectangle<f64> {
        Rectangle::new(
            self.x as f64,
            self.y as f64,
            self.width as f64,
            self.height as f64,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

impl Rectangle<f64> {
    pub fn to_i32(self) -> Rectangle<i32> {
        Rectangle::new(
            self.x as i32,
            self.y as i32,
            self.width as i32,
            self.height as i32,
        )
    }
}

impl From<Rectangle<i32>> for Rectangle<f64> {
    fn from(r: Rectangle<i32>) -> Self {
        r.to_f64()
    }
}

/// Integer bounds of a view or clip region.
pub type Bounds = Rectangle<i32>;

/// A 2x3 affine transformation matrix.
///
/// Maps `(x, y)` to `(m00*x + m01*y + m02, m10*x + m11*y + m12)`. The
/// default value is the identity transform. All combinators return a new
/// matrix; nothing mutates in place.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub m00: f64,
    pub m01: f64,
    pub m02: f64,
    pub m10: f64,
    pub m11: f64,
    pub m12: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Transform {
    pub const IDENTITY: Transform = Transform {
        m00: 1.0,
        m01: 0.0,
        m02: 0.0,
        m10: 0.0,
        m11: 1.0,
        m12: 0.0,
    };

    pub fn new(m00: f64, m01: f64, m02: f64, m10: f64, m11: f64, m12: f64) -> Self {
        Self { m00, m01, m02, m10, m11, m12 }
    }

    /// A pure translation matrix.
    pub fn translation(dx: f64, dy: f64) -> Self {
        Self::new(1.0, 0.0, dx, 0.0, 1.0, dy)
    }

    /// A counterclockwise rotation about the origin, in radians.
    pub fn rotation(angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self::new(cos, -sin, 0.0, sin, cos, 0.0)
    }

    /// This transform followed by a translation of the result.
    ///
    /// `t.translated(dx, dy)` is not the same as `t.scaled(..)` applied the
    /// other way around: translate-then-scale scales the offset, while
    /// scale-then-translate leaves it untouched.
    pub fn translated(self, dx: f64, dy: f64) -> Self {
        Self::new(self.m00, self.m01, self.m02 + dx, self.m10, self.m11, self.m12 + dy)
    }

    /// This transform followed by a uniform scale of the result.
    pub fn scaled_uniform(self, factor: f64) -> Self {
        self.scaled(factor, factor)
    }

    /// This transform followed by a scale of the result.
    pub fn scaled(self, sx: f64, sy: f64) -> Self {
        Self::new(
            self.m00 * sx,
            self.m01 * sx,
            self.m02 * sx,
            self.m10 * sy,
            self.m11 * sy,
            self.m12 * sy,
        )
    }

    /// Apply the transform to a point.
    pub fn map(&self, p: Point<f64>) -> Point<f64> {
        Point::new(
            self.m00 * p.x + self.m01 * p.y + self.m02,
            self.m10 * p.x + self.m11 * p.y + self.m12,
        )
    }

    /// Matrix product `self * rhs`: `rhs` is applied first, then `self`.
    pub fn composed(self, rhs: Transform) -> Self {
        Self::new(
            self.m00 * rhs.m00 + self.m01 * rhs.m10,
            self.m00 * rhs.m01 + self.m01 * rhs.m11,
            self.m00 * rhs.m02 + self.m01 * rhs.m12 + self.m02,
            self.m10 * rhs.m00 + self.m11 * rhs.m10,
            self.m10 * rhs.m01 + self.m11 * rhs.m11,
            self.m10 * rhs.m02 + self.m11 * rhs.m12 + self.m12,
        )
    }
}

impl Mul for Transform {
    type Output = Transform;

    fn mul(self, rhs: Transform) -> Transform {
        self.composed(rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn default_transform_is_identity() {
        let t = Transform::default();
        assert_eq!(t, Transform::IDENTITY);
        assert_eq!(t.map(Point::new(3.0, -2.0)), Point::new(3.0, -2.0));
    }

    #[test]
    fn translation_applies_to_point() {
        let t = Transform::translation(10.0, 20.0);
        let p = t.map(Point::new(5.0, 7.0));
        assert_eq!(p, Point::new(15.0, 27.0));
    }

    #[test]
    fn translated_adds_to_offsets_only() {
        let t1 = Transform::new(2.0, 0.0, 5.0, 0.0, 2.0, 10.0);
        let t2 = t1.translated(3.0, 4.0);

        assert_eq!(t2.m00, 2.0);
        assert_eq!(t2.m02, 8.0);
        assert_eq!(t2.m11, 2.0);
        assert_eq!(t2.m12, 14.0);

        // original unchanged
        assert_eq!(t1.m02, 5.0);
        assert_eq!(t1.m12, 10.0);
    }

    #[test]
    fn rotation_quarter_turn() {
        let t = Transform::rotation(PI / 2.0);

        assert!(t.m00.abs() < 1e-4);
        assert!((t.m01 + 1.0).abs() < 1e-4);
        assert!((t.m10 - 1.0).abs() < 1e-4);
        assert!(t.m11.abs() < 1e-4);

        let p = t.map(Point::new(1.0, 0.0));
        assert!(p.x.abs() < 1e-4);
        assert!((p.y - 1.0).abs() < 1e-4);
    }

    #[test]
    fn rotation_eighth_turn() {
        let t = Transform::rotation(PI / 4.0);
        let p = t.map(Point::new(1.0, 0.0));
        let expected = (2.0f64).sqrt() / 2.0;
        assert!((p.x - expected).abs() < 1e-4);
        assert!((p.y - expected).abs() < 1e-4);
    }

    #[test]
    fn scaled_from_identity() {
        let t = Transform::default().scaled(2.0, 3.0);
        assert_eq!(t, Transform::new(2.0, 0.0, 0.0, 0.0, 3.0, 0.0));

        let u = Transform::default().scaled_uniform(2.5);
        assert_eq!(u, Transform::new(2.5, 0.0, 0.0, 0.0, 2.5, 0.0));
    }

    #[test]
    fn scale_translate_order_matters() {
        let scale_then_translate = Transform::default().scaled(2.0, 2.0).translated(3.0, 4.0);
        let translate_then_scale = Transform::default().translated(3.0, 4.0).scaled(2.0, 2.0);

        assert_eq!(
            scale_then_translate,
            Transform::new(2.0, 0.0, 3.0, 0.0, 2.0, 4.0)
        );
        assert_eq!(
            translate_then_scale,
            Transform::new(2.0, 0.0, 6.0, 0.0, 2.0, 8.0)
        );
        assert_ne!(scale_then_translate, translate_then_scale);
    }

    #[test]
    fn composed_applies_rhs_first() {
        let scale = Transform::default().scaled(2.0, 2.0);
        let translate = Transform::translation(5.0, 0.0);

        // scale ∘ translate: point is translated, then scaled
        let p = (scale * translate).map(Point::new(1.0, 0.0));
        assert_eq!(p, Point::new(12.0, 0.0));

        // translate ∘ scale: point is scaled, then translated
        let q = (translate * scale).map(Point::new(1.0, 0.0));
        assert_eq!(q, Point::new(7.0, 0.0));
    }

    #[test]
    fn rectangle_shift_and_convert() {
        let r = Rectangle::new(10, 20, 30, 40);
        assert_eq!(r.shifted(-5, 5), Rectangle::new(5, 25, 30, 40));
        assert_eq!(r.to_f64(), Rectangle::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(r.to_f64().to_i32(), r);
        assert!(!r.is_empty());
        assert!(Rectangle::new(0, 0, 0, 10).is_empty());
    }
}
