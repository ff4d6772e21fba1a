//! Recorded vector paths.
//!
//! A [`Path`] is an ordered stream of drawing operations, recorded in local
//! coordinates and replayed later against a drawing context by
//! [`Graphics::fill_path`](crate::render::graphics::Graphics::fill_path) or
//! [`stroke_path`](crate::render::graphics::Graphics::stroke_path). Curve
//! segments that arrive before any `move_to` implicitly start a figure at
//! the origin, so a recorded path is never malformed from a backend's point
//! of view.

use crate::geometry::Point;

/// One recorded path operation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathOp {
    MoveTo(Point<f64>),
    LineTo(Point<f64>),
    /// Quadratic Bézier: control point, end point.
    QuadTo(Point<f64>, Point<f64>),
    /// Cubic Bézier: two control points, end point.
    CubicTo(Point<f64>, Point<f64>, Point<f64>),
    Close,
}

/// An ordered sequence of path operations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    ops: Vec<PathOp>,
    has_move: bool,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ops(&self) -> &[PathOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PathOp> {
        self.ops.iter()
    }

    /// Discard all recorded operations so the path can be reused.
    pub fn clear(&mut self) {
        self.ops.clear();
        self.has_move = false;
    }

    pub fn move_to(&mut self, x: f64, y: f64) {
        self.ops.push(PathOp::MoveTo(Point::new(x, y)));
        self.has_move = true;
    }

    pub fn line_to(&mut self, x: f64, y: f64) {
        self.ensure_figure();
        self.ops.push(PathOp::LineTo(Point::new(x, y)));
    }

    pub fn quad_to(&mut self, cx: f64, cy: f64, x: f64, y: f64) {
        self.ensure_figure();
        self.ops
            .push(PathOp::QuadTo(Point::new(cx, cy), Point::new(x, y)));
    }

    pub fn cubic_to(&mut self, c1x: f64, c1y: f64, c2x: f64, c2y: f64, x: f64, y: f64) {
        self.ensure_figure();
        self.ops.push(PathOp::CubicTo(
            Point::new(c1x, c1y),
            Point::new(c2x, c2y),
            Point::new(x, y),
        ));
    }

    pub fn close_path(&mut self) {
        self.ensure_figure();
        self.ops.push(PathOp::Close);
    }

    /// Append an axis-aligned rectangle as a closed figure.
    pub fn add_rectangle(&mut self, x: f64, y: f64, width: f64, height: f64) {
        self.move_to(x, y);
        self.line_to(x + width, y);
        self.line_to(x + width, y + height);
        self.line_to(x, y + height);
        self.close_path();
    }

    /// Append an ellipse inscribed in the given rectangle, built from four
    /// cubic arcs.
    pub fn add_ellipse(&mut self, x: f64, y: f64, width: f64, height: f64) {
        // Control-point offset for a cubic approximation of a quarter arc.
        const KAPPA: f64 = 0.552_284_749_830_793_4;

        let rx = width / 2.0;
        let ry = height / 2.0;
        let cx = x + rx;
        let cy = y + ry;
        let ox = rx * KAPPA;
        let oy = ry * KAPPA;

        self.move_to(cx + rx, cy);
        self.cubic_to(cx + rx, cy + oy, cx + ox, cy + ry, cx, cy + ry);
        self.cubic_to(cx - ox, cy + ry, cx - rx, cy + oy, cx - rx, cy);
        self.cubic_to(cx - rx, cy - oy, cx - ox, cy - ry, cx, cy - ry);
        self.cubic_to(cx + ox, cy - ry, cx + rx, cy - oy, cx + rx, cy);
        self.close_path();
    }

    fn ensure_figure(&mut self) {
        if !self.has_move {
            self.move_to(0.0, 0.0);
        }
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a PathOp;
    type IntoIter = std::slice::Iter<'a, PathOp>;

    fn into_iter(self) -> Self::IntoIter {
        self.ops.iter()
    }
}

/// Degree-elevate a quadratic Bézier to a cubic with identical shape.
///
/// `p0` is the current point, `c` the quadratic control point, `p1` the end
/// point. Returns the two cubic control points; the endpoints are unchanged.
/// Used by backends whose native path type has no quadratic primitive.
pub fn quad_to_cubic(
    p0: Point<f64>,
    c: Point<f64>,
    p1: Point<f64>,
) -> (Point<f64>, Point<f64>) {
    let c1 = Point::new(
        p0.x + 2.0 / 3.0 * (c.x - p0.x),
        p0.y + 2.0 / 3.0 * (c.y - p0.y),
    );
    let c2 = Point::new(
        p1.x + 2.0 / 3.0 * (c.x - p1.x),
        p1.y + 2.0 / 3.0 * (c.y - p1.y),
    );
    (c1, c2)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad_at(t: f64, p0: Point<f64>, c: Point<f64>, p1: Point<f64>) -> Point<f64> {
        let u = 1.0 - t;
        Point::new(
            u * u * p0.x + 2.0 * u * t * c.x + t * t * p1.x,
            u * u * p0.y + 2.0 * u * t * c.y + t * t * p1.y,
        )
    }

    fn cubic_at(t: f64, p0: Point<f64>, c1: Point<f64>, c2: Point<f64>, p1: Point<f64>) -> Point<f64> {
        let u = 1.0 - t;
        Point::new(
            u * u * u * p0.x + 3.0 * u * u * t * c1.x + 3.0 * u * t * t * c2.x + t * t * t * p1.x,
            u * u * u * p0.y + 3.0 * u * u * t * c1.y + 3.0 * u * t * t * c2.y + t * t * t * p1.y,
        )
    }

    #[test]
    fn default_path_is_empty() {
        let p = Path::new();
        assert!(p.is_empty());
        assert!(p.ops().is_empty());
    }

    #[test]
    fn move_then_line() {
        let mut p = Path::new();
        p.move_to(10.0, 20.0);
        p.line_to(30.0, 40.0);

        assert_eq!(
            p.ops(),
            &[
                PathOp::MoveTo(Point::new(10.0, 20.0)),
                PathOp::LineTo(Point::new(30.0, 40.0)),
            ]
        );
    }

    #[test]
    fn line_on_empty_path_synthesizes_move_to_origin() {
        let mut p = Path::new();
        p.line_to(30.0, 40.0);

        assert_eq!(p.ops()[0], PathOp::MoveTo(Point::new(0.0, 0.0)));
        assert_eq!(p.ops()[1], PathOp::LineTo(Point::new(30.0, 40.0)));
    }

    #[test]
    fn curves_on_empty_path_synthesize_move() {
        let mut p = Path::new();
        p.quad_to(1.0, 2.0, 3.0, 4.0);
        assert_eq!(p.ops()[0], PathOp::MoveTo(Point::new(0.0, 0.0)));

        let mut q = Path::new();
        q.close_path();
        assert_eq!(q.ops()[0], PathOp::MoveTo(Point::new(0.0, 0.0)));
        assert_eq!(q.ops()[1], PathOp::Close);
    }

    #[test]
    fn quad_and_cubic_record_all_points() {
        let mut p = Path::new();
        p.move_to(10.0, 20.0);
        p.quad_to(30.0, 40.0, 50.0, 60.0);
        p.cubic_to(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);

        assert_eq!(
            p.ops()[1],
            PathOp::QuadTo(Point::new(30.0, 40.0), Point::new(50.0, 60.0))
        );
        assert_eq!(
            p.ops()[2],
            PathOp::CubicTo(Point::new(1.0, 2.0), Point::new(3.0, 4.0), Point::new(5.0, 6.0))
        );
    }

    #[test]
    fn clear_resets_implicit_move_tracking() {
        let mut p = Path::new();
        p.move_to(5.0, 5.0);
        p.clear();
        assert!(p.is_empty());

        p.line_to(1.0, 1.0);
        assert_eq!(p.ops()[0], PathOp::MoveTo(Point::new(0.0, 0.0)));
    }

    #[test]
    fn rectangle_is_closed_figure() {
        let mut p = Path::new();
        p.add_rectangle(0.0, 0.0, 10.0, 5.0);
        assert_eq!(p.ops().len(), 5);
        assert_eq!(p.ops()[4], PathOp::Close);
    }

    #[test]
    fn ellipse_is_four_arcs() {
        let mut p = Path::new();
        p.add_ellipse(0.0, 0.0, 100.0, 100.0);
        let cubics = p
            .iter()
            .filter(|op| matches!(op, PathOp::CubicTo(..)))
            .count();
        assert_eq!(cubics, 4);
        assert_eq!(p.ops()[0], PathOp::MoveTo(Point::new(100.0, 50.0)));
    }

    #[test]
    fn degree_elevation_preserves_endpoints_and_tangents() {
        let p0 = Point::new(0.0, 0.0);
        let c = Point::new(50.0, 100.0);
        let p1 = Point::new(100.0, 0.0);
        let (c1, c2) = quad_to_cubic(p0, c, p1);

        // Elevated control points for this triple.
        assert!((c1.x - 100.0 / 3.0).abs() < 1e-9);
        assert!((c1.y - 200.0 / 3.0).abs() < 1e-9);
        assert!((c2.x - 200.0 / 3.0).abs() < 1e-9);
        assert!((c2.y - 200.0 / 3.0).abs() < 1e-9);

        // Control-polygon midpoint sits at (50, 66.67).
        assert!(((c1.x + c2.x) / 2.0 - 50.0).abs() < 1e-2);
        assert!(((c1.y + c2.y) / 2.0 - 66.67).abs() < 1e-2);

        // Start tangent direction matches the quadratic's.
        let quad_tangent = (c.x - p0.x, c.y - p0.y);
        let cubic_tangent = (c1.x - p0.x, c1.y - p0.y);
        let cross = quad_tangent.0 * cubic_tangent.1 - quad_tangent.1 * cubic_tangent.0;
        assert!(cross.abs() < 1e-9);
    }

    #[test]
    fn degree_elevation_matches_quadratic_along_curve() {
        let p0 = Point::new(0.0, 0.0);
        let c = Point::new(50.0, 100.0);
        let p1 = Point::new(100.0, 0.0);
        let (c1, c2) = quad_to_cubic(p0, c, p1);

        for i in 0..=10 {
            let t = i as f64 / 10.0;
            let q = quad_at(t, p0, c, p1);
            let b = cubic_at(t, p0, c1, c2, p1);
            assert!((q.x - b.x).abs() < 1e-9, "x mismatch at t={t}");
            assert!((q.y - b.y).abs() < 1e-9, "y mismatch at t={t}");
        }
    }
}
