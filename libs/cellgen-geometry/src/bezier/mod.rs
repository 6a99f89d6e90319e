//! # Bézier Curves
//!
//! Space curves in Bernstein form over `[0, 1]`, evaluated with de Casteljau.
//! Each coordinate of a Bézier curve is a [`Bernstein1`] polynomial whose
//! coefficients are the control point coordinates, which is what the
//! contact predicates build on.

use crate::bbox::BoundingBox;
use crate::bernstein::Bernstein1;
use crate::error::GeometryError;
use crate::vec3::Vec3;

/// Bézier curve of arbitrary degree.
///
/// # Examples
/// ```
/// use cellgen_geometry::{BezierCurve, Vec3};
/// let c = BezierCurve::new(vec![Vec3::ZERO, Vec3::new(1.0, 1.0, 0.0), Vec3::new(2.0, 0.0, 0.0)]).unwrap();
/// assert_eq!(c.degree(), 2);
/// assert_eq!(c.eval(0.5), Vec3::new(1.0, 0.5, 0.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BezierCurve {
    controls: Vec<Vec3>,
}

impl BezierCurve {
    /// Creates a curve from at least one control point.
    pub fn new(controls: Vec<Vec3>) -> Result<Self, GeometryError> {
        if controls.is_empty() {
            return Err(GeometryError::invalid_control_polygon("no control points"));
        }
        if controls.iter().any(|p| !p.is_finite()) {
            return Err(GeometryError::invalid_control_polygon("non-finite control point"));
        }
        Ok(Self { controls })
    }

    /// Straight line from `a` to `b`.
    pub fn line(a: Vec3, b: Vec3) -> Self {
        Self { controls: vec![a, b] }
    }

    /// Polynomial degree.
    #[inline]
    pub fn degree(&self) -> usize {
        self.controls.len() - 1
    }

    /// Control polygon.
    #[inline]
    pub fn controls(&self) -> &[Vec3] {
        &self.controls
    }

    /// Start point.
    pub fn start(&self) -> Vec3 {
        self.controls[0]
    }

    /// End point.
    pub fn end(&self) -> Vec3 {
        self.controls[self.controls.len() - 1]
    }

    /// Evaluates the curve with de Casteljau's algorithm.
    pub fn eval(&self, t: f64) -> Vec3 {
        let mut pts = self.controls.clone();
        let n = pts.len();
        for level in 1..n {
            for i in 0..n - level {
                pts[i] = pts[i].lerp(pts[i + 1], t);
            }
        }
        pts[0]
    }

    /// Hodograph (first derivative curve), of degree `n - 1`.
    ///
    /// The derivative of a constant curve is the zero curve of degree zero.
    pub fn derivative(&self) -> BezierCurve {
        let n = self.degree();
        if n == 0 {
            return Self { controls: vec![Vec3::ZERO] };
        }
        let scale = n as f64;
        let controls = self
            .controls
            .windows(2)
            .map(|w| (w[1] - w[0]) * scale)
            .collect();
        Self { controls }
    }

    /// Splits the curve at `t` into the halves over `[0, t]` and `[t, 1]`.
    pub fn subdivide(&self, t: f64) -> (BezierCurve, BezierCurve) {
        let n = self.controls.len();
        let mut pts = self.controls.clone();
        let mut left = Vec::with_capacity(n);
        let mut right = Vec::with_capacity(n);
        left.push(pts[0]);
        right.push(pts[n - 1]);
        for level in 1..n {
            for i in 0..n - level {
                pts[i] = pts[i].lerp(pts[i + 1], t);
            }
            left.push(pts[0]);
            right.push(pts[n - 1 - level]);
        }
        right.reverse();
        (Self { controls: left }, Self { controls: right })
    }

    /// Box around the control polygon, which contains the curve.
    pub fn control_bbox(&self) -> BoundingBox {
        BoundingBox::from_points(self.controls.iter().copied())
    }

    /// Length of the control polygon, an upper bound of the arc length.
    pub fn control_polygon_length(&self) -> f64 {
        self.controls.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// Chord length `|end - start|`.
    pub fn chord_length(&self) -> f64 {
        self.start().distance(self.end())
    }

    /// Coordinate `axis` (0, 1 or 2) as a Bernstein polynomial.
    pub fn component(&self, axis: usize) -> Bernstein1 {
        Bernstein1::new(self.controls.iter().map(|p| p[axis]).collect())
    }

    /// All three coordinates as Bernstein polynomials.
    pub fn components(&self) -> [Bernstein1; 3] {
        [self.component(0), self.component(1), self.component(2)]
    }
}
