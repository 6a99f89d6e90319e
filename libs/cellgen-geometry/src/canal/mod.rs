//! # Canal Surfaces
//!
//! A canal surface is the envelope of spheres centred on a spine curve with
//! a varying radius. Here the spine is a Bézier curve over `[0, 1]` and the
//! radius is linear in the curve parameter:
//!
//! ```text
//! γ(t) : Bézier spine,  r(t) = (1 - t)·r0 + t·r1
//! ```
//!
//! The solid bounded by the surface (including the spherical end caps) is
//! the union of the balls `B(γ(t), r(t))`, which is what [`CanalSurface::contains`]
//! tests.

use config::constants::{MAGNIFICATION_FACTOR, MAGNIFICATION_MARGIN};

use crate::bbox::BoundingBox;
use crate::bernstein::Bernstein1;
use crate::bezier::BezierCurve;
use crate::error::GeometryError;
use crate::vec3::Vec3;

/// Subdivision depth of the point containment test.
const CONTAINMENT_DEPTH: u32 = 24;

/// Tube along a Bézier spine with linearly interpolated radius.
///
/// # Examples
/// ```
/// use cellgen_geometry::{CanalSurface, Vec3};
/// let s = CanalSurface::linear(Vec3::ZERO, Vec3::X * 4.0, 1.0, 1.0).unwrap();
/// let m = s.magnified();
/// assert!(m.radius(0.0) > s.radius(0.0));
/// assert!(s.bounding_box().contains(Vec3::new(-1.0, 1.0, 1.0)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CanalSurface {
    spine: BezierCurve,
    r0: f64,
    r1: f64,
}

fn check_radius(r: f64) -> Result<f64, GeometryError> {
    if r > 0.0 && r.is_finite() {
        Ok(r)
    } else {
        Err(GeometryError::InvalidRadius(r))
    }
}

impl CanalSurface {
    /// Creates a canal surface from a spine and end radii.
    ///
    /// A spine whose control points all coincide is rejected.
    pub fn new(spine: BezierCurve, r0: f64, r1: f64) -> Result<Self, GeometryError> {
        let length: f64 = spine.controls().windows(2).map(|w| w[0].distance(w[1])).sum();
        if length == 0.0 {
            return Err(GeometryError::DegenerateSpine { length });
        }
        Ok(Self {
            spine,
            r0: check_radius(r0)?,
            r1: check_radius(r1)?,
        })
    }

    /// Canal surface with a straight spine.
    pub fn linear(a: Vec3, b: Vec3, r0: f64, r1: f64) -> Result<Self, GeometryError> {
        Self::new(BezierCurve::line(a, b), r0, r1)
    }

    /// Canal surface with a cubic spine given by its four control points.
    pub fn cubic(controls: [Vec3; 4], r0: f64, r1: f64) -> Result<Self, GeometryError> {
        Self::new(BezierCurve::new(controls.to_vec())?, r0, r1)
    }

    /// Spine curve.
    pub fn spine(&self) -> &BezierCurve {
        &self.spine
    }

    /// Radii at `t = 0` and `t = 1`.
    pub fn end_radii(&self) -> (f64, f64) {
        (self.r0, self.r1)
    }

    /// Spine point at `t`.
    #[inline]
    pub fn point(&self, t: f64) -> Vec3 {
        self.spine.eval(t)
    }

    /// Unit tangent at `t`, falling back to the chord direction.
    pub fn tangent(&self, t: f64) -> Vec3 {
        self.spine
            .derivative()
            .eval(t)
            .try_normalize()
            .or_else(|| (self.spine.end() - self.spine.start()).try_normalize())
            .unwrap_or(Vec3::Z)
    }

    /// Radius at `t`.
    #[inline]
    pub fn radius(&self, t: f64) -> f64 {
        self.r0 + (self.r1 - self.r0) * t
    }

    /// Largest radius.
    pub fn max_radius(&self) -> f64 {
        self.r0.max(self.r1)
    }

    /// Smallest radius.
    pub fn min_radius(&self) -> f64 {
        self.r0.min(self.r1)
    }

    /// Radius as a degree one Bernstein polynomial.
    pub fn radius_poly(&self) -> Bernstein1 {
        Bernstein1::linear(self.r0, self.r1)
    }

    /// Copy with every radius multiplied by `factor`.
    pub fn scaled(&self, factor: f64) -> Result<Self, GeometryError> {
        Self::new(self.spine.clone(), self.r0 * factor, self.r1 * factor)
    }

    /// Conservative hull used for broad-phase and flushing decisions.
    pub fn magnified(&self) -> Self {
        let grow = |r: f64| r * MAGNIFICATION_FACTOR + MAGNIFICATION_MARGIN;
        Self {
            spine: self.spine.clone(),
            r0: grow(self.r0),
            r1: grow(self.r1),
        }
    }

    /// Box around the control polygon grown by the maximum radius.
    pub fn bounding_box(&self) -> BoundingBox {
        self.spine.control_bbox().inflated(self.max_radius())
    }

    /// Approximate arc length of the spine.
    ///
    /// Average of chord and control polygon length, exact for straight spines.
    pub fn arc_length(&self) -> f64 {
        0.5 * (self.spine.chord_length() + self.spine.control_polygon_length())
    }

    /// `|γ(t) - p|² - (factor · r(t))²` in Bernstein form.
    pub fn clearance_poly(&self, p: Vec3, factor: f64) -> Bernstein1 {
        let mut acc = Bernstein1::constant(0.0);
        for axis in 0..3 {
            let d = &self.spine.component(axis) - &Bernstein1::constant(p[axis]);
            acc = &acc + &(&d * &d);
        }
        let r = self.radius_poly().scale(factor);
        &acc - &(&r * &r)
    }

    /// Returns true if `p` lies strictly inside the tube scaled by `factor`.
    ///
    /// # Examples
    /// ```
    /// use cellgen_geometry::{CanalSurface, Vec3};
    /// let s = CanalSurface::linear(Vec3::ZERO, Vec3::X * 4.0, 1.0, 1.0).unwrap();
    /// assert!(s.contains(Vec3::new(2.0, 0.9, 0.0), 1.0));
    /// assert!(!s.contains(Vec3::new(2.0, 0.9, 0.0), 0.5));
    /// assert!(s.contains(Vec3::new(-0.5, 0.0, 0.0), 1.0)); // end cap
    /// ```
    pub fn contains(&self, p: Vec3, factor: f64) -> bool {
        let reach = self.max_radius() * factor;
        if !self.spine.control_bbox().inflated(reach).contains(p) {
            return false;
        }
        let mut stack = vec![(self.clearance_poly(p, factor), 0_u32)];
        while let Some((g, depth)) = stack.pop() {
            if g.min_coeff() >= 0.0 {
                continue;
            }
            let c = g.coeffs();
            if c[0] < 0.0 || c[c.len() - 1] < 0.0 || g.eval(0.5) < 0.0 {
                return true;
            }
            if depth < CONTAINMENT_DEPTH {
                let (left, right) = g.subdivide(0.5);
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
        }
        false
    }
}
