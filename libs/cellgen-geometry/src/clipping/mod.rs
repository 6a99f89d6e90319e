//! # Bézier Clipping
//!
//! Root solvers for polynomials in Bernstein form.
//!
//! ## Algorithms
//!
//! - **Univariate Bézier clipping**: the convex hull of the control points
//!   `(i/n, c_i)` is intersected with the `t` axis; the parameter interval is
//!   clipped to that range. If a clip removes less than 20% of the interval
//!   it is split in half instead.
//! - **Bivariate linear clipping**: for a system `f = g = 0` on a rectangle
//!   the control nets of both polynomials are projected onto the `u` and `v`
//!   axes and clipped the same way, alternating subdivision along the wider
//!   side when clipping stalls.
//!
//! Both solvers report a root once the enclosing interval (rectangle) is
//! narrower than the tolerance. Subdivision depth is capped by
//! [`SOLVER_MAX_DEPTH`] and total work by [`SOLVER_MAX_STEPS`].
//!
//! ## Reference
//!
//! Sederberg, T. W., & Nishita, T. (1990). Curve intersection using Bézier
//! clipping.

use config::constants::{SOLVER_MAX_DEPTH, SOLVER_MAX_STEPS};

use crate::bernstein::{Bernstein1, Bernstein2};
use crate::error::{SolverError, SolverResult};

/// Minimum relative shrink a clip must achieve before we subdivide instead.
const MIN_CLIP_REDUCTION: f64 = 0.2;

/// Slack added to clipped intervals to absorb rounding.
const CLIP_SLACK: f64 = 1e-12;

// =============================================================================
// HULL / AXIS INTERSECTION
// =============================================================================

/// Intersection of the convex hull of `points` with the x axis.
///
/// Returns the `[lo, hi]` range, or `None` if the hull misses the axis.
fn axis_hull(points: &[(f64, f64)]) -> Option<(f64, f64)> {
    let mut lo = f64::INFINITY;
    let mut hi = f64::NEG_INFINITY;
    for (k, &(xa, ya)) in points.iter().enumerate() {
        if ya == 0.0 {
            lo = lo.min(xa);
            hi = hi.max(xa);
        }
        for &(xb, yb) in &points[k + 1..] {
            if (ya < 0.0 && yb > 0.0) || (ya > 0.0 && yb < 0.0) {
                let x = xa + (xb - xa) * ya / (ya - yb);
                lo = lo.min(x);
                hi = hi.max(x);
            }
        }
    }
    (lo <= hi).then(|| ((lo - CLIP_SLACK).max(0.0), (hi + CLIP_SLACK).min(1.0)))
}

fn straddles_zero(min: f64, max: f64) -> bool {
    min <= 0.0 && max >= 0.0
}

fn check_tolerance(eps: f64) -> SolverResult<()> {
    if eps > 0.0 && eps.is_finite() {
        Ok(())
    } else {
        Err(SolverError::InvalidTolerance(eps))
    }
}

fn dedup_sorted(values: &mut Vec<f64>, eps: f64) {
    values.sort_by(|a, b| a.total_cmp(b));
    values.dedup_by(|a, b| (*a - *b).abs() <= 2.0 * eps);
}

// =============================================================================
// UNIVARIATE
// =============================================================================

/// Finds all roots of `p` in `[0, 1]` up to `eps`.
///
/// # Errors
///
/// - [`SolverError::Degenerate`] if `p` vanishes identically
/// - [`SolverError::NonConvergent`] if the step or depth budget is exhausted
///
/// # Examples
///
/// ```
/// use cellgen_geometry::Bernstein1;
/// use cellgen_geometry::clipping::univariate_roots;
/// // (t - 0.25)(t - 0.75) = t² - t + 0.1875
/// let p = Bernstein1::from_power(&[0.1875, -1.0, 1.0]);
/// let roots = univariate_roots(&p, 1e-9).unwrap();
/// assert_eq!(roots.len(), 2);
/// assert!((roots[0] - 0.25).abs() < 1e-8);
/// assert!((roots[1] - 0.75).abs() < 1e-8);
/// ```
pub fn univariate_roots(p: &Bernstein1, eps: f64) -> SolverResult<Vec<f64>> {
    check_tolerance(eps)?;
    if p.is_zero(0.0) {
        return Err(SolverError::Degenerate);
    }

    let mut roots = Vec::new();
    let mut stack = vec![(0.0_f64, 1.0_f64, p.clone(), 0_u32)];
    let mut steps = 0_u32;

    while let Some((a, b, q, depth)) = stack.pop() {
        steps += 1;
        if steps > SOLVER_MAX_STEPS || depth > SOLVER_MAX_DEPTH {
            return Err(SolverError::NonConvergent { steps });
        }
        if !straddles_zero(q.min_coeff(), q.max_coeff()) {
            continue;
        }
        let width = b - a;
        if width <= eps {
            roots.push(0.5 * (a + b));
            continue;
        }

        let n = q.degree().max(1) as f64;
        let points: Vec<(f64, f64)> = q
            .coeffs()
            .iter()
            .enumerate()
            .map(|(i, &c)| (i as f64 / n, c))
            .collect();
        let Some((lo, hi)) = axis_hull(&points) else {
            continue;
        };

        if hi - lo > 1.0 - MIN_CLIP_REDUCTION {
            let (left, right) = q.subdivide(0.5);
            let mid = 0.5 * (a + b);
            stack.push((mid, b, right, depth + 1));
            stack.push((a, mid, left, depth + 1));
        } else {
            let clipped = q.restrict(lo, hi);
            stack.push((a + lo * width, a + hi * width, clipped, depth));
        }
    }

    dedup_sorted(&mut roots, eps);
    Ok(roots)
}

/// Global minimum of `p` on `[0, 1]` as `(t, p(t))`.
///
/// Candidates are the interval ends and the roots of the derivative.
///
/// # Examples
///
/// ```
/// use cellgen_geometry::Bernstein1;
/// use cellgen_geometry::clipping::minimize;
/// let p = Bernstein1::from_power(&[1.0, -1.0, 1.0]); // min at t = 0.5
/// let (t, v) = minimize(&p, 1e-9).unwrap();
/// assert!((t - 0.5).abs() < 1e-8);
/// assert!((v - 0.75).abs() < 1e-12);
/// ```
pub fn minimize(p: &Bernstein1, eps: f64) -> SolverResult<(f64, f64)> {
    check_tolerance(eps)?;
    let mut best = (0.0, p.eval(0.0));
    let end = p.eval(1.0);
    if end < best.1 {
        best = (1.0, end);
    }
    if p.degree() < 2 {
        return Ok(best);
    }
    let d = p.derivative();
    if d.is_zero(1e-12 * p.max_abs().max(1.0)) {
        return Ok(best);
    }
    for t in univariate_roots(&d, eps)? {
        let v = p.eval(t);
        if v < best.1 {
            best = (t, v);
        }
    }
    Ok(best)
}

/// Returns the minimiser of `p` if `min p < level`, `None` otherwise.
///
/// The coefficient bound rejects most inputs before any root finding.
pub fn falls_below(p: &Bernstein1, level: f64, eps: f64) -> SolverResult<Option<(f64, f64)>> {
    if p.min_coeff() >= level {
        return Ok(None);
    }
    let (t, v) = minimize(p, eps)?;
    Ok((v < level).then_some((t, v)))
}

// =============================================================================
// BIVARIATE
// =============================================================================

/// Axis-aligned parameter rectangle `[u0, u1] × [v0, v1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    /// Lower `u` bound.
    pub u0: f64,
    /// Upper `u` bound.
    pub u1: f64,
    /// Lower `v` bound.
    pub v0: f64,
    /// Upper `v` bound.
    pub v1: f64,
}

impl Rect {
    /// The unit square.
    pub const UNIT: Rect = Rect {
        u0: 0.0,
        u1: 1.0,
        v0: 0.0,
        v1: 1.0,
    };

    /// Width in `u`.
    pub fn width_u(&self) -> f64 {
        self.u1 - self.u0
    }

    /// Width in `v`.
    pub fn width_v(&self) -> f64 {
        self.v1 - self.v0
    }

    /// Centre point.
    pub fn center(&self) -> (f64, f64) {
        (0.5 * (self.u0 + self.u1), 0.5 * (self.v0 + self.v1))
    }

    fn sub(&self, lo_u: f64, hi_u: f64, lo_v: f64, hi_v: f64) -> Rect {
        let wu = self.width_u();
        let wv = self.width_v();
        Rect {
            u0: self.u0 + lo_u * wu,
            u1: self.u0 + hi_u * wu,
            v0: self.v0 + lo_v * wv,
            v1: self.v0 + hi_v * wv,
        }
    }
}

/// Projects the control net onto `u` (`along_u = true`) or `v` and clips.
///
/// A polynomial of degree zero in the projected direction is constant along
/// it, so it either keeps the whole range or rules it out.
fn project_clip(p: &Bernstein2, along_u: bool) -> Option<(f64, f64)> {
    let (m, n) = p.degrees();
    let (outer, inner) = if along_u { (m, n) } else { (n, m) };
    if outer == 0 {
        let column = p.coeffs();
        let lo = column.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = column.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        return straddles_zero(lo, hi).then_some((0.0, 1.0));
    }
    let denom = outer as f64;
    let mut points = Vec::with_capacity(2 * (outer + 1));
    for a in 0..=outer {
        let mut lo = f64::INFINITY;
        let mut hi = f64::NEG_INFINITY;
        for b in 0..=inner {
            let c = if along_u { p.coeff(a, b) } else { p.coeff(b, a) };
            lo = lo.min(c);
            hi = hi.max(c);
        }
        let x = a as f64 / denom;
        points.push((x, lo));
        points.push((x, hi));
    }
    axis_hull(&points)
}

fn intersect(a: (f64, f64), b: (f64, f64)) -> Option<(f64, f64)> {
    let lo = a.0.max(b.0);
    let hi = a.1.min(b.1);
    (lo <= hi).then_some((lo, hi))
}

fn straddles(p: &Bernstein2) -> bool {
    let min = p.min_coeff();
    let max = p.coeffs().iter().copied().fold(f64::NEG_INFINITY, f64::max);
    straddles_zero(min, max)
}

/// Finds the common roots of `f` and `g` on the unit square up to `eps`.
///
/// `keep` is consulted for every candidate rectangle before it is clipped;
/// returning `false` prunes the rectangle, which lets callers discard
/// regions that cannot contain interesting roots.
///
/// # Errors
///
/// - [`SolverError::Degenerate`] if `f` or `g` vanishes identically
/// - [`SolverError::NonConvergent`] if the step or depth budget is exhausted
///
/// # Examples
///
/// ```
/// use cellgen_geometry::{Bernstein1, Bernstein2};
/// use cellgen_geometry::clipping::bivariate_roots;
/// // f = u - 0.3, g = v - 0.6
/// let f = Bernstein2::from_u(&Bernstein1::linear(-0.3, 0.7));
/// let g = Bernstein2::from_v(&Bernstein1::linear(-0.6, 0.4));
/// let roots = bivariate_roots(&f, &g, 1e-9, |_| true).unwrap();
/// assert_eq!(roots.len(), 1);
/// assert!((roots[0].0 - 0.3).abs() < 1e-8 && (roots[0].1 - 0.6).abs() < 1e-8);
/// ```
pub fn bivariate_roots(
    f: &Bernstein2,
    g: &Bernstein2,
    eps: f64,
    keep: impl Fn(&Rect) -> bool,
) -> SolverResult<Vec<(f64, f64)>> {
    check_tolerance(eps)?;
    if f.max_abs() == 0.0 || g.max_abs() == 0.0 {
        return Err(SolverError::Degenerate);
    }

    let mut roots: Vec<(f64, f64)> = Vec::new();
    let mut stack = vec![(Rect::UNIT, f.clone(), g.clone(), 0_u32)];
    let mut steps = 0_u32;

    while let Some((rect, fr, gr, depth)) = stack.pop() {
        steps += 1;
        if steps > SOLVER_MAX_STEPS || depth > 2 * SOLVER_MAX_DEPTH {
            return Err(SolverError::NonConvergent { steps });
        }
        if !keep(&rect) || !straddles(&fr) || !straddles(&gr) {
            continue;
        }
        if rect.width_u() <= eps && rect.width_v() <= eps {
            roots.push(rect.center());
            continue;
        }

        let Some(u_range) = project_clip(&fr, true).and_then(|a| project_clip(&gr, true).and_then(|b| intersect(a, b)))
        else {
            continue;
        };
        let Some(v_range) = project_clip(&fr, false).and_then(|a| project_clip(&gr, false).and_then(|b| intersect(a, b)))
        else {
            continue;
        };

        let stalled_u = u_range.1 - u_range.0 > 1.0 - MIN_CLIP_REDUCTION || rect.width_u() <= eps;
        let stalled_v = v_range.1 - v_range.0 > 1.0 - MIN_CLIP_REDUCTION || rect.width_v() <= eps;
        let clipped = rect.sub(u_range.0, u_range.1, v_range.0, v_range.1);
        if clipped.width_u() <= eps && clipped.width_v() <= eps {
            roots.push(clipped.center());
            continue;
        }
        let fc = fr.restrict(u_range.0, u_range.1, v_range.0, v_range.1);
        let gc = gr.restrict(u_range.0, u_range.1, v_range.0, v_range.1);

        if !(stalled_u && stalled_v) {
            stack.push((clipped, fc, gc, depth));
            continue;
        }

        if clipped.width_u() >= clipped.width_v() {
            let halves = [(0.0, 0.5), (0.5, 1.0)];
            for (lo, hi) in halves {
                stack.push((
                    clipped.sub(lo, hi, 0.0, 1.0),
                    fc.restrict(lo, hi, 0.0, 1.0),
                    gc.restrict(lo, hi, 0.0, 1.0),
                    depth + 1,
                ));
            }
        } else {
            let halves = [(0.0, 0.5), (0.5, 1.0)];
            for (lo, hi) in halves {
                stack.push((
                    clipped.sub(0.0, 1.0, lo, hi),
                    fc.restrict(0.0, 1.0, lo, hi),
                    gc.restrict(0.0, 1.0, lo, hi),
                    depth + 1,
                ));
            }
        }
    }

    roots.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.total_cmp(&b.1)));
    roots.dedup_by(|a, b| (a.0 - b.0).abs() <= 2.0 * eps && (a.1 - b.1).abs() <= 2.0 * eps);
    Ok(roots)
}
