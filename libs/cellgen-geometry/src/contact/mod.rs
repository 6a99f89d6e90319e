//! # Contact Predicates
//!
//! Polynomial formulations of the geometric conflicts between canal surfaces
//! and spheres. Every predicate builds a Bernstein polynomial whose sign
//! decides the conflict and hands it to the clipping solvers.
//!
//! | Predicate | Polynomial | Conflict if |
//! |-----------|------------|-------------|
//! | [`regularity`] | `\|γ'\|² − r'²` | `min ≤ 0` |
//! | [`local_self_intersection`] | `\|γ'\|⁶ − r²\|γ'×γ''\|²` | `min ≤ 0` |
//! | [`sphere_contact`] | `\|γ − c\|² − (R + r)²` | `min < 0` |
//! | [`point_clearance`] | `\|γ − p\|² − r²` | returns the minimum |
//! | [`canal_contact`] | `\|γ₁(s) − γ₂(t)\|² − (r₁ + r₂)²` | `min < 0` |

use crate::bernstein::{Bernstein1, Bernstein2};
use crate::canal::CanalSurface;
use crate::clipping::{bivariate_roots, falls_below, minimize, Rect};
use crate::error::SolverResult;
use crate::vec3::Vec3;

/// Relative threshold below which a non-negative quantity counts as zero.
const ZERO_THRESHOLD: f64 = 1e-12;

/// Location and value of the minimum that triggered a conflict.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Parameter on the first surface.
    pub s: f64,
    /// Parameter on the second surface (equal to `s` for single-surface tests).
    pub t: f64,
    /// Value of the defining polynomial at the minimum.
    pub value: f64,
}

type Poly3 = [Bernstein1; 3];

fn dot(a: &Poly3, b: &Poly3) -> Bernstein1 {
    let xx = &a[0] * &b[0];
    let yy = &a[1] * &b[1];
    let zz = &a[2] * &b[2];
    &(&xx + &yy) + &zz
}

fn cross(a: &Poly3, b: &Poly3) -> Poly3 {
    [
        &(&a[1] * &b[2]) - &(&a[2] * &b[1]),
        &(&a[2] * &b[0]) - &(&a[0] * &b[2]),
        &(&a[0] * &b[1]) - &(&a[1] * &b[0]),
    ]
}

fn threshold(p: &Bernstein1) -> f64 {
    ZERO_THRESHOLD * p.max_abs().max(1.0)
}

// =============================================================================
// SINGLE SURFACE
// =============================================================================

/// Regularity test: the envelope is undefined where `|γ'| ≤ |r'|`.
///
/// # Examples
/// ```
/// use cellgen_geometry::{CanalSurface, Vec3};
/// use cellgen_geometry::contact::regularity;
/// let fine = CanalSurface::linear(Vec3::ZERO, Vec3::X * 10.0, 1.0, 2.0).unwrap();
/// assert!(regularity(&fine, 1e-9).unwrap().is_none());
/// let cone = CanalSurface::linear(Vec3::ZERO, Vec3::X, 1.0, 3.0).unwrap();
/// assert!(regularity(&cone, 1e-9).unwrap().is_some());
/// ```
pub fn regularity(surface: &CanalSurface, eps: f64) -> SolverResult<Option<Contact>> {
    let d = surface.spine().derivative().components();
    let dr = surface.radius_poly().derivative();
    let p = &dot(&d, &d) - &(&dr * &dr);
    Ok(falls_below(&p, threshold(&p), eps)?.map(|(t, value)| Contact { s: t, t, value }))
}

/// Local self-intersection test: the curvature radius of the spine drops
/// below the tube radius.
///
/// `|γ'|³ / |γ'×γ''|` is the curvature radius, so the conflict condition
/// `κ⁻¹ ≤ r` is the polynomial inequality `|γ'|⁶ − r²|γ'×γ''|² ≤ 0`.
pub fn local_self_intersection(surface: &CanalSurface, eps: f64) -> SolverResult<Option<Contact>> {
    let spine = surface.spine();
    let d1 = spine.derivative();
    let d2 = d1.derivative();
    let c1 = d1.components();
    let c2 = d2.components();
    let speed2 = dot(&c1, &c1);
    let speed6 = &(&speed2 * &speed2) * &speed2;
    let k = cross(&c1, &c2);
    let r = surface.radius_poly();
    let p = &speed6 - &(&(&r * &r) * &dot(&k, &k));
    Ok(falls_below(&p, threshold(&p), eps)?.map(|(t, value)| Contact { s: t, t, value }))
}

/// Overlap test between the tube and a sphere.
///
/// # Examples
/// ```
/// use cellgen_geometry::{CanalSurface, Vec3};
/// use cellgen_geometry::contact::sphere_contact;
/// let s = CanalSurface::linear(Vec3::X * 4.0, Vec3::X * 10.0, 1.0, 1.0).unwrap();
/// assert!(sphere_contact(&s, Vec3::ZERO, 3.5, 1e-9).unwrap().is_some());
/// assert!(sphere_contact(&s, Vec3::ZERO, 2.5, 1e-9).unwrap().is_none());
/// ```
pub fn sphere_contact(surface: &CanalSurface, centre: Vec3, radius: f64, eps: f64) -> SolverResult<Option<Contact>> {
    let mut acc = Bernstein1::constant(0.0);
    for axis in 0..3 {
        let d = &surface.spine().component(axis) - &Bernstein1::constant(centre[axis]);
        acc = &acc + &(&d * &d);
    }
    let reach = &surface.radius_poly() + &Bernstein1::constant(radius);
    let g = &acc - &(&reach * &reach);
    Ok(falls_below(&g, 0.0, eps)?.map(|(t, value)| Contact { s: t, t, value }))
}

/// Minimum of `|γ(t) − p|² − r(t)²`, negative iff `p` is inside the tube.
pub fn point_clearance(surface: &CanalSurface, p: Vec3, eps: f64) -> SolverResult<f64> {
    let g = surface.clearance_poly(p, 1.0);
    minimize(&g, eps).map(|(_, v)| v)
}

// =============================================================================
// SURFACE PAIRS
// =============================================================================

/// `F(s, t) = |γ₁(s) − γ₂(t)|² − (r₁(s) + r₂(t))²` in Bernstein form.
pub fn pair_distance_poly(a: &CanalSurface, b: &CanalSurface) -> Bernstein2 {
    let mut f = Bernstein2::constant(0.0);
    for axis in 0..3 {
        let xa = a.spine().component(axis);
        let xb = b.spine().component(axis);
        let aa = Bernstein2::from_u(&(&xa * &xa));
        let bb = Bernstein2::from_v(&(&xb * &xb));
        let ab = Bernstein2::outer(&xa, &xb).scale(2.0);
        f = &f + &(&(&aa + &bb) - &ab);
    }
    let ra = a.radius_poly();
    let rb = b.radius_poly();
    let r2 = &(&Bernstein2::from_u(&(&ra * &ra)) + &Bernstein2::from_v(&(&rb * &rb)))
        + &Bernstein2::outer(&ra, &rb).scale(2.0);
    &f - &r2
}

fn lowest(best: Option<Contact>, candidate: Contact) -> Option<Contact> {
    match best {
        Some(b) if b.value <= candidate.value => Some(b),
        _ => Some(candidate),
    }
}

/// Overlap test between two canal surfaces.
///
/// A contact exists iff `min F < 0` on the unit square. The minimum is
/// searched at the corners, along the four boundary edges (univariate
/// clipping with `univar_eps`) and at the interior stationary points
/// `∂F/∂s = ∂F/∂t = 0` (bivariate clipping with `bivar_eps`). Rectangles
/// on which the Bernstein bound proves `F ≥ 0` are pruned.
///
/// # Examples
/// ```
/// use cellgen_geometry::{CanalSurface, Vec3};
/// use cellgen_geometry::contact::canal_contact;
/// let a = CanalSurface::linear(Vec3::new(-5.0, 0.0, 0.0), Vec3::new(5.0, 0.0, 0.0), 1.0, 1.0).unwrap();
/// let b = CanalSurface::linear(Vec3::new(0.0, -5.0, 1.5), Vec3::new(0.0, 5.0, 1.5), 1.0, 1.0).unwrap();
/// let c = CanalSurface::linear(Vec3::new(0.0, -5.0, 2.5), Vec3::new(0.0, 5.0, 2.5), 1.0, 1.0).unwrap();
/// assert!(canal_contact(&a, &b, 1e-9, 1e-6).unwrap().is_some());
/// assert!(canal_contact(&a, &c, 1e-9, 1e-6).unwrap().is_none());
/// ```
pub fn canal_contact(
    a: &CanalSurface,
    b: &CanalSurface,
    univar_eps: f64,
    bivar_eps: f64,
) -> SolverResult<Option<Contact>> {
    let f = pair_distance_poly(a, b);
    if f.min_coeff() >= 0.0 {
        return Ok(None);
    }

    let mut best: Option<Contact> = None;
    for (s, t) in [(0.0, 0.0), (0.0, 1.0), (1.0, 0.0), (1.0, 1.0)] {
        let value = f.eval(s, t);
        if value < 0.0 {
            best = lowest(best, Contact { s, t, value });
        }
    }
    if best.is_some() {
        return Ok(best);
    }

    for fixed in [0.0, 1.0] {
        if let Some((t, value)) = falls_below(&f.at_u(fixed), 0.0, univar_eps)? {
            best = lowest(best, Contact { s: fixed, t, value });
        }
        if let Some((s, value)) = falls_below(&f.at_v(fixed), 0.0, univar_eps)? {
            best = lowest(best, Contact { s, t: fixed, value });
        }
    }
    if best.is_some() {
        return Ok(best);
    }

    let fs = f.derivative_u();
    let ft = f.derivative_v();
    let keep = |r: &Rect| f.restrict(r.u0, r.u1, r.v0, r.v1).min_coeff() < 0.0;
    for (s, t) in bivariate_roots(&fs, &ft, bivar_eps, keep)? {
        let value = f.eval(s, t);
        if value < 0.0 {
            best = lowest(best, Contact { s, t, value });
        }
    }
    Ok(best)
}
