//! Thin wrapper around `glam::DVec3` shared across cellgen crates.
//!
//! The helpers cover the few operations the tessellators and predicates need
//! on top of `glam`.

pub use glam::DVec3 as Vec3;

/// Returns a unit vector perpendicular to `v`.
///
/// Falls back to the Y axis when `v` has zero length.
///
/// # Examples
/// ```
/// use cellgen_geometry::vec3::{any_perpendicular, Vec3};
/// let p = any_perpendicular(Vec3::Z);
/// assert!(p.dot(Vec3::Z).abs() < 1e-12);
/// assert!((p.length() - 1.0).abs() < 1e-12);
/// ```
pub fn any_perpendicular(v: Vec3) -> Vec3 {
    let a = v.abs();
    let axis = if a.x <= a.y && a.x <= a.z {
        Vec3::X
    } else if a.y <= a.z {
        Vec3::Y
    } else {
        Vec3::Z
    };
    v.cross(axis).try_normalize().unwrap_or(Vec3::Y)
}

/// Angle between two vectors in radians, `0` if either is zero.
///
/// # Examples
/// ```
/// use cellgen_geometry::vec3::{angle_between, Vec3};
/// let a = angle_between(Vec3::X, Vec3::Y);
/// assert!((a - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
/// ```
pub fn angle_between(a: Vec3, b: Vec3) -> f64 {
    let denom = a.length() * b.length();
    if denom <= f64::EPSILON {
        return 0.0;
    }
    (a.dot(b) / denom).clamp(-1.0, 1.0).acos()
}

/// Rotates `v` about the unit `axis` by `angle` (Rodrigues formula).
pub fn rotate_about(v: Vec3, axis: Vec3, angle: f64) -> Vec3 {
    let (sin_a, cos_a) = angle.sin_cos();
    v * cos_a + axis.cross(v) * sin_a + axis * axis.dot(v) * (1.0 - cos_a)
}

#[cfg(test)]
mod tests;
