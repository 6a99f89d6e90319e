//! Segment and triangle intersection tests used by the merger.
//!
//! Crossings are decided with exact orientation predicates.

use cellgen_geometry::Vec3;
use robust::{orient3d, Coord3D};

#[inline]
fn coord(p: Vec3) -> Coord3D<f64> {
    Coord3D { x: p.x, y: p.y, z: p.z }
}

#[inline]
fn orient(a: Vec3, b: Vec3, c: Vec3, d: Vec3) -> f64 {
    orient3d(coord(a), coord(b), coord(c), coord(d))
}

/// Parameter `s ∈ [0, 1]` where the segment `p`–`q` crosses triangle `tri`.
///
/// Coplanar configurations report no crossing.
///
/// # Example
///
/// ```rust
/// use cellgen_geometry::Vec3;
/// use cellgen_mesh::intersect::segment_triangle;
///
/// let tri = [Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), Vec3::new(0.0, 1.0, 0.0)];
/// let s = segment_triangle(Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, 3.0), tri).unwrap();
/// assert!((s - 0.25).abs() < 1e-12);
/// ```
pub fn segment_triangle(p: Vec3, q: Vec3, [a, b, c]: [Vec3; 3]) -> Option<f64> {
    let op = orient(a, b, c, p);
    let oq = orient(a, b, c, q);
    if (op > 0.0 && oq > 0.0) || (op < 0.0 && oq < 0.0) || (op == 0.0 && oq == 0.0) {
        return None;
    }
    let e0 = orient(p, q, a, b);
    let e1 = orient(p, q, b, c);
    let e2 = orient(p, q, c, a);
    let all_nonneg = e0 >= 0.0 && e1 >= 0.0 && e2 >= 0.0;
    let all_nonpos = e0 <= 0.0 && e1 <= 0.0 && e2 <= 0.0;
    if !(all_nonneg || all_nonpos) {
        return None;
    }
    Some(op / (op - oq))
}

/// Returns true if any edge of one triangle crosses the other triangle.
pub fn triangles_intersect(t1: [Vec3; 3], t2: [Vec3; 3]) -> bool {
    let crosses = |a: [Vec3; 3], b: [Vec3; 3]| {
        (0..3).any(|k| segment_triangle(a[k], a[(k + 1) % 3], b).is_some())
    };
    crosses(t1, t2) || crosses(t2, t1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> [Vec3; 3] {
        [Vec3::ZERO, Vec3::X, Vec3::Y]
    }

    #[test]
    fn miss_outside_triangle() {
        assert!(segment_triangle(Vec3::new(1.0, 1.0, -1.0), Vec3::new(1.0, 1.0, 1.0), unit()).is_none());
    }

    #[test]
    fn short_segment_does_not_reach() {
        let p = Vec3::new(0.2, 0.2, 1.0);
        assert!(segment_triangle(p, p + Vec3::Z, unit()).is_none());
        let s = segment_triangle(p, p - Vec3::Z * 2.0, unit()).unwrap();
        assert!((s - 0.5).abs() < 1e-12);
    }

    #[test]
    fn coplanar_segment_is_ignored() {
        assert!(segment_triangle(Vec3::new(-1.0, 0.2, 0.0), Vec3::new(2.0, 0.2, 0.0), unit()).is_none());
    }

    #[test]
    fn interlocked_triangles() {
        let other = [Vec3::new(0.2, 0.2, -1.0), Vec3::new(0.2, 0.2, 1.0), Vec3::new(-1.0, -1.0, 0.5)];
        assert!(triangles_intersect(unit(), other));
        let far = other.map(|p| p + Vec3::Z * 5.0);
        assert!(!triangles_intersect(unit(), far));
    }
}
