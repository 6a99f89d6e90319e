//! Rotation minimising frames along a sampled spine.

use cellgen_geometry::vec3::{any_perpendicular, angle_between, rotate_about};
use cellgen_geometry::Vec3;

/// Orthonormal frame with `binormal = tangent × normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    /// Unit tangent.
    pub tangent: Vec3,
    /// Unit normal.
    pub normal: Vec3,
    /// Unit binormal.
    pub binormal: Vec3,
}

impl Frame {
    /// Initial frame for `tangent`, with the normal rotated by `phase`.
    pub fn from_tangent(tangent: Vec3, phase: f64) -> Self {
        let tangent = tangent.try_normalize().unwrap_or(Vec3::Z);
        let normal = rotate_about(any_perpendicular(tangent), tangent, phase);
        Self {
            tangent,
            normal,
            binormal: tangent.cross(normal),
        }
    }

    /// Transports the frame onto `tangent` by the minimal rotation.
    pub fn transport(&self, tangent: Vec3) -> Self {
        let Some(tangent) = tangent.try_normalize() else {
            return *self;
        };
        let axis = self.tangent.cross(tangent);
        let normal = match axis.try_normalize() {
            Some(axis) => rotate_about(self.normal, axis, angle_between(self.tangent, tangent)),
            None if self.tangent.dot(tangent) < 0.0 => -self.normal,
            None => self.normal,
        };
        // re-orthogonalise against drift
        let normal = (normal - tangent * tangent.dot(normal))
            .try_normalize()
            .unwrap_or_else(|| any_perpendicular(tangent));
        Self {
            tangent,
            normal,
            binormal: tangent.cross(normal),
        }
    }

    /// Unit direction at angle `theta` in the normal plane.
    #[inline]
    pub fn radial(&self, theta: f64) -> Vec3 {
        let (s, c) = theta.sin_cos();
        self.normal * c + self.binormal * s
    }
}

/// Frames along consecutive tangents, starting from `phase`.
pub fn transport_frames(tangents: &[Vec3], phase: f64) -> Vec<Frame> {
    let mut frames: Vec<Frame> = Vec::with_capacity(tangents.len());
    for &t in tangents {
        let frame = match frames.last() {
            Some(prev) => prev.transport(t),
            None => Frame::from_tangent(t, phase),
        };
        frames.push(frame);
    }
    frames
}
