//! # Canal Surface Tessellation
//!
//! A neurite path is tessellated as one closed tube: rings of
//! `angular_segments` vertices are placed on the characteristic circles of
//! its canal surfaces, consecutive rings are joined by triangle strips and
//! both ends are closed by cone caps whose apex sits one radius beyond the
//! end point.
//!
//! ## Ring spacing
//!
//! ```text
//! h = 2 r sin(π / n) · (√3 / 2) · triangle_height_factor
//! ```
//!
//! is the height of an equilateral triangle over a ring chord, so the default
//! factor yields near-equilateral strips. Unless crease edges are preserved,
//! every other ring is rotated by half an angular step.

mod frame;

use std::f64::consts::PI;

use cellgen_geometry::CanalSurface;
use cellgen_geometry::Vec3;
use config::settings::MeshingSettings;
use tracing::trace;

use crate::error::{MeshError, MeshResult};
use crate::mesh::{FaceTag, Mesh, VertexTag};

pub use frame::{transport_frames, Frame};

/// One canal surface of a path together with its arc length.
#[derive(Debug, Clone, PartialEq)]
pub struct TubeSection {
    /// Segment surface, unscaled.
    pub surface: CanalSurface,
    /// Arc length covered by the segment, sets the ring count.
    pub arc_length: f64,
}

/// Tessellation parameters of one attempt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TubeParams {
    /// Vertices per ring.
    pub angular_segments: u32,
    /// Multiplier of the ring spacing.
    pub triangle_height_factor: f64,
    /// Radius multiplier of the current attempt.
    pub radius_factor: f64,
    /// Rotation of the first ring about the spine.
    pub phase: f64,
    /// Keep all rings aligned instead of alternating half steps.
    pub preserve_crease_edges: bool,
    /// Element id written into the annotations.
    pub element: u32,
}

impl TubeParams {
    /// Parameters from the meshing settings for one attempt.
    pub fn from_settings(settings: &MeshingSettings, radius_factor: f64, phase: f64, element: u32) -> Self {
        Self {
            angular_segments: settings.angular_segments,
            triangle_height_factor: settings.triangle_height_factor,
            radius_factor,
            phase,
            preserve_crease_edges: settings.preserve_crease_edges,
            element,
        }
    }
}

/// Distance between consecutive rings of radius `radius`.
///
/// # Example
///
/// ```rust
/// use cellgen_mesh::tube::ring_spacing;
/// // hexagonal rings: chord equals radius
/// let h = ring_spacing(1.0, 6, 1.0);
/// assert!((h - 3.0_f64.sqrt() / 2.0).abs() < 1e-12);
/// ```
pub fn ring_spacing(radius: f64, angular_segments: u32, triangle_height_factor: f64) -> f64 {
    let n = angular_segments.max(3) as f64;
    2.0 * radius * (PI / n).sin() * (3.0_f64.sqrt() / 2.0) * triangle_height_factor
}

#[derive(Debug, Clone, Copy)]
struct RingSample {
    centre: Vec3,
    ring_radius: f64,
    tangent: Vec3,
    spine_point: Vec3,
    sphere_radius: f64,
}

/// Characteristic circle of the sphere family at `t`.
///
/// The circle lies in the plane `(x - γ)·γ' = -r r'`, offset from the spine
/// point and shrunk by `sqrt(1 - r'² / |γ'|²)`.
fn characteristic_circle(surface: &CanalSurface, t: f64, factor: f64) -> MeshResult<RingSample> {
    let d = surface.spine().derivative().eval(t);
    let speed2 = d.length_squared();
    let point = surface.point(t);
    let r = surface.radius(t) * factor;
    let (r0, r1) = surface.end_radii();
    let dr = (r1 - r0) * factor;
    if speed2 <= f64::EPSILON {
        return Err(MeshError::degenerate(format!("spine is stationary at t = {t:.4}")));
    }
    let shrink = 1.0 - dr * dr / speed2;
    if shrink <= 0.0 {
        return Err(MeshError::degenerate(format!("envelope undefined at t = {t:.4}")));
    }
    Ok(RingSample {
        centre: point - d * (r * dr / speed2),
        ring_radius: r * shrink.sqrt(),
        tangent: d / speed2.sqrt(),
        spine_point: point,
        sphere_radius: r,
    })
}

/// Tessellates consecutive canal surfaces into one closed tube.
///
/// # Errors
///
/// [`MeshError::DegenerateGeometry`] when no sections are given, an arc
/// length is not positive, or a characteristic circle does not exist.
pub fn tessellate_tube(sections: &[TubeSection], params: &TubeParams) -> MeshResult<Mesh> {
    if sections.is_empty() {
        return Err(MeshError::degenerate("tube without sections"));
    }
    let n = params.angular_segments.max(3) as usize;
    let factor = params.radius_factor;

    let mut samples = Vec::new();
    for (i, section) in sections.iter().enumerate() {
        if !(section.arc_length > 0.0 && section.arc_length.is_finite()) {
            return Err(MeshError::degenerate(format!(
                "section {i} has arc length {}",
                section.arc_length
            )));
        }
        let h = ring_spacing(
            section.surface.min_radius() * factor,
            params.angular_segments,
            params.triangle_height_factor,
        );
        let steps = ((section.arc_length / h).ceil() as usize).max(1);
        let first = if i == 0 { 0 } else { 1 };
        for k in first..=steps {
            samples.push(characteristic_circle(&section.surface, k as f64 / steps as f64, factor)?);
        }
    }

    let tangents: Vec<Vec3> = samples.iter().map(|s| s.tangent).collect();
    let frames = transport_frames(&tangents, params.phase);
    let step = 2.0 * PI / n as f64;
    let offset = |ring: usize| {
        if params.preserve_crease_edges || ring % 2 == 0 {
            0.0
        } else {
            0.5 * step
        }
    };

    let rings = samples.len();
    let vtag = VertexTag::new(params.element);
    let ftag = FaceTag { element: params.element };
    let mut mesh = Mesh::with_capacity(rings * n + 2, 2 * n * rings);
    for (k, (sample, frame)) in samples.iter().zip(&frames).enumerate() {
        for j in 0..n {
            let dir = frame.radial(offset(k) + j as f64 * step);
            mesh.add_vertex(sample.centre + dir * sample.ring_radius, vtag);
        }
    }

    let idx = |ring: usize, j: usize| (ring * n + j % n) as u32;
    for k in 0..rings - 1 {
        let (a, b) = (k, k + 1);
        let shift = offset(b) - offset(a);
        for j in 0..n {
            let (aj, aj1, bj, bj1) = (idx(a, j), idx(a, j + 1), idx(b, j), idx(b, j + 1));
            if shift == 0.0 {
                mesh.add_face([aj, aj1, bj1], ftag);
                mesh.add_face([aj, bj1, bj], ftag);
            } else if shift > 0.0 {
                mesh.add_face([aj, aj1, bj], ftag);
                mesh.add_face([aj1, bj1, bj], ftag);
            } else {
                mesh.add_face([aj, bj1, bj], ftag);
                mesh.add_face([aj, aj1, bj1], ftag);
            }
        }
    }

    let head = samples[0];
    let tail = samples[rings - 1];
    let start_apex = mesh.add_vertex(head.spine_point - frames[0].tangent * head.sphere_radius, vtag);
    let end_apex = mesh.add_vertex(tail.spine_point + frames[rings - 1].tangent * tail.sphere_radius, vtag);
    for j in 0..n {
        mesh.add_face([start_apex, idx(0, j + 1), idx(0, j)], ftag);
        mesh.add_face([end_apex, idx(rings - 1, j), idx(rings - 1, j + 1)], ftag);
    }

    trace!(
        element = params.element,
        rings,
        faces = mesh.face_count(),
        "tessellated tube"
    );
    Ok(mesh)
}

#[cfg(test)]
mod tests;
