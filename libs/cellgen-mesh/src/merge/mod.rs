//! # Red-Blue Merge
//!
//! Merges the tessellation of one modelling element (red) into the resident
//! mesh (blue).
//!
//! ## Algorithm
//!
//! ```text
//! 1. split complex edges of both meshes until none remain (bounded)
//! 2. remove red faces inside or crossing blue, blue faces inside or crossing red
//! 3. clear pinched boundary vertices
//! 4. extract hole loops, pair them by nearest centroid
//! 5. stitch each pair with a zipper strip, drop unreferenced vertices
//! ```
//!
//! "Inside" is decided analytically against the modelling primitives, so the
//! classification does not depend on the tessellation being watertight.

mod complex;
mod loops;

use cellgen_geometry::{BoundingBox, CanalSurface, Vec3};
use config::settings::MeshingSettings;
use thiserror::Error;
use tracing::debug;

use crate::intersect::triangles_intersect;
use crate::mesh::{FaceTag, Mesh};
use crate::spatial::FaceGrid;

use complex::complex_edges_both;
use loops::{clear_pinches, extract_loops, pair_loops, zipper};

/// Analytic shape of a modelling element.
#[derive(Debug, Clone, PartialEq)]
pub enum Primitive {
    /// Soma sphere.
    Sphere {
        /// Centre.
        centre: Vec3,
        /// Radius as tessellated.
        radius: f64,
    },
    /// Neurite path.
    Tube {
        /// Canal surfaces of the path, unscaled.
        segments: Vec<CanalSurface>,
        /// Radius factor the path was tessellated with.
        factor: f64,
    },
}

impl Primitive {
    /// Returns true if `p` lies strictly inside the shape.
    pub fn contains(&self, p: Vec3) -> bool {
        match self {
            Primitive::Sphere { centre, radius } => centre.distance_squared(p) < radius * radius,
            Primitive::Tube { segments, factor } => segments.iter().any(|s| s.contains(p, *factor)),
        }
    }

    /// Conservative bounding box.
    pub fn bounding_box(&self) -> BoundingBox {
        match self {
            Primitive::Sphere { centre, radius } => BoundingBox::around_sphere(*centre, *radius),
            Primitive::Tube { segments, .. } => segments
                .iter()
                .fold(BoundingBox::empty(), |acc, s| acc.union(&s.bounding_box())),
        }
    }
}

/// Bounds of the inner loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeParams {
    /// Maximum number of complex edge splitting rounds.
    pub inner_maxiter: u32,
    /// Allowed cumulative new complex edges relative to the initial count.
    pub growth_factor: f64,
}

impl MergeParams {
    /// Bounds from the meshing settings.
    pub fn from_settings(settings: &MeshingSettings) -> Self {
        Self {
            inner_maxiter: settings.inner_loop_maxiter,
            growth_factor: settings.complex_edge_max_growth_factor,
        }
    }
}

/// Counters of one merge attempt.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MergeStats {
    /// Complex edges before the first split (`m₀`).
    pub initial_complex_edges: usize,
    /// Complex edges found after splitting, summed over all rounds.
    pub new_complex_edges: usize,
    /// Splitting rounds performed.
    pub inner_iterations: u32,
    /// Red faces removed.
    pub removed_red: usize,
    /// Blue faces removed.
    pub removed_blue: usize,
    /// Stitched loop pairs.
    pub loops: usize,
    /// Red lay entirely inside blue and was dropped.
    pub absorbed: bool,
}

/// Broken precondition of the stitching step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Violation {
    /// Red and blue do not touch.
    #[error("element does not touch the resident mesh")]
    NoContact,
    /// Different numbers of hole loops on both sides.
    #[error("hole loop count mismatch: {red} red vs {blue} blue")]
    LoopCountMismatch {
        /// Red loops.
        red: usize,
        /// Blue loops.
        blue: usize,
    },
    /// A hole boundary is not a simple closed polygon.
    #[error("hole boundary is not a simple loop")]
    NonSimpleLoop,
    /// Paired loops run in the same direction.
    #[error("paired hole loops have the same orientation")]
    SameDirectionLoops,
    /// Nothing to merge into.
    #[error("resident mesh is empty")]
    EmptyBlue,
}

/// Failure of one merge attempt. The caller retries with a smaller radius.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MergeError {
    /// Complex edge refinement created too many new complex edges.
    #[error("complex edge budget exceeded: {created} new vs limit {limit:.1} (m0 = {initial})")]
    BudgetExceeded {
        /// Initial complex edges.
        initial: usize,
        /// Cumulative new complex edges.
        created: usize,
        /// Allowed cumulative count.
        limit: f64,
    },
    /// Splitting rounds exhausted.
    #[error("inner loop exhausted after {iterations} rounds")]
    InnerLoopExhausted {
        /// Rounds performed.
        iterations: u32,
    },
    /// Stitching precondition broken.
    #[error(transparent)]
    InvariantViolation(#[from] Violation),
}

/// Result of a successful merge.
#[derive(Debug, Clone)]
pub struct MergeOutput {
    /// New resident mesh.
    pub mesh: Mesh,
    /// Attempt counters.
    pub stats: MergeStats,
}

/// Merges `red` (shape `red_shape`) into a copy of `blue` (shapes `blue_shapes`).
///
/// `blue` is left untouched, so a failed attempt needs no rollback.
///
/// # Errors
///
/// [`MergeError`] when the complex edge refinement exceeds its bounds or the
/// hole loops cannot be stitched.
pub fn red_blue_merge(
    blue: &Mesh,
    blue_shapes: &[Primitive],
    red: Mesh,
    red_shape: &Primitive,
    params: &MergeParams,
) -> Result<MergeOutput, MergeError> {
    if blue.is_empty() {
        return Err(Violation::EmptyBlue.into());
    }
    if red.is_empty() {
        return Err(Violation::NoContact.into());
    }
    let element = red.face_tag(0).element;
    let mut blue = blue.clone();
    let mut red = red;
    let mut stats = MergeStats::default();

    let (mut red_cx, mut blue_cx) = complex_edges_both(&red, &blue);
    stats.initial_complex_edges = red_cx.len() + blue_cx.len();
    let limit = params.growth_factor * stats.initial_complex_edges as f64;
    while !(red_cx.is_empty() && blue_cx.is_empty()) {
        stats.inner_iterations += 1;
        if stats.inner_iterations > params.inner_maxiter {
            return Err(MergeError::InnerLoopExhausted {
                iterations: params.inner_maxiter,
            });
        }
        red.split_edges(&red_cx);
        blue.split_edges(&blue_cx);
        (red_cx, blue_cx) = complex_edges_both(&red, &blue);
        stats.new_complex_edges += red_cx.len() + blue_cx.len();
        if stats.new_complex_edges as f64 > limit {
            return Err(MergeError::BudgetExceeded {
                initial: stats.initial_complex_edges,
                created: stats.new_complex_edges,
                limit,
            });
        }
    }

    let red_box = red.bounding_box();
    let shapes: Vec<&Primitive> = blue_shapes
        .iter()
        .filter(|s| s.bounding_box().intersects(&red_box))
        .collect();
    let red_grid = FaceGrid::from_mesh(&red);
    let blue_grid = FaceGrid::from_mesh(&blue);

    let red_inside: Vec<bool> = red.vertices().iter().map(|&p| shapes.iter().any(|s| s.contains(p))).collect();
    let mut red_removed: Vec<bool> = (0..red.face_count())
        .map(|f| {
            red.face(f).iter().any(|&v| red_inside[v as usize])
                || blue_grid
                    .query_box(&red.face_bbox(f))
                    .into_iter()
                    .any(|g| triangles_intersect(red.face_points(f), blue.face_points(g)))
        })
        .collect();

    let red_shape_box = red_shape.bounding_box().union(&red_box);
    let mut blue_removed = vec![false; blue.face_count()];
    for g in blue_grid.query_box(&red_shape_box) {
        let inside = blue.face(g).iter().any(|&v| red_shape.contains(blue.vertex(v)));
        blue_removed[g] = inside
            || red_grid
                .query_box(&blue.face_bbox(g))
                .into_iter()
                .any(|f| triangles_intersect(blue.face_points(g), red.face_points(f)));
    }

    stats.removed_red = red_removed.iter().filter(|r| **r).count();
    stats.removed_blue = blue_removed.iter().filter(|r| **r).count();
    if stats.removed_red == 0 && stats.removed_blue == 0 {
        return Err(Violation::NoContact.into());
    }
    if stats.removed_red == red.face_count() && stats.removed_blue == 0 {
        debug!(element, "element absorbed by resident mesh");
        stats.absorbed = true;
        return Ok(MergeOutput { mesh: blue, stats });
    }

    stats.removed_red += clear_pinches(&red, &mut red_removed);
    stats.removed_blue += clear_pinches(&blue, &mut blue_removed);
    let red_loops = extract_loops(&red, &red_removed)?;
    let blue_loops = extract_loops(&blue, &blue_removed)?;
    if red_loops.is_empty() && blue_loops.is_empty() {
        return Err(Violation::LoopCountMismatch { red: 0, blue: 0 }.into());
    }
    let pairs = pair_loops(&red_loops, &blue_loops)?;
    stats.loops = pairs.len();

    let keep = |removed: &[bool]| removed.iter().map(|r| !r).collect::<Vec<bool>>();
    blue.retain_faces(&keep(&blue_removed));
    red.retain_faces(&keep(&red_removed));
    let offset = blue.append(&red);

    let tag = FaceTag { element };
    for (ri, bi) in pairs {
        let a: Vec<(u32, Vec3)> = red_loops[ri]
            .vertices
            .iter()
            .map(|&v| (v + offset, red.vertex(v)))
            .collect();
        let b: Vec<(u32, Vec3)> = blue_loops[bi].vertices.iter().map(|&v| (v, blue.vertex(v))).collect();
        for face in zipper(&a, &b) {
            blue.add_face(face, tag);
        }
    }
    blue.compact();

    debug!(
        element,
        m0 = stats.initial_complex_edges,
        new_complex_edges = stats.new_complex_edges,
        removed_red = stats.removed_red,
        removed_blue = stats.removed_blue,
        loops = stats.loops,
        "merged element"
    );
    Ok(MergeOutput { mesh: blue, stats })
}

#[cfg(test)]
mod tests;
