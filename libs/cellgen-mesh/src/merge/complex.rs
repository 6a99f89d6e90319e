//! Complex edge detection.
//!
//! An edge is complex when it crosses the other surface at least twice; the
//! zipper can only stitch hole loops whose edges cross at most once, so such
//! edges are split until none remain.

use cellgen_geometry::BoundingBox;

use crate::intersect::segment_triangle;
use crate::mesh::{edge_key, Mesh};
use crate::spatial::FaceGrid;

/// Edges of `mesh` that cross `other` at least twice.
pub(crate) fn complex_edges(mesh: &Mesh, other: &Mesh, other_grid: &FaceGrid) -> Vec<(u32, u32)> {
    let region = other.bounding_box();
    let mut edges: Vec<(u32, u32)> = mesh
        .faces()
        .iter()
        .flat_map(|f| (0..3).map(move |k| edge_key(f[k], f[(k + 1) % 3])))
        .collect();
    edges.sort_unstable();
    edges.dedup();

    edges
        .into_iter()
        .filter(|&(a, b)| {
            let (p, q) = (mesh.vertex(a), mesh.vertex(b));
            if !region.intersects(&BoundingBox::from_points([p, q])) {
                return false;
            }
            let hits = other_grid
                .query_segment(p, q)
                .into_iter()
                .filter(|&f| segment_triangle(p, q, other.face_points(f)).is_some())
                .count();
            hits >= 2
        })
        .collect()
}

/// Complex edges of `red` against `blue` and of `blue` against `red`.
pub(crate) fn complex_edges_both(red: &Mesh, blue: &Mesh) -> (Vec<(u32, u32)>, Vec<(u32, u32)>) {
    let red_grid = FaceGrid::from_mesh(red);
    let blue_grid = FaceGrid::from_mesh(blue);
    (complex_edges(red, blue, &blue_grid), complex_edges(blue, red, &red_grid))
}
