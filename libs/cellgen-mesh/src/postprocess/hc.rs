//! HC Laplacian smoothing (Vollmer, Mencl and Müller, 1999).
//!
//! Each iteration moves every vertex to the centroid of its neighbours and
//! then pushes it back by a blend of its own and its neighbours' difference
//! vectors, which counteracts the shrinkage of plain Laplacian smoothing.

use cellgen_geometry::Vec3;
use config::settings::HcParams;
use tracing::debug;

use crate::mesh::Mesh;

/// Smooths the mesh in place. Connectivity and annotations are unchanged.
pub fn hc_smooth(mesh: &mut Mesh, params: &HcParams) {
    let neighbours = mesh.vertex_neighbors();
    let original: Vec<Vec3> = mesh.vertices().to_vec();
    let (alpha, beta) = (params.alpha(), params.beta());
    let mut current = original.clone();

    for _ in 0..params.maxiter() {
        let previous = current.clone();
        let mut diff = vec![Vec3::ZERO; current.len()];
        for (i, ring) in neighbours.iter().enumerate() {
            if ring.is_empty() {
                continue;
            }
            let centroid = ring.iter().map(|&j| previous[j as usize]).sum::<Vec3>() / ring.len() as f64;
            current[i] = centroid;
            diff[i] = centroid - (original[i] * alpha + previous[i] * (1.0 - alpha));
        }
        for (i, ring) in neighbours.iter().enumerate() {
            if ring.is_empty() {
                continue;
            }
            let mean_diff = ring.iter().map(|&j| diff[j as usize]).sum::<Vec3>() / ring.len() as f64;
            current[i] -= diff[i] * beta + mean_diff * (1.0 - beta);
        }
    }

    for (i, p) in current.into_iter().enumerate() {
        mesh.set_vertex(i as u32, p);
    }
    debug!(iterations = params.maxiter(), vertices = mesh.vertex_count(), "HC smoothing finished");
}
