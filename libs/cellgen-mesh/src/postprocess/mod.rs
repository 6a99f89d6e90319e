//! # Mesh Post-Processing
//!
//! Optional quality improvement of the final surface: greedy edge collapse
//! of bad triangles followed by HC Laplacian smoothing. Both keep the mesh a
//! closed manifold when it was one.

mod gec;
mod hc;

use config::settings::{GecParams, HcParams};

use crate::mesh::Mesh;

pub use gec::{greedy_edge_collapse, GecStats};
pub use hc::hc_smooth;

/// Runs the enabled passes in order: edge collapse, then smoothing.
pub fn post_process(mesh: &Mesh, gec: Option<&GecParams>, hc: Option<&HcParams>) -> (Mesh, Option<GecStats>) {
    let (mut out, stats) = match gec {
        Some(params) => {
            let (m, s) = greedy_edge_collapse(mesh, params);
            (m, Some(s))
        }
        None => (mesh.clone(), None),
    };
    if let Some(params) = hc {
        hc_smooth(&mut out, params);
    }
    (out, stats)
}

#[cfg(test)]
mod tests;
