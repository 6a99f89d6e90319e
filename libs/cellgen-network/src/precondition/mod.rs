//! # Network Preconditioning
//!
//! Regularizes raw skeletons before partitioning. Reconstructions often
//! contain radius jumps, vertices closer than their radii and very long
//! segments, all of which make tube modelling fail.
//!
//! Passes, in order:
//!
//! 1. **beta**: clamp child radii top-down so that the ratio across a
//!    segment stays within `max(beta, 1)`
//! 2. **alpha**: remove interior vertices whose incoming segment is shorter
//!    than `alpha · max(r_u, r_v)`
//! 3. **gamma**: subdivide segments longer than `gamma · min(r_u, r_v)`

use config::settings::PreconditionSettings;
use tracing::debug;

use crate::error::GraphResult;
use crate::graph::{EdgeId, SkeletonGraph, VertexId};

/// Changes made by [`precondition`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreconditionStats {
    /// Radii changed by the beta pass.
    pub clamped_radii: usize,
    /// Vertices removed by the alpha pass.
    pub removed_vertices: usize,
    /// Vertices inserted by the gamma pass.
    pub inserted_vertices: usize,
}

/// Runs the three preconditioning passes.
pub fn precondition(graph: &mut SkeletonGraph, settings: &PreconditionSettings) -> GraphResult<PreconditionStats> {
    graph.validate()?;
    let mut stats = PreconditionStats {
        clamped_radii: clamp_radii(graph, settings.beta)?,
        ..PreconditionStats::default()
    };
    stats.removed_vertices = remove_short_segments(graph, settings.alpha)?;
    stats.inserted_vertices = split_long_segments(graph, settings.gamma)?;
    debug!(
        clamped = stats.clamped_radii,
        removed = stats.removed_vertices,
        inserted = stats.inserted_vertices,
        "network preconditioned"
    );
    Ok(stats)
}

fn neurite_order(graph: &SkeletonGraph) -> GraphResult<Vec<VertexId>> {
    let mut order = Vec::new();
    for soma in graph.cells() {
        order.extend(graph.bfs_from(soma)?.into_iter().skip(1));
    }
    Ok(order)
}

/// Incoming segment of `v` with its parent, `None` for somata and root vertices.
fn incoming_segment(graph: &SkeletonGraph, v: VertexId) -> GraphResult<Option<(EdgeId, VertexId)>> {
    let Some(e) = graph.vertex_checked(v)?.parent else {
        return Ok(None);
    };
    let edge = graph.edge_checked(e)?;
    Ok(edge.is_segment().then_some((e, edge.src)))
}

fn clamp_radii(graph: &mut SkeletonGraph, beta: f64) -> GraphResult<usize> {
    let beta = beta.max(1.0);
    let mut clamped = 0;
    for v in neurite_order(graph)? {
        let Some((_, u)) = incoming_segment(graph, v)? else { continue };
        let r_u = graph.vertex_checked(u)?.radius;
        let vertex = graph.vertex_mut_checked(v)?;
        let r = vertex.radius.clamp(r_u / beta, r_u * beta);
        if r != vertex.radius {
            vertex.radius = r;
            clamped += 1;
        }
    }
    Ok(clamped)
}

fn remove_short_segments(graph: &mut SkeletonGraph, alpha: f64) -> GraphResult<usize> {
    let mut removed = 0;
    for v in neurite_order(graph)? {
        let Some(vertex) = graph.vertex(v) else { continue };
        if vertex.children.len() != 1 {
            continue;
        }
        let (r_v, p_v) = (vertex.radius, vertex.position);
        let Some((_, u)) = incoming_segment(graph, v)? else { continue };
        let parent = graph.vertex_checked(u)?;
        if p_v.distance(parent.position) < alpha * r_v.max(parent.radius) {
            graph.remove_interior_vertex(v)?;
            removed += 1;
        }
    }
    Ok(removed)
}

fn split_long_segments(graph: &mut SkeletonGraph, gamma: f64) -> GraphResult<usize> {
    let long: Vec<(EdgeId, usize)> = graph
        .segments()
        .filter_map(|(id, e)| {
            let (a, b) = (graph.vertex(e.src)?, graph.vertex(e.dst)?);
            let limit = gamma * a.radius.min(b.radius);
            let length = a.position.distance(b.position);
            (length > limit).then(|| (id, (length / limit).ceil() as usize))
        })
        .collect();
    let mut inserted = 0;
    for (edge, pieces) in long {
        inserted += graph.subdivide(edge, pieces)?.len();
    }
    Ok(inserted)
}

/// Multiplies every neurite radius by `factor`. Somata keep their radius.
pub fn scale_radii(graph: &mut SkeletonGraph, factor: f64) {
    let neurites: Vec<VertexId> = graph
        .vertices()
        .filter(|(_, v)| v.kind.is_neurite())
        .map(|(id, _)| id)
        .collect();
    for id in neurites {
        if let Some(v) = graph.vertex_mut(id) {
            v.radius *= factor;
        }
    }
}
