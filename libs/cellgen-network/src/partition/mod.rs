//! # Path Partitioning
//!
//! Decomposes every cell into neurite paths. Each child of a neurite root
//! vertex starts a root path; a path is extended segment by segment and the
//! strategy decides at every vertex which child (if any) continues it. All
//! other children start new paths attached at that vertex. Pending paths are
//! processed first in, first out, so path ids follow a breadth-first order.
//!
//! | Strategy | Continuation |
//! |----------|--------------|
//! | `SimpleNeuritePaths` | the only child, none at branch vertices |
//! | `MinAngle` | filtered child with the smallest turning angle |
//! | `MaxChordalDepth` | filtered child with the deepest subtree |
//!
//! Ties are broken by the lower edge id.

use std::collections::{HashMap, VecDeque};

use cellgen_geometry::vec3::angle_between;
use config::settings::{PartitionFilter, PartitionStrategy};
use tracing::{debug, warn};

use crate::error::GraphResult;
use crate::graph::{EdgeId, SkeletonGraph, VertexId};
use crate::path::{Attachment, NeuritePath, Partition, PathId, PathTree};

struct Pending {
    start: VertexId,
    edge: EdgeId,
    attachment: Option<Attachment>,
}

/// Partitions the network into neurite paths.
///
/// Any previous partition is discarded: path membership, geometry and
/// intersection status of every segment are reset.
///
/// # Errors
///
/// [`GraphError`](crate::error::GraphError) if the graph is inconsistent.
pub fn partition(graph: &mut SkeletonGraph, strategy: &PartitionStrategy) -> GraphResult<Partition> {
    graph.validate()?;
    graph.clear_segments();
    graph.update_rmax_nb()?;

    let mut result = Partition::default();
    let mut depths = HashMap::new();
    for soma in graph.cells() {
        let mut tree = PathTree::new(soma);
        let mut queue = VecDeque::new();
        for root in graph.child_vertices(soma)? {
            let edges = &graph.vertex_checked(root)?.children;
            if edges.is_empty() {
                warn!(vertex = %root, "neurite root vertex without segments is ignored");
            }
            queue.extend(edges.iter().map(|&edge| Pending {
                start: root,
                edge,
                attachment: None,
            }));
        }

        while let Some(pending) = queue.pop_front() {
            let id = PathId(result.paths.len() as u32);
            let path = grow_path(graph, strategy, id, soma, pending, &mut queue, &mut depths)?;
            match path.attachment() {
                Some(a) => tree.children.entry(a.parent).or_default().push(id),
                None => tree.roots.push(id),
            }
            for (k, &edge) in path.edges().iter().enumerate() {
                let info = graph.segment_mut_checked(edge)?;
                info.path = Some(id);
                info.index_in_path = k;
            }
            result.paths.push(path);
        }
        result.trees.push(tree);
    }

    debug!(
        strategy = strategy.name(),
        paths = result.paths.len(),
        cells = result.trees.len(),
        "network partitioned"
    );
    Ok(result)
}

fn grow_path(
    graph: &SkeletonGraph,
    strategy: &PartitionStrategy,
    id: PathId,
    soma: VertexId,
    pending: Pending,
    queue: &mut VecDeque<Pending>,
    depths: &mut HashMap<VertexId, f64>,
) -> GraphResult<NeuritePath> {
    let mut path = NeuritePath::new(id, soma, pending.start, pending.attachment);
    let mut prev = pending.start;
    let mut edge = pending.edge;
    loop {
        let cur = graph.edge_checked(edge)?.dst;
        path.extend(edge, cur);
        let mut children = graph.vertex_checked(cur)?.children.clone();
        if children.is_empty() {
            return Ok(path);
        }
        children.sort_unstable();
        let next = continuation(graph, strategy, prev, cur, &children, depths)?;
        let attachment = Attachment {
            parent: id,
            vertex_index: path.num_vertices() - 1,
        };
        queue.extend(children.iter().filter(|&&c| Some(c) != next).map(|&c| Pending {
            start: cur,
            edge: c,
            attachment: Some(attachment),
        }));
        match next {
            Some(e) => {
                prev = cur;
                edge = e;
            }
            None => return Ok(path),
        }
    }
}

/// Child edge continuing the path through `cur`, `children` sorted by id.
fn continuation(
    graph: &SkeletonGraph,
    strategy: &PartitionStrategy,
    prev: VertexId,
    cur: VertexId,
    children: &[EdgeId],
    depths: &mut HashMap<VertexId, f64>,
) -> GraphResult<Option<EdgeId>> {
    let filter = match strategy {
        PartitionStrategy::SimpleNeuritePaths => {
            return Ok(match children {
                [only] => Some(*only),
                _ => None,
            });
        }
        PartitionStrategy::MinAngle(f) | PartitionStrategy::MaxChordalDepth(f) => f,
    };

    let p_prev = graph.vertex_checked(prev)?.position;
    let v_cur = graph.vertex_checked(cur)?;
    let incoming = v_cur.position - p_prev;

    let mut best: Option<(EdgeId, f64)> = None;
    for &edge in children {
        let dst = graph.edge_checked(edge)?.dst;
        let child = graph.vertex_checked(dst)?;
        let angle = angle_between(incoming, child.position - v_cur.position);
        if !passes(filter, angle, v_cur.radius, child.radius) {
            continue;
        }
        // lower is better for both scores
        let score = match strategy {
            PartitionStrategy::MaxChordalDepth(_) => -chordal_depth(graph, dst, depths)?,
            _ => angle,
        };
        if best.map_or(true, |(_, s)| score < s) {
            best = Some((edge, score));
        }
    }
    Ok(best.map(|(e, _)| e))
}

fn passes(filter: &PartitionFilter, angle: f64, r_a: f64, r_b: f64) -> bool {
    let ratio = r_a.max(r_b) / r_a.min(r_b);
    angle <= filter.filter_angle && ratio <= filter.filter_radius_ratio
}

/// Largest straight-line distance from `root` to a leaf of its subtree.
pub fn chordal_depth(
    graph: &SkeletonGraph,
    root: VertexId,
    cache: &mut HashMap<VertexId, f64>,
) -> GraphResult<f64> {
    if let Some(&d) = cache.get(&root) {
        return Ok(d);
    }
    let origin = graph.vertex_checked(root)?.position;
    let mut depth: f64 = 0.0;
    let mut stack = vec![root];
    while let Some(v) = stack.pop() {
        let children = graph.child_vertices(v)?;
        if children.is_empty() {
            depth = depth.max(graph.vertex_checked(v)?.position.distance(origin));
        }
        stack.extend(children);
    }
    cache.insert(root, depth);
    Ok(depth)
}
