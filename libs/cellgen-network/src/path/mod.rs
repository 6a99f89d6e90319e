//! # Neurite Paths
//!
//! A neurite path is a chain of consecutive segments that is modelled by one
//! smooth tube. Paths of a cell form a tree: every path except the root
//! paths is attached to a vertex of its parent path.
//!
//! Geometry (parameters and canal surfaces) is attached by the
//! parametrizer. The bounding box over the magnified surfaces is computed on
//! first use and dropped whenever the path changes.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::OnceLock;

use cellgen_geometry::{BoundingBox, CanalSurface};

use crate::graph::{EdgeId, VertexId};

/// Path handle, index into [`Partition::paths`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PathId(pub u32);

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Where a child path leaves its parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment {
    /// Parent path.
    pub parent: PathId,
    /// Index of the branch vertex inside the parent path.
    pub vertex_index: usize,
}

/// Chain of segments modelled by one tube.
///
/// # Example
///
/// ```rust
/// use cellgen_network::graph::{EdgeId, VertexId};
/// use cellgen_network::path::{NeuritePath, PathId};
///
/// let mut path = NeuritePath::new(PathId(0), VertexId(0), VertexId(1), None);
/// assert!(path.is_root_path());
/// path.extend(EdgeId(1), VertexId(2));
/// path.extend(EdgeId(2), VertexId(3));
/// assert_eq!(path.num_edges(), 2);
/// assert_eq!(path.num_vertices(), path.num_edges() + 1);
/// ```
#[derive(Debug, Clone)]
pub struct NeuritePath {
    id: PathId,
    soma: VertexId,
    vertices: Vec<VertexId>,
    edges: Vec<EdgeId>,
    attachment: Option<Attachment>,
    parameters: Vec<f64>,
    chord_length: f64,
    scale_factor: f64,
    surfaces: Vec<CanalSurface>,
    magnified: Vec<CanalSurface>,
    geometry_updated: bool,
    degenerate: bool,
    bbox: OnceLock<BoundingBox>,
}

impl NeuritePath {
    /// Starts an empty path at `start`.
    ///
    /// Paths without attachment are root paths.
    pub fn new(id: PathId, soma: VertexId, start: VertexId, attachment: Option<Attachment>) -> Self {
        Self {
            id,
            soma,
            vertices: vec![start],
            edges: Vec::new(),
            attachment,
            parameters: Vec::new(),
            chord_length: 0.0,
            scale_factor: 1.0,
            surfaces: Vec::new(),
            magnified: Vec::new(),
            geometry_updated: false,
            degenerate: false,
            bbox: OnceLock::new(),
        }
    }

    /// Appends a segment ending in `dst`. Invalidates the geometry.
    pub fn extend(&mut self, edge: EdgeId, dst: VertexId) {
        self.edges.push(edge);
        self.vertices.push(dst);
        self.invalidate_geometry();
    }

    /// Id.
    pub fn id(&self) -> PathId {
        self.id
    }

    /// Soma of the cell.
    pub fn soma(&self) -> VertexId {
        self.soma
    }

    /// Returns true if the path starts at a neurite root vertex.
    pub fn is_root_path(&self) -> bool {
        self.attachment.is_none()
    }

    /// Attachment to the parent path.
    pub fn attachment(&self) -> Option<Attachment> {
        self.attachment
    }

    /// First vertex.
    pub fn start(&self) -> VertexId {
        self.vertices[0]
    }

    /// Vertices in order, one more than edges.
    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    /// Segment edges in order.
    pub fn edges(&self) -> &[EdgeId] {
        &self.edges
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Number of segments.
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Per-vertex parameters, empty until parametrized.
    pub fn parameters(&self) -> &[f64] {
        &self.parameters
    }

    /// Sum of the segment lengths.
    pub fn chord_length(&self) -> f64 {
        self.chord_length
    }

    /// Arc length per parameter unit.
    pub fn scale_factor(&self) -> f64 {
        self.scale_factor
    }

    /// Per-segment canal surfaces, empty until parametrized.
    pub fn surfaces(&self) -> &[CanalSurface] {
        &self.surfaces
    }

    /// Per-segment magnified canal surfaces.
    pub fn magnified(&self) -> &[CanalSurface] {
        &self.magnified
    }

    /// Returns true once geometry matching the current segments is attached.
    pub fn geometry_updated(&self) -> bool {
        self.geometry_updated
    }

    /// Returns true if the vertices admit no parametrization.
    ///
    /// Degenerate paths carry no geometry; their segments are reported as
    /// anomalies instead of being analysed or meshed.
    pub fn is_degenerate(&self) -> bool {
        self.degenerate
    }

    /// Drops the geometry and marks the path degenerate.
    pub fn mark_degenerate(&mut self) {
        self.invalidate_geometry();
        self.degenerate = true;
    }

    /// Arc length of segment `k` according to the parametrization.
    pub fn segment_arc_length(&self, k: usize) -> f64 {
        match (self.parameters.get(k), self.parameters.get(k + 1)) {
            (Some(a), Some(b)) => (b - a) * self.scale_factor,
            _ => 0.0,
        }
    }

    /// Drops parameters, surfaces, the degenerate mark and the cached
    /// bounding box.
    pub fn invalidate_geometry(&mut self) {
        self.parameters.clear();
        self.surfaces.clear();
        self.magnified.clear();
        self.geometry_updated = false;
        self.degenerate = false;
        self.bbox = OnceLock::new();
    }

    /// Attaches new geometry.
    ///
    /// The previous geometry and bounding box are dropped first.
    pub fn update_geometry(
        &mut self,
        parameters: Vec<f64>,
        chord_length: f64,
        scale_factor: f64,
        surfaces: Vec<CanalSurface>,
    ) {
        self.invalidate_geometry();
        self.magnified = surfaces.iter().map(CanalSurface::magnified).collect();
        self.parameters = parameters;
        self.chord_length = chord_length;
        self.scale_factor = scale_factor;
        self.surfaces = surfaces;
        self.geometry_updated = self.surfaces.len() == self.edges.len();
    }

    /// Box around the magnified surfaces, `None` without geometry.
    pub fn bounding_box(&self) -> Option<BoundingBox> {
        if !self.geometry_updated {
            return None;
        }
        Some(*self.bbox.get_or_init(|| {
            self.magnified
                .iter()
                .fold(BoundingBox::empty(), |acc, s| acc.union(&s.bounding_box()))
        }))
    }

    /// Returns true if the bounding box is currently cached.
    pub fn bounding_box_cached(&self) -> bool {
        self.bbox.get().is_some()
    }
}

/// Paths of one cell with their parent/child links.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathTree {
    /// Soma of the cell.
    pub soma: Option<VertexId>,
    /// Root paths in creation order.
    pub roots: Vec<PathId>,
    /// Child paths by parent, in creation order.
    pub children: HashMap<PathId, Vec<PathId>>,
}

impl PathTree {
    /// Creates an empty tree for `soma`.
    pub fn new(soma: VertexId) -> Self {
        Self {
            soma: Some(soma),
            ..Self::default()
        }
    }

    /// Root paths first, then children breadth first.
    pub fn bfs(&self) -> Vec<PathId> {
        let mut order = Vec::new();
        let mut queue: VecDeque<PathId> = self.roots.iter().copied().collect();
        while let Some(p) = queue.pop_front() {
            order.push(p);
            if let Some(children) = self.children.get(&p) {
                queue.extend(children.iter().copied());
            }
        }
        order
    }
}

/// All paths of a network and their trees, one per cell.
#[derive(Debug, Clone, Default)]
pub struct Partition {
    /// Paths indexed by [`PathId`].
    pub paths: Vec<NeuritePath>,
    /// One tree per soma, in soma id order.
    pub trees: Vec<PathTree>,
}

impl Partition {
    /// Path by id.
    pub fn path(&self, id: PathId) -> Option<&NeuritePath> {
        self.paths.get(id.0 as usize)
    }

    /// Mutable path by id.
    pub fn path_mut(&mut self, id: PathId) -> Option<&mut NeuritePath> {
        self.paths.get_mut(id.0 as usize)
    }

    /// Number of paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns true without paths.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[cfg(test)]
mod tests;
