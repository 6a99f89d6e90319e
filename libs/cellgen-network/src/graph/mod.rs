//! # Skeleton Graph
//!
//! Forest of neuron cells. Every cell is rooted in a soma vertex; neurite
//! vertices hang below it through exactly one parent edge each.
//!
//! ```text
//! soma ──RootEdge──▶ neurite root ──Segment──▶ v ──Segment──▶ …
//!                                   └─Segment──▶ w …
//! ```
//!
//! Vertices and edges live in arenas addressed by [`VertexId`] and
//! [`EdgeId`]. Removal leaves a tombstone so ids stay stable during
//! preconditioning.

use std::collections::VecDeque;
use std::fmt;

use cellgen_geometry::{CanalSurface, Vec3};

use crate::analysis::status::IntersectionStatus;
use crate::error::{GraphError, GraphResult};
use crate::path::PathId;

/// Vertex handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VertexId(pub u32);

/// Edge handle. Ids grow with insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Kind of a skeleton vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexKind {
    /// Cell body, modelled as a sphere.
    Soma,
    /// Axonal sample.
    Axon,
    /// Dendritic sample (basal, apical or unclassified).
    Dendrite,
}

impl VertexKind {
    /// Returns true for axon and dendrite samples.
    pub fn is_neurite(self) -> bool {
        !matches!(self, VertexKind::Soma)
    }
}

/// Skeleton vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    /// Centre.
    pub position: Vec3,
    /// Radius, `> 0`.
    pub radius: f64,
    /// Kind.
    pub kind: VertexKind,
    /// Incoming edge, `None` for somata.
    pub parent: Option<EdgeId>,
    /// Outgoing edges in insertion order.
    pub children: Vec<EdgeId>,
}

/// Payload of the edge joining a soma to a neurite root vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootEdgeInfo {
    /// Soma radius minus the distance of the root vertex to the soma centre.
    /// Positive when the root vertex lies inside the soma.
    pub depth: f64,
}

/// Payload of a neurite segment.
#[derive(Debug, Clone, PartialEq)]
pub struct SegmentInfo {
    /// Largest radius at the source vertex and its neurite neighbours.
    pub src_rmax_nb: f64,
    /// Largest radius at the destination vertex and its neurite neighbours.
    pub dst_rmax_nb: f64,
    /// Owning path, set by the partitioner.
    pub path: Option<PathId>,
    /// Position of the segment inside its path.
    pub index_in_path: usize,
    /// Modelling surface, set by the parametrizer.
    pub surface: Option<CanalSurface>,
    /// Conservative hull of `surface`.
    pub magnified: Option<CanalSurface>,
    /// Analysis result.
    pub status: IntersectionStatus,
}

impl SegmentInfo {
    fn new() -> Self {
        Self {
            src_rmax_nb: 0.0,
            dst_rmax_nb: 0.0,
            path: None,
            index_in_path: 0,
            surface: None,
            magnified: None,
            status: IntersectionStatus::default(),
        }
    }

    /// Drops path membership, geometry and analysis results.
    pub fn clear(&mut self) {
        self.path = None;
        self.index_in_path = 0;
        self.surface = None;
        self.magnified = None;
        self.status.reset();
    }
}

/// Edge variant.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeKind {
    /// Soma to neurite root vertex.
    RootEdge(RootEdgeInfo),
    /// Neurite to neurite.
    Segment(Box<SegmentInfo>),
}

/// Directed skeleton edge, parent to child.
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    /// Parent vertex.
    pub src: VertexId,
    /// Child vertex.
    pub dst: VertexId,
    /// Variant payload.
    pub kind: EdgeKind,
}

impl Edge {
    /// Segment payload, `None` for root edges.
    pub fn segment(&self) -> Option<&SegmentInfo> {
        match &self.kind {
            EdgeKind::Segment(info) => Some(info),
            EdgeKind::RootEdge(_) => None,
        }
    }

    /// Mutable segment payload.
    pub fn segment_mut(&mut self) -> Option<&mut SegmentInfo> {
        match &mut self.kind {
            EdgeKind::Segment(info) => Some(info),
            EdgeKind::RootEdge(_) => None,
        }
    }

    /// Returns true for neurite segments.
    pub fn is_segment(&self) -> bool {
        matches!(self.kind, EdgeKind::Segment(_))
    }
}

/// Arena of vertices and edges.
///
/// # Example
///
/// ```rust
/// use cellgen_geometry::Vec3;
/// use cellgen_network::graph::{SkeletonGraph, VertexKind};
///
/// let mut g = SkeletonGraph::new();
/// let soma = g.add_vertex(Vec3::ZERO, 5.0, VertexKind::Soma);
/// let root = g.add_vertex(Vec3::new(4.0, 0.0, 0.0), 1.0, VertexKind::Dendrite);
/// let tip = g.add_vertex(Vec3::new(20.0, 0.0, 0.0), 1.0, VertexKind::Dendrite);
/// g.add_edge(soma, root).unwrap();
/// g.add_edge(root, tip).unwrap();
/// assert!(g.validate().is_ok());
/// assert_eq!(g.cells(), vec![soma]);
/// assert_eq!(g.segment_count(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SkeletonGraph {
    vertices: Vec<Option<Vertex>>,
    edges: Vec<Option<Edge>>,
}

impl SkeletonGraph {
    /// Creates an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a vertex without edges.
    pub fn add_vertex(&mut self, position: Vec3, radius: f64, kind: VertexKind) -> VertexId {
        let id = VertexId(self.vertices.len() as u32);
        self.vertices.push(Some(Vertex {
            position,
            radius,
            kind,
            parent: None,
            children: Vec::new(),
        }));
        id
    }

    /// Connects `parent` to `child`.
    ///
    /// The edge kind follows from the end points: soma parents give root
    /// edges, neurite parents give segments.
    pub fn add_edge(&mut self, parent: VertexId, child: VertexId) -> GraphResult<EdgeId> {
        if parent == child {
            return Err(GraphError::SelfLoop(child));
        }
        let src = self.vertex_checked(parent)?;
        let (src_kind, src_pos, src_radius) = (src.kind, src.position, src.radius);
        let dst = self.vertex_checked(child)?;
        if !dst.kind.is_neurite() {
            return Err(GraphError::SomaWithParent(child));
        }
        if dst.parent.is_some() {
            return Err(GraphError::MultipleParents(child));
        }
        let kind = match src_kind {
            VertexKind::Soma => EdgeKind::RootEdge(RootEdgeInfo {
                depth: src_radius - src_pos.distance(dst.position),
            }),
            _ => EdgeKind::Segment(Box::new(SegmentInfo::new())),
        };
        let id = EdgeId(self.edges.len() as u32);
        self.edges.push(Some(Edge {
            src: parent,
            dst: child,
            kind,
        }));
        self.vertex_mut_checked(child)?.parent = Some(id);
        self.vertex_mut_checked(parent)?.children.push(id);
        Ok(id)
    }

    /// Vertex by id, `None` if unknown or removed.
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Mutable vertex by id.
    pub fn vertex_mut(&mut self, id: VertexId) -> Option<&mut Vertex> {
        self.vertices.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    /// Edge by id, `None` if unknown or removed.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.0 as usize).and_then(Option::as_ref)
    }

    /// Mutable edge by id.
    pub fn edge_mut(&mut self, id: EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(id.0 as usize).and_then(Option::as_mut)
    }

    /// Vertex by id or [`GraphError::UnknownVertex`].
    pub fn vertex_checked(&self, id: VertexId) -> GraphResult<&Vertex> {
        self.vertex(id).ok_or(GraphError::UnknownVertex(id))
    }

    /// Mutable vertex by id or [`GraphError::UnknownVertex`].
    pub fn vertex_mut_checked(&mut self, id: VertexId) -> GraphResult<&mut Vertex> {
        self.vertex_mut(id).ok_or(GraphError::UnknownVertex(id))
    }

    /// Edge by id or [`GraphError::UnknownEdge`].
    pub fn edge_checked(&self, id: EdgeId) -> GraphResult<&Edge> {
        self.edge(id).ok_or(GraphError::UnknownEdge(id))
    }

    /// Segment payload by id, failing for unknown ids and root edges.
    pub fn segment_checked(&self, id: EdgeId) -> GraphResult<&SegmentInfo> {
        self.edge_checked(id)?.segment().ok_or(GraphError::KindMismatch(id))
    }

    /// Mutable segment payload by id.
    pub fn segment_mut_checked(&mut self, id: EdgeId) -> GraphResult<&mut SegmentInfo> {
        self.edge_mut(id)
            .ok_or(GraphError::UnknownEdge(id))?
            .segment_mut()
            .ok_or(GraphError::KindMismatch(id))
    }

    /// Live vertices in id order.
    pub fn vertices(&self) -> impl Iterator<Item = (VertexId, &Vertex)> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (VertexId(i as u32), v)))
    }

    /// Live edges in id order.
    pub fn edges(&self) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.edges
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (EdgeId(i as u32), e)))
    }

    /// Live segment edges in id order.
    pub fn segments(&self) -> impl Iterator<Item = (EdgeId, &Edge)> + '_ {
        self.edges().filter(|(_, e)| e.is_segment())
    }

    /// Number of live vertices.
    pub fn vertex_count(&self) -> usize {
        self.vertices().count()
    }

    /// Number of live segment edges.
    pub fn segment_count(&self) -> usize {
        self.segments().count()
    }

    /// Soma vertices, one per cell, in id order.
    pub fn cells(&self) -> Vec<VertexId> {
        self.vertices()
            .filter(|(_, v)| v.kind == VertexKind::Soma)
            .map(|(id, _)| id)
            .collect()
    }

    /// Child vertices of `id` in edge order.
    pub fn child_vertices(&self, id: VertexId) -> GraphResult<Vec<VertexId>> {
        self.vertex_checked(id)?
            .children
            .iter()
            .map(|&e| self.edge_checked(e).map(|e| e.dst))
            .collect()
    }

    /// Parent vertex of `id`, `None` for somata.
    pub fn parent_vertex(&self, id: VertexId) -> GraphResult<Option<VertexId>> {
        match self.vertex_checked(id)?.parent {
            Some(e) => Ok(Some(self.edge_checked(e)?.src)),
            None => Ok(None),
        }
    }

    /// Returns true if `id` is the child of a root edge.
    pub fn is_neurite_root(&self, id: VertexId) -> GraphResult<bool> {
        match self.vertex_checked(id)?.parent {
            Some(e) => Ok(!self.edge_checked(e)?.is_segment()),
            None => Ok(false),
        }
    }

    /// Soma of the cell containing `id`.
    pub fn soma_of(&self, id: VertexId) -> GraphResult<VertexId> {
        let mut current = id;
        for _ in 0..=self.vertices.len() {
            match self.parent_vertex(current)? {
                Some(p) => current = p,
                None => {
                    return if self.vertex_checked(current)?.kind == VertexKind::Soma {
                        Ok(current)
                    } else {
                        Err(GraphError::Unreachable(id))
                    };
                }
            }
        }
        Err(GraphError::Unreachable(id))
    }

    /// Checks the structural invariants.
    ///
    /// - at least one soma
    /// - radii strictly positive and finite
    /// - somata have no parent, neurite vertices exactly one
    /// - root edges start in a soma, segments join two neurite vertices
    /// - every neurite vertex is reachable from a soma
    pub fn validate(&self) -> GraphResult<()> {
        let somata = self.cells();
        if somata.is_empty() {
            return Err(GraphError::NoSoma);
        }
        for (id, v) in self.vertices() {
            if !(v.radius > 0.0 && v.radius.is_finite()) {
                return Err(GraphError::InvalidRadius { vertex: id, radius: v.radius });
            }
            match (v.kind, v.parent) {
                (VertexKind::Soma, Some(_)) => return Err(GraphError::SomaWithParent(id)),
                (VertexKind::Axon | VertexKind::Dendrite, None) => return Err(GraphError::MissingParent(id)),
                _ => {}
            }
        }
        for (id, e) in self.edges() {
            let src = self.vertex_checked(e.src)?;
            let dst = self.vertex_checked(e.dst)?;
            let consistent = match e.kind {
                EdgeKind::RootEdge(_) => src.kind == VertexKind::Soma && dst.kind.is_neurite(),
                EdgeKind::Segment(_) => src.kind.is_neurite() && dst.kind.is_neurite(),
            };
            if !consistent || dst.parent != Some(id) || !src.children.contains(&id) {
                return Err(GraphError::KindMismatch(id));
            }
        }

        let mut reached = vec![false; self.vertices.len()];
        let mut queue: VecDeque<VertexId> = somata.into_iter().collect();
        while let Some(v) = queue.pop_front() {
            if std::mem::replace(&mut reached[v.0 as usize], true) {
                return Err(GraphError::MultipleParents(v));
            }
            queue.extend(self.child_vertices(v)?);
        }
        match self.vertices().find(|(id, _)| !reached[id.0 as usize]) {
            Some((id, _)) => Err(GraphError::Unreachable(id)),
            None => Ok(()),
        }
    }

    /// Vertices of the cell of `soma` in breadth-first order, soma first.
    pub fn bfs_from(&self, soma: VertexId) -> GraphResult<Vec<VertexId>> {
        let mut order = Vec::new();
        let mut queue = VecDeque::from([soma]);
        while let Some(v) = queue.pop_front() {
            order.push(v);
            queue.extend(self.child_vertices(v)?);
        }
        Ok(order)
    }

    /// Removes an interior neurite vertex, re-parenting its only child.
    ///
    /// The incoming edge is kept and now ends in the former grandchild; the
    /// outgoing edge is removed.
    pub fn remove_interior_vertex(&mut self, id: VertexId) -> GraphResult<()> {
        let v = self.vertex_checked(id)?;
        let (Some(incoming), [outgoing]) = (v.parent, v.children.as_slice()) else {
            return Err(GraphError::NotInterior(id));
        };
        let outgoing = *outgoing;
        if !v.kind.is_neurite() || !self.edge_checked(incoming)?.is_segment() {
            return Err(GraphError::NotInterior(id));
        }
        let child = self.edge_checked(outgoing)?.dst;
        if let Some(e) = self.edge_mut(incoming) {
            e.dst = child;
        }
        self.vertex_mut_checked(child)?.parent = Some(incoming);
        self.edges[outgoing.0 as usize] = None;
        self.vertices[id.0 as usize] = None;
        Ok(())
    }

    /// Splits a segment into `pieces` parts of equal length.
    ///
    /// Inserted vertices interpolate position and radius linearly and
    /// inherit the kind of the segment's child. Returns the new vertices in
    /// order from parent to child.
    pub fn subdivide(&mut self, edge: EdgeId, pieces: usize) -> GraphResult<Vec<VertexId>> {
        let e = self.edge_checked(edge)?;
        if !e.is_segment() {
            return Err(GraphError::KindMismatch(edge));
        }
        let (src, dst) = (e.src, e.dst);
        if pieces < 2 {
            return Ok(Vec::new());
        }
        let a = self.vertex_checked(src)?.clone();
        let b = self.vertex_checked(dst)?.clone();

        let inserted: Vec<VertexId> = (1..pieces)
            .map(|k| {
                let t = k as f64 / pieces as f64;
                self.add_vertex(a.position.lerp(b.position, t), a.radius + (b.radius - a.radius) * t, b.kind)
            })
            .collect();

        // first piece reuses the original edge
        if let Some(e) = self.edge_mut(edge) {
            e.dst = inserted[0];
        }
        self.vertex_mut_checked(inserted[0])?.parent = Some(edge);
        self.vertex_mut_checked(dst)?.parent = None;
        for pair in inserted.windows(2) {
            self.add_edge(pair[0], pair[1])?;
        }
        if let Some(&last) = inserted.last() {
            self.add_edge(last, dst)?;
        }
        Ok(inserted)
    }

    /// Recomputes `src_rmax_nb` and `dst_rmax_nb` of every segment.
    pub fn update_rmax_nb(&mut self) -> GraphResult<()> {
        let segments: Vec<(EdgeId, VertexId, VertexId)> =
            self.segments().map(|(id, e)| (id, e.src, e.dst)).collect();
        for (id, src, dst) in segments {
            let src_r = self.neighbourhood_max_radius(src)?;
            let dst_r = self.neighbourhood_max_radius(dst)?;
            let info = self.segment_mut_checked(id)?;
            info.src_rmax_nb = src_r;
            info.dst_rmax_nb = dst_r;
        }
        Ok(())
    }

    /// Largest radius over `id` and its neurite neighbours.
    fn neighbourhood_max_radius(&self, id: VertexId) -> GraphResult<f64> {
        let v = self.vertex_checked(id)?;
        let mut r = v.radius;
        let neighbours = self.parent_vertex(id)?.into_iter().chain(self.child_vertices(id)?);
        for n in neighbours {
            let w = self.vertex_checked(n)?;
            if w.kind.is_neurite() {
                r = r.max(w.radius);
            }
        }
        Ok(r)
    }

    /// Drops path membership, geometry and analysis results of all segments.
    pub fn clear_segments(&mut self) {
        for e in self.edges.iter_mut().flatten() {
            if let Some(info) = e.segment_mut() {
                info.clear();
            }
        }
    }
}

#[cfg(test)]
mod tests;
