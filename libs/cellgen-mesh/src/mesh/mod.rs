//! # Mesh Data Structure
//!
//! Indexed triangle soup with per-vertex and per-face annotations.
//!
//! Faces are counter-clockwise seen from outside. Annotations record which
//! modelling element (soma or neurite path) produced a vertex or face, and
//! for vertices the global OBJ index once the vertex has been flushed to an
//! output file.

use std::collections::{BTreeSet, HashMap};

use cellgen_geometry::{BoundingBox, Vec3};

/// Annotation carried by every vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VertexTag {
    /// Modelling element that created the vertex.
    pub element: u32,
    /// One-based OBJ index once the vertex has been written out.
    pub flushed: Option<u64>,
}

impl VertexTag {
    /// Tag for a fresh vertex of `element`.
    pub fn new(element: u32) -> Self {
        Self { element, flushed: None }
    }
}

/// Annotation carried by every face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FaceTag {
    /// Modelling element that created the face.
    pub element: u32,
}

/// Annotated triangle mesh.
///
/// # Example
///
/// ```rust
/// use cellgen_mesh::{FaceTag, Mesh, VertexTag};
/// use cellgen_geometry::Vec3;
///
/// let mut mesh = Mesh::new();
/// let a = mesh.add_vertex(Vec3::ZERO, VertexTag::new(0));
/// let b = mesh.add_vertex(Vec3::X, VertexTag::new(0));
/// let c = mesh.add_vertex(Vec3::Y, VertexTag::new(0));
/// mesh.add_face([a, b, c], FaceTag { element: 0 });
/// assert_eq!(mesh.boundary_edge_count(), 3);
/// assert!((mesh.face_area(0) - 0.5).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<Vec3>,
    faces: Vec<[u32; 3]>,
    vertex_tags: Vec<VertexTag>,
    face_tags: Vec<FaceTag>,
}

/// Undirected edge key with the smaller index first.
#[inline]
pub fn edge_key(a: u32, b: u32) -> (u32, u32) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

impl Mesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mesh with pre-allocated capacity.
    pub fn with_capacity(vertex_count: usize, face_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            faces: Vec::with_capacity(face_count),
            vertex_tags: Vec::with_capacity(vertex_count),
            face_tags: Vec::with_capacity(face_count),
        }
    }

    /// Number of vertices.
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of faces.
    #[inline]
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Returns true if the mesh has no faces.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Adds a vertex and returns its index.
    pub fn add_vertex(&mut self, position: Vec3, tag: VertexTag) -> u32 {
        let index = self.vertices.len() as u32;
        self.vertices.push(position);
        self.vertex_tags.push(tag);
        index
    }

    /// Adds a face and returns its index.
    pub fn add_face(&mut self, face: [u32; 3], tag: FaceTag) -> usize {
        self.faces.push(face);
        self.face_tags.push(tag);
        self.faces.len() - 1
    }

    /// Vertex positions.
    #[inline]
    pub fn vertices(&self) -> &[Vec3] {
        &self.vertices
    }

    /// Faces.
    #[inline]
    pub fn faces(&self) -> &[[u32; 3]] {
        &self.faces
    }

    /// Vertex position.
    #[inline]
    pub fn vertex(&self, index: u32) -> Vec3 {
        self.vertices[index as usize]
    }

    /// Moves a vertex.
    #[inline]
    pub fn set_vertex(&mut self, index: u32, position: Vec3) {
        self.vertices[index as usize] = position;
    }

    /// Face vertex indices.
    #[inline]
    pub fn face(&self, index: usize) -> [u32; 3] {
        self.faces[index]
    }

    /// Face corner positions.
    #[inline]
    pub fn face_points(&self, index: usize) -> [Vec3; 3] {
        let [a, b, c] = self.faces[index];
        [self.vertex(a), self.vertex(b), self.vertex(c)]
    }

    /// Vertex annotation.
    #[inline]
    pub fn vertex_tag(&self, index: u32) -> VertexTag {
        self.vertex_tags[index as usize]
    }

    /// Mutable vertex annotation.
    #[inline]
    pub fn vertex_tag_mut(&mut self, index: u32) -> &mut VertexTag {
        &mut self.vertex_tags[index as usize]
    }

    /// Face annotation.
    #[inline]
    pub fn face_tag(&self, index: usize) -> FaceTag {
        self.face_tags[index]
    }

    /// Axis-aligned bounding box of all vertices.
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_points(self.vertices.iter().copied())
    }

    /// Bounding box of one face.
    pub fn face_bbox(&self, index: usize) -> BoundingBox {
        BoundingBox::from_points(self.face_points(index))
    }

    /// Face area.
    pub fn face_area(&self, index: usize) -> f64 {
        let [a, b, c] = self.face_points(index);
        0.5 * (b - a).cross(c - a).length()
    }

    /// Unit face normal, zero for degenerate faces.
    pub fn face_normal(&self, index: usize) -> Vec3 {
        let [a, b, c] = self.face_points(index);
        (b - a).cross(c - a).normalize_or_zero()
    }

    /// Face centroid.
    pub fn face_centroid(&self, index: usize) -> Vec3 {
        let [a, b, c] = self.face_points(index);
        (a + b + c) / 3.0
    }

    /// Aspect ratio normalised to 1 for the equilateral triangle.
    ///
    /// Computed as `√3 · l_max² / (4 A)`; degenerate faces yield infinity.
    pub fn aspect_ratio(&self, index: usize) -> f64 {
        triangle_aspect_ratio(self.face_points(index))
    }

    /// Appends all vertices and faces of `other`, returning the index offset.
    pub fn append(&mut self, other: &Mesh) -> u32 {
        let offset = self.vertices.len() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.vertex_tags.extend_from_slice(&other.vertex_tags);
        self.faces
            .extend(other.faces.iter().map(|f| [f[0] + offset, f[1] + offset, f[2] + offset]));
        self.face_tags.extend_from_slice(&other.face_tags);
        offset
    }

    /// Keeps the faces whose `keep` entry is true.
    pub fn retain_faces(&mut self, keep: &[bool]) {
        let mut idx = 0;
        self.faces.retain(|_| {
            idx += 1;
            keep[idx - 1]
        });
        let mut idx = 0;
        self.face_tags.retain(|_| {
            idx += 1;
            keep[idx - 1]
        });
    }

    /// Removes vertices no face references.
    ///
    /// Returns the old-to-new index map (`None` for removed vertices).
    pub fn compact(&mut self) -> Vec<Option<u32>> {
        let mut used = vec![false; self.vertices.len()];
        for f in &self.faces {
            for &v in f {
                used[v as usize] = true;
            }
        }
        let mut remap = vec![None; self.vertices.len()];
        let mut vertices = Vec::with_capacity(self.vertices.len());
        let mut tags = Vec::with_capacity(self.vertices.len());
        for (i, &keep) in used.iter().enumerate() {
            if keep {
                remap[i] = Some(vertices.len() as u32);
                vertices.push(self.vertices[i]);
                tags.push(self.vertex_tags[i]);
            }
        }
        for f in &mut self.faces {
            for v in f.iter_mut() {
                if let Some(n) = remap[*v as usize] {
                    *v = n;
                }
            }
        }
        self.vertices = vertices;
        self.vertex_tags = tags;
        remap
    }

    /// Splits the edge `{a, b}` at its midpoint in every adjacent face.
    ///
    /// Returns the new vertex, which inherits the annotation of `a`.
    pub fn split_edge(&mut self, a: u32, b: u32) -> u32 {
        self.split_edges(&[(a, b)])[0]
    }

    /// Splits every listed undirected edge at its midpoint.
    ///
    /// Edges are processed in order; an edge that no longer exists (because
    /// it was listed twice) still receives a vertex but touches no face.
    /// Returns the new vertex of each edge.
    pub fn split_edges(&mut self, edges: &[(u32, u32)]) -> Vec<u32> {
        let mut adjacency = self.edge_faces();
        let mut created = Vec::with_capacity(edges.len());
        for &(a, b) in edges {
            let mid = (self.vertex(a) + self.vertex(b)) * 0.5;
            let m = self.add_vertex(mid, self.vertex_tag(a));
            created.push(m);
            let Some(incident) = adjacency.remove(&edge_key(a, b)) else {
                continue;
            };
            for fi in incident {
                let f = self.faces[fi];
                let Some(k) = (0..3).find(|&k| edge_key(f[k], f[(k + 1) % 3]) == edge_key(a, b)) else {
                    continue;
                };
                let (u, v, w) = (f[k], f[(k + 1) % 3], f[(k + 2) % 3]);
                self.faces[fi] = [u, m, w];
                let tag = self.face_tags[fi];
                let nf = self.add_face([m, v, w], tag);

                if let Some(list) = adjacency.get_mut(&edge_key(v, w)) {
                    for g in list.iter_mut() {
                        if *g == fi {
                            *g = nf;
                        }
                    }
                }
                adjacency.entry(edge_key(u, m)).or_default().push(fi);
                adjacency.entry(edge_key(m, v)).or_default().push(nf);
                let mw = adjacency.entry(edge_key(m, w)).or_default();
                mw.push(fi);
                mw.push(nf);
            }
        }
        created
    }

    /// Map from directed edge `(a, b)` to the face containing it.
    ///
    /// For non-manifold input the last face wins.
    pub fn directed_edges(&self) -> HashMap<(u32, u32), usize> {
        let mut map = HashMap::with_capacity(self.faces.len() * 3);
        for (fi, f) in self.faces.iter().enumerate() {
            for k in 0..3 {
                map.insert((f[k], f[(k + 1) % 3]), fi);
            }
        }
        map
    }

    /// Map from undirected edge to its incident faces.
    pub fn edge_faces(&self) -> HashMap<(u32, u32), Vec<usize>> {
        let mut map: HashMap<(u32, u32), Vec<usize>> = HashMap::with_capacity(self.faces.len() * 3 / 2);
        for (fi, f) in self.faces.iter().enumerate() {
            for k in 0..3 {
                map.entry(edge_key(f[k], f[(k + 1) % 3])).or_default().push(fi);
            }
        }
        map
    }

    /// Faces incident to each vertex.
    pub fn vertex_faces(&self) -> Vec<Vec<usize>> {
        let mut vf = vec![Vec::new(); self.vertices.len()];
        for (fi, f) in self.faces.iter().enumerate() {
            for &v in f {
                vf[v as usize].push(fi);
            }
        }
        vf
    }

    /// Sorted one-ring neighbours of each vertex.
    pub fn vertex_neighbors(&self) -> Vec<Vec<u32>> {
        let mut sets = vec![BTreeSet::new(); self.vertices.len()];
        for f in &self.faces {
            for k in 0..3 {
                let (a, b) = (f[k], f[(k + 1) % 3]);
                sets[a as usize].insert(b);
                sets[b as usize].insert(a);
            }
        }
        sets.into_iter().map(|s| s.into_iter().collect()).collect()
    }

    /// Number of undirected edges with exactly one incident face.
    pub fn boundary_edge_count(&self) -> usize {
        self.edge_faces().values().filter(|f| f.len() == 1).count()
    }

    /// Checks that the mesh is a closed, consistently oriented 2-manifold.
    ///
    /// Every directed edge must occur once with its twin present, and the
    /// faces around every vertex must form a single fan.
    pub fn is_closed_manifold(&self) -> bool {
        let mut directed: HashMap<(u32, u32), u32> = HashMap::with_capacity(self.faces.len() * 3);
        for f in &self.faces {
            if f[0] == f[1] || f[1] == f[2] || f[2] == f[0] {
                return false;
            }
            for k in 0..3 {
                *directed.entry((f[k], f[(k + 1) % 3])).or_default() += 1;
            }
        }
        if directed
            .iter()
            .any(|(&(a, b), &n)| n != 1 || directed.get(&(b, a)) != Some(&1))
        {
            return false;
        }

        // Link of every vertex must be one cycle.
        let mut links: HashMap<u32, HashMap<u32, u32>> = HashMap::new();
        for f in &self.faces {
            for k in 0..3 {
                let (v, a, b) = (f[k], f[(k + 1) % 3], f[(k + 2) % 3]);
                links.entry(v).or_default().insert(a, b);
            }
        }
        links.values().all(|link| {
            let Some(&start) = link.keys().next() else {
                return false;
            };
            let mut cur = start;
            let mut steps = 0;
            loop {
                match link.get(&cur) {
                    Some(&next) => cur = next,
                    None => return false,
                }
                steps += 1;
                if cur == start {
                    return steps == link.len();
                }
                if steps > link.len() {
                    return false;
                }
            }
        })
    }

    /// Euler characteristic `V - E + F` over referenced vertices.
    pub fn euler_characteristic(&self) -> i64 {
        let mut used = vec![false; self.vertices.len()];
        for f in &self.faces {
            for &v in f {
                used[v as usize] = true;
            }
        }
        let v = used.iter().filter(|u| **u).count() as i64;
        let e = self.edge_faces().len() as i64;
        v - e + self.faces.len() as i64
    }

    /// Mean face area, zero for an empty mesh.
    pub fn mean_face_area(&self) -> f64 {
        if self.faces.is_empty() {
            return 0.0;
        }
        (0..self.faces.len()).map(|f| self.face_area(f)).sum::<f64>() / self.faces.len() as f64
    }
}

/// Aspect ratio of a triangle, 1 for the equilateral triangle.
pub fn triangle_aspect_ratio([a, b, c]: [Vec3; 3]) -> f64 {
    let area2 = (b - a).cross(c - a).length();
    let longest = a
        .distance_squared(b)
        .max(b.distance_squared(c))
        .max(c.distance_squared(a));
    if area2 <= f64::EPSILON * longest {
        return f64::INFINITY;
    }
    3.0_f64.sqrt() * longest / (2.0 * area2)
}

#[cfg(test)]
mod tests;
