//! Greedy edge collapse.
//!
//! Bad faces (too elongated, or too small relative to their neighbourhood)
//! are visited worst first and their shortest edge is collapsed to its
//! midpoint when the collapse keeps the surface a manifold, flips no normal,
//! does not worsen the worst aspect ratio around it and changes the local
//! area only by a bounded amount.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet, VecDeque};

use cellgen_geometry::Vec3;
use config::settings::GecParams;
use tracing::debug;

use crate::mesh::{edge_key, triangle_aspect_ratio, Mesh};

/// Counters of one edge collapse pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GecStats {
    /// Faces flagged as bad at the start.
    pub initial_candidates: usize,
    /// Edges collapsed.
    pub collapses: usize,
    /// Collapses rejected by the validity checks.
    pub rejected: usize,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    face: usize,
    stamp: u32,
    badness: f64,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.badness == other.badness
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        // worst face first, ties by lower index
        self.badness
            .total_cmp(&other.badness)
            .then_with(|| other.face.cmp(&self.face))
    }
}

struct Workspace {
    positions: Vec<Vec3>,
    faces: Vec<Option<[u32; 3]>>,
    stamps: Vec<u32>,
    vertex_faces: Vec<Vec<usize>>,
    boundary: HashSet<u32>,
    live_faces: usize,
}

impl Workspace {
    fn new(mesh: &Mesh) -> Self {
        let boundary = mesh
            .edge_faces()
            .into_iter()
            .filter(|(_, f)| f.len() != 2)
            .flat_map(|((a, b), _)| [a, b])
            .collect();
        Self {
            positions: mesh.vertices().to_vec(),
            faces: mesh.faces().iter().map(|&f| Some(f)).collect(),
            stamps: vec![0; mesh.face_count()],
            vertex_faces: mesh.vertex_faces(),
            boundary,
            live_faces: mesh.face_count(),
        }
    }

    fn points(&self, f: [u32; 3]) -> [Vec3; 3] {
        f.map(|v| self.positions[v as usize])
    }

    fn area(&self, f: [u32; 3]) -> f64 {
        let [a, b, c] = self.points(f);
        0.5 * (b - a).cross(c - a).length()
    }

    fn live_faces_of(&self, v: u32) -> impl Iterator<Item = usize> + '_ {
        self.vertex_faces[v as usize]
            .iter()
            .copied()
            .filter(|&f| self.faces[f].is_some())
    }

    /// Mean area of the faces within `depth` vertex-adjacency steps of `face`.
    fn neighbourhood_mean_area(&self, face: usize, depth: u32) -> f64 {
        let mut seen: HashSet<usize> = HashSet::from([face]);
        let mut queue = VecDeque::from([(face, 0_u32)]);
        let mut total = 0.0;
        while let Some((f, d)) = queue.pop_front() {
            let Some(tri) = self.faces[f] else { continue };
            total += self.area(tri);
            if d + 1 >= depth {
                continue;
            }
            for v in tri {
                for g in self.live_faces_of(v) {
                    if seen.insert(g) {
                        queue.push_back((g, d + 1));
                    }
                }
            }
        }
        total / seen.len().max(1) as f64
    }

    fn badness(&self, face: usize, params: &GecParams) -> Option<f64> {
        let tri = self.faces[face]?;
        let aspect = triangle_aspect_ratio(self.points(tri));
        let area = self.area(tri);
        let reference = params.lambda() * self.neighbourhood_mean_area(face, params.depth());
        let small = if area > 0.0 { reference / area } else { f64::INFINITY };
        let badness = (aspect / params.alpha()).max(small);
        (badness > 1.0).then_some(badness)
    }

    fn push(&self, heap: &mut BinaryHeap<Candidate>, face: usize, params: &GecParams) {
        if let Some(badness) = self.badness(face, params) {
            heap.push(Candidate {
                face,
                stamp: self.stamps[face],
                badness,
            });
        }
    }

    fn neighbours(&self, v: u32) -> HashSet<u32> {
        self.live_faces_of(v)
            .filter_map(|f| self.faces[f])
            .flat_map(|t| t.into_iter())
            .filter(|&w| w != v)
            .collect()
    }

    /// Collapses `u`–`v` into `u` at the midpoint if every check passes.
    ///
    /// Returns the faces whose shape changed.
    fn try_collapse(&mut self, u: u32, v: u32, params: &GecParams) -> Option<Vec<usize>> {
        if self.boundary.contains(&u) || self.boundary.contains(&v) {
            return None;
        }
        let around: Vec<usize> = {
            let mut fs: Vec<usize> = self.live_faces_of(u).chain(self.live_faces_of(v)).collect();
            fs.sort_unstable();
            fs.dedup();
            fs
        };
        let (shared, moved): (Vec<usize>, Vec<usize>) = around
            .iter()
            .copied()
            .partition(|&f| self.faces[f].is_some_and(|t| t.contains(&u) && t.contains(&v)));
        if shared.len() != 2 {
            return None;
        }
        let opposite: HashSet<u32> = shared
            .iter()
            .filter_map(|&f| self.faces[f])
            .flat_map(|t| t.into_iter())
            .filter(|&w| w != u && w != v)
            .collect();
        let common: HashSet<u32> = self.neighbours(u).intersection(&self.neighbours(v)).copied().collect();
        if common != opposite || self.live_faces <= 4 {
            return None;
        }

        let m = (self.positions[u as usize] + self.positions[v as usize]) * 0.5;
        let before_worst = around
            .iter()
            .filter_map(|&f| self.faces[f])
            .map(|t| triangle_aspect_ratio(self.points(t)))
            .fold(0.0, f64::max);
        let before_area: f64 = around.iter().filter_map(|&f| self.faces[f]).map(|t| self.area(t)).sum();
        let mean_area = before_area / around.len() as f64;

        let mut after_worst: f64 = 0.0;
        let mut after_area = 0.0;
        let mut replaced = Vec::with_capacity(moved.len());
        for &f in &moved {
            let tri = self.faces[f]?;
            let old = self.points(tri);
            let new_tri = tri.map(|w| if w == v { u } else { w });
            let new = new_tri.map(|w| if w == u { m } else { self.positions[w as usize] });
            let n_old = (old[1] - old[0]).cross(old[2] - old[0]);
            let n_new = (new[1] - new[0]).cross(new[2] - new[0]);
            if n_new.dot(n_old) <= 0.0 {
                return None;
            }
            after_worst = after_worst.max(triangle_aspect_ratio(new));
            after_area += 0.5 * n_new.length();
            replaced.push((f, new_tri));
        }
        if after_worst > before_worst || (after_area - before_area).abs() > params.mu() * mean_area {
            return None;
        }

        self.positions[u as usize] = m;
        for &f in &shared {
            self.faces[f] = None;
        }
        for &(f, tri) in &replaced {
            self.faces[f] = Some(tri);
            self.stamps[f] += 1;
        }
        self.live_faces -= shared.len();
        self.vertex_faces[u as usize] = moved.clone();
        self.vertex_faces[v as usize].clear();
        Some(moved)
    }

    fn into_mesh(self, source: &Mesh) -> Mesh {
        let mut mesh = Mesh::with_capacity(self.positions.len(), self.faces.len());
        for (i, &p) in self.positions.iter().enumerate() {
            mesh.add_vertex(p, source.vertex_tag(i as u32));
        }
        for (fi, f) in self.faces.iter().enumerate() {
            if let Some(tri) = f {
                mesh.add_face(*tri, source.face_tag(fi));
            }
        }
        mesh.compact();
        mesh
    }
}

/// Collapses edges of bad faces until no admissible collapse remains.
pub fn greedy_edge_collapse(mesh: &Mesh, params: &GecParams) -> (Mesh, GecStats) {
    let mut ws = Workspace::new(mesh);
    let mut stats = GecStats::default();
    let mut heap = BinaryHeap::new();
    for f in 0..mesh.face_count() {
        ws.push(&mut heap, f, params);
    }
    stats.initial_candidates = heap.len();

    while let Some(cand) = heap.pop() {
        if ws.stamps[cand.face] != cand.stamp {
            continue;
        }
        let Some(tri) = ws.faces[cand.face] else { continue };
        let p = ws.points(tri);
        let k = (0..3)
            .min_by(|&i, &j| {
                let li = p[i].distance_squared(p[(i + 1) % 3]);
                let lj = p[j].distance_squared(p[(j + 1) % 3]);
                li.total_cmp(&lj)
            })
            .unwrap_or(0);
        let (u, v) = edge_key(tri[k], tri[(k + 1) % 3]);
        match ws.try_collapse(u, v, params) {
            Some(changed) => {
                stats.collapses += 1;
                for f in changed {
                    ws.push(&mut heap, f, params);
                }
            }
            None => stats.rejected += 1,
        }
    }

    let out = ws.into_mesh(mesh);
    debug!(
        candidates = stats.initial_candidates,
        collapses = stats.collapses,
        rejected = stats.rejected,
        faces = out.face_count(),
        "greedy edge collapse finished"
    );
    (out, stats)
}
