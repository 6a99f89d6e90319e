//! Hole boundaries left by face removal and their stitching.

use std::collections::{HashMap, HashSet};

use cellgen_geometry::Vec3;

use super::Violation;
use crate::mesh::Mesh;

/// Closed boundary of the removed region, oriented like the kept faces.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HoleLoop {
    pub vertices: Vec<u32>,
    pub centroid: Vec3,
    pub vector_area: Vec3,
}

impl HoleLoop {
    fn new(mesh: &Mesh, vertices: Vec<u32>) -> Self {
        let n = vertices.len();
        let points: Vec<Vec3> = vertices.iter().map(|&v| mesh.vertex(v)).collect();
        let centroid = points.iter().copied().sum::<Vec3>() / n as f64;
        let vector_area = (0..n)
            .map(|i| (points[i] - centroid).cross(points[(i + 1) % n] - centroid))
            .sum::<Vec3>()
            * 0.5;
        Self {
            vertices,
            centroid,
            vector_area,
        }
    }
}

/// Directed edges of kept faces whose twin lies in a removed face.
///
/// Edges without a twin (open boundaries of flushed regions) never count.
pub(crate) fn hole_edges(mesh: &Mesh, removed: &[bool]) -> Vec<(u32, u32)> {
    let directed = mesh.directed_edges();
    let mut edges = Vec::new();
    for (fi, f) in mesh.faces().iter().enumerate() {
        if removed[fi] {
            continue;
        }
        for k in 0..3 {
            let (a, b) = (f[k], f[(k + 1) % 3]);
            if directed.get(&(b, a)).is_some_and(|&g| removed[g]) {
                edges.push((a, b));
            }
        }
    }
    edges
}

/// Removes the kept faces around vertices with several outgoing hole
/// edges until every boundary vertex is simple.
///
/// Returns the number of additionally removed faces.
pub(crate) fn clear_pinches(mesh: &Mesh, removed: &mut [bool]) -> usize {
    let vertex_faces = mesh.vertex_faces();
    let mut cleared = 0;
    loop {
        let mut outgoing: HashMap<u32, u32> = HashMap::new();
        for (a, _) in hole_edges(mesh, removed) {
            *outgoing.entry(a).or_default() += 1;
        }
        let pinched: Vec<u32> = outgoing
            .into_iter()
            .filter_map(|(v, n)| (n >= 2).then_some(v))
            .collect();
        if pinched.is_empty() {
            return cleared;
        }
        for v in pinched {
            for &f in &vertex_faces[v as usize] {
                if !removed[f] {
                    removed[f] = true;
                    cleared += 1;
                }
            }
        }
    }
}

/// Chains hole edges into closed loops.
pub(crate) fn extract_loops(mesh: &Mesh, removed: &[bool]) -> Result<Vec<HoleLoop>, Violation> {
    let edges = hole_edges(mesh, removed);
    let mut next: HashMap<u32, u32> = HashMap::with_capacity(edges.len());
    let mut incoming: HashSet<u32> = HashSet::with_capacity(edges.len());
    for &(a, b) in &edges {
        if next.insert(a, b).is_some() || !incoming.insert(b) {
            return Err(Violation::NonSimpleLoop);
        }
    }

    let mut starts: Vec<u32> = next.keys().copied().collect();
    starts.sort_unstable();
    let mut visited: HashSet<u32> = HashSet::with_capacity(next.len());
    let mut loops = Vec::new();
    for start in starts {
        if visited.contains(&start) {
            continue;
        }
        let mut chain = vec![start];
        visited.insert(start);
        let mut cur = start;
        loop {
            let Some(&n) = next.get(&cur) else {
                return Err(Violation::NonSimpleLoop);
            };
            if n == start {
                break;
            }
            if !visited.insert(n) {
                return Err(Violation::NonSimpleLoop);
            }
            chain.push(n);
            cur = n;
        }
        if chain.len() < 3 {
            return Err(Violation::NonSimpleLoop);
        }
        loops.push(HoleLoop::new(mesh, chain));
    }
    Ok(loops)
}

/// Pairs every red loop with the nearest unpaired blue loop.
pub(crate) fn pair_loops(red: &[HoleLoop], blue: &[HoleLoop]) -> Result<Vec<(usize, usize)>, Violation> {
    if red.len() != blue.len() {
        return Err(Violation::LoopCountMismatch {
            red: red.len(),
            blue: blue.len(),
        });
    }
    let mut taken = vec![false; blue.len()];
    let mut pairs = Vec::with_capacity(red.len());
    for (i, r) in red.iter().enumerate() {
        let j = (0..blue.len())
            .filter(|&j| !taken[j])
            .min_by(|&x, &y| {
                let dx = blue[x].centroid.distance_squared(r.centroid);
                let dy = blue[y].centroid.distance_squared(r.centroid);
                dx.total_cmp(&dy)
            })
            .ok_or(Violation::LoopCountMismatch {
                red: red.len(),
                blue: blue.len(),
            })?;
        if r.vector_area.dot(blue[j].vector_area) >= 0.0 {
            return Err(Violation::SameDirectionLoops);
        }
        taken[j] = true;
        pairs.push((i, j));
    }
    Ok(pairs)
}

/// Stitches two opposite loops with a strip of `n + m` triangles.
///
/// `a` is walked forward and `b` backward starting from the vertex of `b`
/// nearest to `a[0]`; at each step the shorter new diagonal wins. Both
/// slices hold `(index, position)` in the index space of the output mesh.
pub(crate) fn zipper(a: &[(u32, Vec3)], b: &[(u32, Vec3)]) -> Vec<[u32; 3]> {
    let (n, m) = (a.len(), b.len());
    let start = (0..m)
        .min_by(|&x, &y| b[x].1.distance_squared(a[0].1).total_cmp(&b[y].1.distance_squared(a[0].1)))
        .unwrap_or(0);
    let av = |i: usize| a[i % n];
    let cv = |s: usize| b[(start + m - s % m) % m];

    let mut faces = Vec::with_capacity(n + m);
    let (mut i, mut s) = (0, 0);
    while i < n || s < m {
        let advance_a = if i == n {
            false
        } else if s == m {
            true
        } else {
            av(i + 1).1.distance_squared(cv(s).1) <= av(i).1.distance_squared(cv(s + 1).1)
        };
        if advance_a {
            faces.push([av(i + 1).0, av(i).0, cv(s).0]);
            i += 1;
        } else {
            faces.push([cv(s).0, cv(s + 1).0, av(i).0]);
            s += 1;
        }
    }
    faces
}
