//! # Soma Tessellation
//!
//! Spheres are tessellated by repeated 1-to-4 subdivision of a regular
//! icosahedron with the new vertices projected back onto the sphere.
//! `refinements = k` yields `20 · 4^k` faces.

use std::collections::HashMap;

use cellgen_geometry::vec3::rotate_about;
use cellgen_geometry::Vec3;

use crate::mesh::{edge_key, FaceTag, Mesh, VertexTag};

const ICOSAHEDRON_FACES: [[u32; 3]; 20] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

fn icosahedron_directions() -> Vec<Vec3> {
    let t = (1.0 + 5.0_f64.sqrt()) / 2.0;
    [
        (-1.0, t, 0.0),
        (1.0, t, 0.0),
        (-1.0, -t, 0.0),
        (1.0, -t, 0.0),
        (0.0, -1.0, t),
        (0.0, 1.0, t),
        (0.0, -1.0, -t),
        (0.0, 1.0, -t),
        (t, 0.0, -1.0),
        (t, 0.0, 1.0),
        (-t, 0.0, -1.0),
        (-t, 0.0, 1.0),
    ]
    .into_iter()
    .map(|(x, y, z)| Vec3::new(x, y, z).normalize())
    .collect()
}

/// Tessellates a sphere.
///
/// `phase` rotates the tessellation about the z axis, so repeated attempts
/// at the same sphere sample different vertex positions. Every vertex and
/// face is tagged with `element`.
pub fn icosphere(centre: Vec3, radius: f64, refinements: u32, phase: f64, element: u32) -> Mesh {
    let mut dirs = icosahedron_directions();
    let mut faces = ICOSAHEDRON_FACES.to_vec();

    for _ in 0..refinements {
        let mut midpoints: HashMap<(u32, u32), u32> = HashMap::with_capacity(faces.len() * 3 / 2);
        let mut next = Vec::with_capacity(faces.len() * 4);
        for [a, b, c] in faces {
            let mut mid = |u: u32, v: u32| {
                *midpoints.entry(edge_key(u, v)).or_insert_with(|| {
                    let d = (dirs[u as usize] + dirs[v as usize]).normalize();
                    dirs.push(d);
                    (dirs.len() - 1) as u32
                })
            };
            let ab = mid(a, b);
            let bc = mid(b, c);
            let ca = mid(c, a);
            next.extend_from_slice(&[[a, ab, ca], [b, bc, ab], [c, ca, bc], [ab, bc, ca]]);
        }
        faces = next;
    }

    let mut mesh = Mesh::with_capacity(dirs.len(), faces.len());
    for d in dirs {
        let d = if phase == 0.0 { d } else { rotate_about(d, Vec3::Z, phase) };
        mesh.add_vertex(centre + d * radius, VertexTag::new(element));
    }
    for f in faces {
        mesh.add_face(f, FaceTag { element });
    }
    mesh
}

#[cfg(test)]
mod tests;
