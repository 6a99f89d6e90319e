use super::*;
use approx::assert_relative_eq;

fn tetrahedron() -> Mesh {
    let mut mesh = Mesh::new();
    let tag = VertexTag::new(0);
    let p = [
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(0.0, 1.0, 0.0),
        Vec3::new(0.0, 0.0, 1.0),
    ];
    for v in p {
        mesh.add_vertex(v, tag);
    }
    for f in [[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]] {
        mesh.add_face(f, FaceTag::default());
    }
    mesh
}

#[test]
fn tetrahedron_is_closed() {
    let mesh = tetrahedron();
    assert!(mesh.is_closed_manifold());
    assert_eq!(mesh.euler_characteristic(), 2);
    assert_eq!(mesh.boundary_edge_count(), 0);
}

#[test]
fn outward_normals() {
    let mesh = tetrahedron();
    let centre = Vec3::splat(0.25);
    for f in 0..mesh.face_count() {
        let n = mesh.face_normal(f);
        assert!(n.dot(mesh.face_centroid(f) - centre) > 0.0);
    }
}

#[test]
fn flipped_face_breaks_manifold() {
    let mut mesh = tetrahedron();
    mesh.faces[0] = [0, 1, 2];
    assert!(!mesh.is_closed_manifold());
}

#[test]
fn two_tetrahedra_sharing_a_vertex_are_not_manifold() {
    let mut mesh = tetrahedron();
    let mut other = tetrahedron();
    for i in 0..other.vertex_count() as u32 {
        let p = other.vertex(i);
        other.set_vertex(i, -p);
    }
    for f in other.faces.iter_mut() {
        f.swap(1, 2);
    }
    let offset = mesh.append(&other);
    // glue vertex 0 of the copy onto vertex 0
    for f in mesh.faces.iter_mut() {
        for v in f.iter_mut() {
            if *v == offset {
                *v = 0;
            }
        }
    }
    mesh.compact();
    assert!(!mesh.is_closed_manifold());
}

#[test]
fn split_edge_keeps_closure() {
    let mut mesh = tetrahedron();
    let m = mesh.split_edge(0, 1);
    assert_eq!(mesh.face_count(), 6);
    assert_relative_eq!(mesh.vertex(m).x, 0.5);
    assert!(mesh.is_closed_manifold());
    assert_eq!(mesh.euler_characteristic(), 2);
}

#[test]
fn retain_and_compact() {
    let mut mesh = tetrahedron();
    mesh.retain_faces(&[false, true, false, false]);
    let remap = mesh.compact();
    assert_eq!(mesh.face_count(), 1);
    assert_eq!(mesh.vertex_count(), 3);
    assert_eq!(remap[2], None);
    assert_eq!(mesh.boundary_edge_count(), 3);
}

#[test]
fn append_offsets_indices() {
    let mut mesh = tetrahedron();
    let other = tetrahedron();
    let offset = mesh.append(&other);
    assert_eq!(offset, 4);
    assert_eq!(mesh.face(4), [4, 6, 5]);
    assert_eq!(mesh.euler_characteristic(), 4);
}

#[test]
fn aspect_ratio_of_equilateral_is_one() {
    let h = 3.0_f64.sqrt() / 2.0;
    let tri = [Vec3::ZERO, Vec3::X, Vec3::new(0.5, h, 0.0)];
    assert_relative_eq!(triangle_aspect_ratio(tri), 1.0, epsilon = 1e-12);
    let sliver = [Vec3::ZERO, Vec3::X, Vec3::new(0.5, 1e-3, 0.0)];
    assert!(triangle_aspect_ratio(sliver) > 100.0);
    let flat = [Vec3::ZERO, Vec3::X, Vec3::X * 2.0];
    assert!(triangle_aspect_ratio(flat).is_infinite());
}

#[test]
fn neighbours_are_symmetric() {
    let mesh = tetrahedron();
    let n = mesh.vertex_neighbors();
    assert_eq!(n[0], vec![1, 2, 3]);
    assert_eq!(mesh.vertex_faces()[3].len(), 3);
}

#[test]
fn batch_split_refines_consecutive_edges() {
    let mut mesh = tetrahedron();
    let m = mesh.split_edges(&[(0, 1), (1, 2), (0, 1)]);
    assert_eq!(m.len(), 3);
    assert_eq!(mesh.face_count(), 8);
    mesh.compact();
    assert!(mesh.is_closed_manifold());
    assert_eq!(mesh.euler_characteristic(), 2);
}
