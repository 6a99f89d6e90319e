use super::*;
use approx::assert_relative_eq;

#[test]
fn face_count_grows_by_four() {
    for k in 0..4 {
        let mesh = icosphere(Vec3::ZERO, 1.0, k, 0.0, 0);
        assert_eq!(mesh.face_count(), 20 * 4usize.pow(k));
        assert_eq!(mesh.vertex_count(), 10 * 4usize.pow(k) + 2);
    }
}

#[test]
fn vertices_lie_on_sphere() {
    let centre = Vec3::new(1.0, -2.0, 3.0);
    let mesh = icosphere(centre, 2.5, 2, 0.7, 3);
    for &p in mesh.vertices() {
        assert_relative_eq!(p.distance(centre), 2.5, epsilon = 1e-12);
    }
    assert!(mesh.is_closed_manifold());
    assert_eq!(mesh.euler_characteristic(), 2);
}

#[test]
fn faces_point_outward() {
    let mesh = icosphere(Vec3::ZERO, 1.0, 1, 0.0, 0);
    for f in 0..mesh.face_count() {
        assert!(mesh.face_normal(f).dot(mesh.face_centroid(f)) > 0.0);
    }
}

#[test]
fn phase_rotates_vertices() {
    let a = icosphere(Vec3::ZERO, 1.0, 0, 0.0, 0);
    let b = icosphere(Vec3::ZERO, 1.0, 0, 0.5, 0);
    assert!(a.vertex(0).distance(b.vertex(0)) > 1e-3);
    assert_relative_eq!(a.vertex(0).z, b.vertex(0).z, epsilon = 1e-12);
}

#[test]
fn tags_carry_element() {
    let mesh = icosphere(Vec3::ZERO, 1.0, 0, 0.0, 7);
    assert!((0..mesh.vertex_count() as u32).all(|v| mesh.vertex_tag(v).element == 7));
    assert_eq!(mesh.face_tag(0).element, 7);
}
