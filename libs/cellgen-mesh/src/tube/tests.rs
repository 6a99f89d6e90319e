use super::*;
use approx::assert_relative_eq;

fn params(element: u32) -> TubeParams {
    TubeParams {
        angular_segments: 6,
        triangle_height_factor: 1.0,
        radius_factor: 1.0,
        phase: 0.0,
        preserve_crease_edges: false,
        element,
    }
}

fn straight(a: Vec3, b: Vec3, r0: f64, r1: f64) -> TubeSection {
    TubeSection {
        surface: CanalSurface::linear(a, b, r0, r1).unwrap(),
        arc_length: a.distance(b),
    }
}

#[test]
fn cylinder_is_closed() {
    let mesh = tessellate_tube(&[straight(Vec3::ZERO, Vec3::X * 10.0, 1.0, 1.0)], &params(2)).unwrap();
    assert!(mesh.is_closed_manifold());
    assert_eq!(mesh.euler_characteristic(), 2);
    assert_eq!(mesh.face_tag(0).element, 2);
}

#[test]
fn cylinder_rings_follow_spacing() {
    let mesh = tessellate_tube(&[straight(Vec3::ZERO, Vec3::X * 10.0, 1.0, 1.0)], &params(0)).unwrap();
    let steps = (10.0 / ring_spacing(1.0, 6, 1.0)).ceil() as usize;
    assert_eq!(mesh.vertex_count(), (steps + 1) * 6 + 2);
    for &p in &mesh.vertices()[..(steps + 1) * 6] {
        assert_relative_eq!((p.y * p.y + p.z * p.z).sqrt(), 1.0, epsilon = 1e-9);
    }
}

#[test]
fn faces_point_away_from_spine() {
    let mesh = tessellate_tube(&[straight(Vec3::ZERO, Vec3::X * 6.0, 1.0, 1.0)], &params(0)).unwrap();
    for f in 0..mesh.face_count() {
        let c = mesh.face_centroid(f);
        let axis_point = Vec3::new(c.x.clamp(0.0, 6.0), 0.0, 0.0);
        assert!(mesh.face_normal(f).dot(c - axis_point) > 0.0, "face {f} points inward");
    }
}

#[test]
fn cone_rings_lie_on_envelope() {
    let section = straight(Vec3::ZERO, Vec3::X * 10.0, 2.0, 1.0);
    let surface = section.surface.clone();
    let mesh = tessellate_tube(&[section], &params(0)).unwrap();
    // every ring vertex touches exactly one sphere of the family
    for &p in &mesh.vertices()[..mesh.vertex_count() - 2] {
        let clearance = cellgen_geometry::contact::point_clearance(&surface, p, 1e-10).unwrap();
        assert!(clearance.abs() < 1e-6, "clearance {clearance}");
    }
}

#[test]
fn bent_path_stays_manifold() {
    let a = CanalSurface::cubic(
        [Vec3::ZERO, Vec3::new(3.0, 0.0, 0.0), Vec3::new(6.0, 1.0, 0.0), Vec3::new(8.0, 3.0, 0.0)],
        1.0,
        0.8,
    )
    .unwrap();
    let b = CanalSurface::cubic(
        [Vec3::new(8.0, 3.0, 0.0), Vec3::new(10.0, 5.0, 0.0), Vec3::new(11.0, 8.0, 1.0), Vec3::new(11.0, 11.0, 2.0)],
        0.8,
        0.6,
    )
    .unwrap();
    let sections = [
        TubeSection { arc_length: a.arc_length(), surface: a },
        TubeSection { arc_length: b.arc_length(), surface: b },
    ];
    for preserve in [false, true] {
        let p = TubeParams { preserve_crease_edges: preserve, phase: 1.3, ..params(1) };
        let mesh = tessellate_tube(&sections, &p).unwrap();
        assert!(mesh.is_closed_manifold());
        assert_eq!(mesh.euler_characteristic(), 2);
    }
}

#[test]
fn smaller_factor_gives_denser_rings() {
    let s = [straight(Vec3::ZERO, Vec3::X * 10.0, 1.0, 1.0)];
    let full = tessellate_tube(&s, &params(0)).unwrap();
    let shrunk = tessellate_tube(&s, &TubeParams { radius_factor: 0.6, ..params(0) }).unwrap();
    assert!(shrunk.face_count() > full.face_count());
}

#[test]
fn degenerate_inputs_are_rejected() {
    assert!(matches!(
        tessellate_tube(&[], &params(0)),
        Err(MeshError::DegenerateGeometry { .. })
    ));
    let mut s = straight(Vec3::ZERO, Vec3::X, 1.0, 1.0);
    s.arc_length = 0.0;
    assert!(tessellate_tube(&[s], &params(0)).is_err());
    let cone = straight(Vec3::ZERO, Vec3::X, 1.0, 3.0);
    assert!(tessellate_tube(&[cone], &params(0)).is_err());
}

#[test]
fn transported_frames_stay_orthonormal() {
    let tangents: Vec<Vec3> = (0..20)
        .map(|k| {
            let a = k as f64 * 0.2;
            Vec3::new(a.cos(), a.sin(), 0.3)
        })
        .collect();
    for f in transport_frames(&tangents, 0.4) {
        assert_relative_eq!(f.normal.length(), 1.0, epsilon = 1e-12);
        assert!(f.normal.dot(f.tangent).abs() < 1e-12);
        assert_relative_eq!(f.tangent.cross(f.normal).dot(f.binormal), 1.0, epsilon = 1e-12);
    }
}
