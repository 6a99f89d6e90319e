use super::*;
use crate::icosphere::icosphere;
use crate::mesh::VertexTag;
use crate::tube::{tessellate_tube, TubeParams, TubeSection};

fn params() -> MergeParams {
    MergeParams {
        inner_maxiter: 8,
        growth_factor: 2.0,
    }
}

fn tube(a: Vec3, b: Vec3, r: f64, element: u32) -> (Mesh, Primitive) {
    let surface = CanalSurface::linear(a, b, r, r).unwrap();
    let section = TubeSection {
        surface: surface.clone(),
        arc_length: a.distance(b),
    };
    let tp = TubeParams {
        angular_segments: 8,
        triangle_height_factor: 1.0,
        radius_factor: 1.0,
        phase: 0.3,
        preserve_crease_edges: false,
        element,
    };
    let mesh = tessellate_tube(&[section], &tp).unwrap();
    (
        mesh,
        Primitive::Tube {
            segments: vec![surface],
            factor: 1.0,
        },
    )
}

fn soma() -> (Mesh, Primitive) {
    (
        icosphere(Vec3::ZERO, 5.0, 3, 0.0, 0),
        Primitive::Sphere {
            centre: Vec3::ZERO,
            radius: 5.0,
        },
    )
}

#[test]
fn primitive_containment() {
    let (_, s) = soma();
    assert!(s.contains(Vec3::new(4.9, 0.0, 0.0)));
    assert!(!s.contains(Vec3::new(5.1, 0.0, 0.0)));
    let (_, t) = tube(Vec3::ZERO, Vec3::X * 10.0, 1.0, 1);
    assert!(t.contains(Vec3::new(5.0, 0.5, 0.0)));
    assert!(!t.contains(Vec3::new(5.0, 1.5, 0.0)));
    assert!(t.bounding_box().contains(Vec3::new(-1.0, 1.0, 1.0)));
}

#[test]
fn tube_leaving_soma_is_stitched() {
    let (blue, sphere) = soma();
    let (red, shape) = tube(Vec3::new(4.0, 0.0, 0.0), Vec3::new(15.0, 0.0, 0.0), 1.0, 1);
    let out = red_blue_merge(&blue, &[sphere], red, &shape, &params()).unwrap();
    assert_eq!(out.stats.loops, 1);
    assert!(out.stats.removed_red > 0 && out.stats.removed_blue > 0);
    assert!(!out.stats.absorbed);
    assert!(out.mesh.is_closed_manifold());
    assert_eq!(out.mesh.euler_characteristic(), 2);
    // both elements survive in the annotations
    let elements: std::collections::BTreeSet<u32> =
        (0..out.mesh.face_count()).map(|f| out.mesh.face_tag(f).element).collect();
    assert_eq!(elements.into_iter().collect::<Vec<_>>(), vec![0, 1]);
}

#[test]
fn tube_through_soma_pairs_two_loops() {
    let (blue, sphere) = soma();
    let (red, shape) = tube(Vec3::new(-12.0, 0.0, 0.0), Vec3::new(12.0, 0.0, 0.0), 1.0, 1);
    let out = red_blue_merge(&blue, &[sphere], red, &shape, &params()).unwrap();
    assert_eq!(out.stats.loops, 2);
    assert!(out.mesh.is_closed_manifold());
    assert_eq!(out.mesh.euler_characteristic(), 2);
}

#[test]
fn blue_is_left_untouched() {
    let (blue, sphere) = soma();
    let before = blue.clone();
    let (red, shape) = tube(Vec3::new(4.0, 0.0, 0.0), Vec3::new(15.0, 0.0, 0.0), 1.0, 1);
    red_blue_merge(&blue, &[sphere], red, &shape, &params()).unwrap();
    assert_eq!(blue, before);
}

#[test]
fn disjoint_element_has_no_contact() {
    let (blue, sphere) = soma();
    let (red, shape) = tube(Vec3::new(10.0, 0.0, 0.0), Vec3::new(20.0, 0.0, 0.0), 1.0, 1);
    let err = red_blue_merge(&blue, &[sphere], red, &shape, &params()).unwrap_err();
    assert_eq!(err, MergeError::InvariantViolation(Violation::NoContact));
}

#[test]
fn element_inside_soma_is_absorbed() {
    let (blue, sphere) = soma();
    let (red, shape) = tube(Vec3::new(-2.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0), 0.5, 1);
    let out = red_blue_merge(&blue, &[sphere], red, &shape, &params()).unwrap();
    assert!(out.stats.absorbed);
    assert_eq!(out.mesh.face_count(), 20 * 64);
}

#[test]
fn empty_resident_mesh_is_rejected() {
    let (red, shape) = tube(Vec3::ZERO, Vec3::X * 5.0, 1.0, 1);
    let err = red_blue_merge(&Mesh::new(), &[], red, &shape, &params()).unwrap_err();
    assert_eq!(err, MergeError::InvariantViolation(Violation::EmptyBlue));
}

fn big_tetrahedron() -> Mesh {
    let mut mesh = Mesh::new();
    for p in [Vec3::ZERO, Vec3::X * 10.0, Vec3::Y * 10.0, Vec3::Z * 10.0] {
        mesh.add_vertex(p, VertexTag::new(1));
    }
    for f in [[0, 2, 1], [0, 1, 3], [1, 2, 3], [0, 3, 2]] {
        mesh.add_face(f, FaceTag { element: 1 });
    }
    mesh
}

#[test]
fn edge_piercing_a_thin_tube_is_complex() {
    // the x axis edge of the tetrahedron passes through the tube twice
    let (blue, _) = tube(Vec3::new(5.0, 0.0, -3.0), Vec3::new(5.0, 0.0, 3.0), 0.3, 0);
    let red = big_tetrahedron();
    let (red_cx, _) = complex::complex_edges_both(&red, &blue);
    assert!(red_cx.contains(&(0, 1)));

    let mut split = red.clone();
    split.split_edges(&red_cx);
    let (again, _) = complex::complex_edges_both(&split, &blue);
    assert!(!again.contains(&(0, 1)));
}

#[test]
fn zero_inner_iterations_exhaust_immediately() {
    let (blue, shape_blue) = tube(Vec3::new(5.0, 0.0, -3.0), Vec3::new(5.0, 0.0, 3.0), 0.3, 0);
    let red = big_tetrahedron();
    let shape = Primitive::Sphere {
        centre: Vec3::splat(2.5),
        radius: 0.1,
    };
    let p = MergeParams {
        inner_maxiter: 0,
        growth_factor: 2.0,
    };
    let err = red_blue_merge(&blue, &[shape_blue], red, &shape, &p).unwrap_err();
    assert_eq!(err, MergeError::InnerLoopExhausted { iterations: 0 });
}

/// Triangle whose edge along the x axis pierces two thin vertical tubes.
fn triangle_over_two_tubes() -> (Mesh, Mesh) {
    let mut red = Mesh::new();
    for p in [Vec3::ZERO, Vec3::X * 10.0, Vec3::new(5.0, -5.0, 0.0)] {
        red.add_vertex(p, VertexTag::new(1));
    }
    red.add_face([0, 1, 2], FaceTag { element: 1 });

    let (mut blue, _) = tube(Vec3::new(3.0, 0.0, -3.1), Vec3::new(3.0, 0.0, 2.7), 0.3, 0);
    let (second, _) = tube(Vec3::new(7.0, 0.0, -3.1), Vec3::new(7.0, 0.0, 2.7), 0.3, 0);
    blue.append(&second);
    (red, blue)
}

#[test]
fn complex_edge_growth_beyond_budget_aborts() {
    // splitting the piercing edge leaves one complex half per tube
    let (red, blue) = triangle_over_two_tubes();
    let shape = Primitive::Sphere {
        centre: Vec3::new(5.0, -2.0, 0.0),
        radius: 0.1,
    };
    let p = MergeParams {
        inner_maxiter: 8,
        growth_factor: 1.5,
    };
    let err = red_blue_merge(&blue, &[], red, &shape, &p).unwrap_err();
    match err {
        MergeError::BudgetExceeded {
            initial,
            created,
            limit,
        } => {
            assert!(initial >= 1);
            assert_eq!(limit, 1.5 * initial as f64);
            assert!(created as f64 > limit);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn zipper_closes_opposite_squares() {
    let a: Vec<(u32, Vec3)> = (0..4)
        .map(|k| {
            let t = k as f64 * std::f64::consts::FRAC_PI_2;
            (k, Vec3::new(0.0, t.cos(), t.sin()))
        })
        .collect();
    let b: Vec<(u32, Vec3)> = (0..6)
        .map(|k| {
            let t = -(k as f64) * std::f64::consts::FRAC_PI_3;
            (10 + k, Vec3::new(1.0, t.cos(), t.sin()))
        })
        .collect();
    let faces = loops::zipper(&a, &b);
    assert_eq!(faces.len(), 10);
    // every loop edge appears reversed exactly once
    for k in 0..4 {
        let (u, v) = (a[k].0, a[(k + 1) % 4].0);
        assert_eq!(faces.iter().filter(|f| (0..3).any(|i| f[i] == v && f[(i + 1) % 3] == u)).count(), 1);
    }
    for k in 0..6 {
        let (u, v) = (b[k].0, b[(k + 1) % 6].0);
        assert_eq!(faces.iter().filter(|f| (0..3).any(|i| f[i] == v && f[(i + 1) % 3] == u)).count(), 1);
    }
}
