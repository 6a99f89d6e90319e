use super::*;
use crate::icosphere::icosphere;
use cellgen_geometry::Vec3;

fn gec() -> GecParams {
    GecParams::new(1.5, 0.125, 0.5, 5).unwrap()
}

fn hc() -> HcParams {
    HcParams::new(0.4, 0.7, 10).unwrap()
}

#[test]
fn regular_sphere_needs_no_collapse() {
    let mesh = icosphere(Vec3::ZERO, 1.0, 2, 0.0, 0);
    let (out, stats) = greedy_edge_collapse(&mesh, &gec());
    assert_eq!(stats.collapses, 0);
    assert_eq!(out.face_count(), mesh.face_count());
}

#[test]
fn split_edge_is_collapsed_back() {
    let mut mesh = icosphere(Vec3::ZERO, 1.0, 2, 0.0, 0);
    let other = mesh.vertex_neighbors()[0][0];
    mesh.split_edge(0, other);
    assert_eq!(mesh.face_count(), 322);

    let (out, stats) = greedy_edge_collapse(&mesh, &gec());
    assert!(stats.initial_candidates >= 4);
    assert!(stats.collapses >= 1);
    assert!(out.face_count() < 322);
    assert!(out.is_closed_manifold());
    assert_eq!(out.euler_characteristic(), 2);
}

#[test]
fn smoothing_reduces_noise_without_shrinking() {
    let mut mesh = icosphere(Vec3::ZERO, 1.0, 3, 0.0, 0);
    for v in 0..mesh.vertex_count() as u32 {
        let p = mesh.vertex(v);
        let bump = if v % 2 == 0 { 1.05 } else { 0.95 };
        mesh.set_vertex(v, p * bump);
    }
    let spread = |m: &Mesh| {
        let radii: Vec<f64> = m.vertices().iter().map(|p| p.length()).collect();
        let mean = radii.iter().sum::<f64>() / radii.len() as f64;
        let var = radii.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / radii.len() as f64;
        (mean, var)
    };
    let (_, before) = spread(&mesh);
    let faces = mesh.faces().to_vec();
    hc_smooth(&mut mesh, &hc());
    let (mean, after) = spread(&mesh);
    assert!(after < before * 0.8, "variance {before} -> {after}");
    assert!(mean > 0.9, "mean radius {mean}");
    assert_eq!(mesh.faces(), &faces[..]);
}

#[test]
fn disabled_passes_copy_the_mesh() {
    let mesh = icosphere(Vec3::ZERO, 1.0, 1, 0.0, 0);
    let (out, stats) = post_process(&mesh, None, None);
    assert_eq!(out, mesh);
    assert!(stats.is_none());
    let (out, stats) = post_process(&mesh, Some(&gec()), Some(&hc()));
    assert!(stats.is_some());
    assert!(out.is_closed_manifold());
}
