use super::*;
use crate::graph::VertexKind;
use crate::partition::partition;
use approx::assert_relative_eq;
use config::settings::PartitionStrategy;

const STRATEGIES: [ParametrizationStrategy; 3] = [
    ParametrizationStrategy::ChordLength,
    ParametrizationStrategy::Uniform,
    ParametrizationStrategy::Centripetal,
];

fn zigzag() -> Vec<Vec3> {
    vec![
        Vec3::ZERO,
        Vec3::new(10.0, 2.0, 0.0),
        Vec3::new(20.0, -1.0, 1.0),
        Vec3::new(26.0, 0.0, 0.0),
        Vec3::new(40.0, 5.0, -2.0),
    ]
}

#[test]
fn parameters_start_at_zero_and_increase() {
    for strategy in STRATEGIES {
        let p = parametrize(&zigzag(), strategy).unwrap();
        assert_eq!(p.parameters[0], 0.0);
        assert_eq!(p.parameters.len(), 5);
        assert!(p.parameters.windows(2).all(|w| w[1] > w[0]), "{strategy}");
        let span = p.parameters[4] - p.parameters[0];
        assert_relative_eq!(p.scale_factor * span, p.chord_length, epsilon = 1e-9);
    }
    let uniform = parametrize(&zigzag(), ParametrizationStrategy::Uniform).unwrap();
    assert_relative_eq!(uniform.parameters[4], 1.0);
    assert_relative_eq!(uniform.parameters[2], 0.5);
}

#[test]
fn degenerate_polylines() {
    assert!(parametrize(&[Vec3::ZERO], ParametrizationStrategy::ChordLength).is_none());
    let repeated = [Vec3::ZERO, Vec3::X, Vec3::X];
    for strategy in STRATEGIES {
        assert!(parametrize(&repeated, strategy).is_none());
    }
}

#[test]
fn spine_interpolates_with_c1_joints() {
    let pts = zigzag();
    let radii = [2.0, 1.5, 1.5, 1.0, 0.5];
    let p = parametrize(&pts, ParametrizationStrategy::Centripetal).unwrap();
    let surfaces = spine_surfaces(&pts, &radii, &p.parameters).unwrap();
    assert_eq!(surfaces.len(), 4);
    for (i, s) in surfaces.iter().enumerate() {
        assert!(s.point(0.0).distance(pts[i]) < 1e-12);
        assert!(s.point(1.0).distance(pts[i + 1]) < 1e-12);
        assert_relative_eq!(s.radius(0.0), radii[i]);
        assert_relative_eq!(s.radius(1.0), radii[i + 1]);
    }
    // derivative w.r.t. the global parameter matches across joints
    for i in 0..3 {
        let d0 = p.parameters[i + 1] - p.parameters[i];
        let d1 = p.parameters[i + 2] - p.parameters[i + 1];
        let left = surfaces[i].spine().derivative().eval(1.0) / d0;
        let right = surfaces[i + 1].spine().derivative().eval(0.0) / d1;
        assert!(left.distance(right) < 1e-9, "joint {i}: {left} vs {right}");
    }
}

#[test]
fn single_segment_is_straight() {
    let pts = [Vec3::ZERO, Vec3::new(3.0, 4.0, 0.0)];
    let p = parametrize(&pts, ParametrizationStrategy::ChordLength).unwrap();
    let s = spine_surfaces(&pts, &[1.0, 1.0], &p.parameters).unwrap();
    assert_eq!(s[0].spine().degree(), 1);
    assert_relative_eq!(s[0].arc_length(), 5.0);
}

#[test]
fn mismatched_inputs_are_rejected() {
    assert!(spine_surfaces(&zigzag(), &[1.0], &[0.0, 1.0]).is_err());
}

#[test]
fn paths_receive_geometry() {
    let mut g = SkeletonGraph::new();
    let soma = g.add_vertex(Vec3::ZERO, 5.0, VertexKind::Soma);
    let mut prev = soma;
    for (k, p) in zigzag().into_iter().enumerate() {
        let v = g.add_vertex(p + Vec3::X * 4.0, 1.0 + 0.1 * k as f64, VertexKind::Axon);
        g.add_edge(prev, v).unwrap();
        prev = v;
    }
    let mut part = partition(&mut g, &PartitionStrategy::SimpleNeuritePaths).unwrap();
    parametrize_paths(&mut g, &mut part, ParametrizationStrategy::ChordLength).unwrap();

    let path = &part.paths[0];
    assert!(path.geometry_updated());
    assert_eq!(path.surfaces().len(), 4);
    assert_relative_eq!(path.scale_factor(), 1.0, epsilon = 1e-12);
    let total: f64 = (0..4).map(|k| path.segment_arc_length(k)).sum();
    assert_relative_eq!(total, path.chord_length(), epsilon = 1e-9);
    for &e in path.edges() {
        let info = g.segment_checked(e).unwrap();
        assert!(info.surface.is_some() && info.magnified.is_some());
    }
    assert!(path.bounding_box().is_some());
}

#[test]
fn coincident_vertices_mark_the_path_degenerate() {
    let mut g = SkeletonGraph::new();
    let soma = g.add_vertex(Vec3::ZERO, 5.0, VertexKind::Soma);
    let a = g.add_vertex(Vec3::X * 4.0, 1.0, VertexKind::Axon);
    let b = g.add_vertex(Vec3::X * 4.0, 1.0, VertexKind::Axon);
    g.add_edge(soma, a).unwrap();
    let ab = g.add_edge(a, b).unwrap();
    let mut part = partition(&mut g, &PartitionStrategy::SimpleNeuritePaths).unwrap();
    let degenerate = parametrize_paths(&mut g, &mut part, ParametrizationStrategy::Uniform).unwrap();

    assert_eq!(degenerate, vec![part.paths[0].id()]);
    let path = &part.paths[0];
    assert!(path.is_degenerate());
    assert!(!path.geometry_updated());
    let info = g.segment_checked(ab).unwrap();
    assert!(info.surface.is_none());
    assert_eq!(info.status.anomalies(), 1);
    assert!(!info.status.is_clean());
}
