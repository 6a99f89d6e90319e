use super::*;
use crate::parametrize::parametrize_paths;
use crate::partition::partition;
use crate::swc::parse_swc;
use approx::assert_relative_eq;
use cellgen_mesh::obj::read_obj;
use config::settings::{ParametrizationStrategy, PartitionStrategy};

const Y_BRANCH: &str = "\
1 1 0 0 0 5 -1
2 3 4.5 0 0 1 1
3 3 15 0 0 1 2
4 3 25 5 0 0.8 3
5 2 25 -5 0 0.8 3
";

const TWO_CELLS: &str = "\
1 1 0 0 0 5 -1
2 3 4.5 0 0 1 1
3 3 20 0 0 1 2
10 1 100 0 0 4 -1
11 3 103.5 0 0 1 10
12 3 120 0 0 1 11
";

const CROSSING: &str = "\
1 1 0 0 0 5 -1
2 3 4 0 0 1 1
3 3 40 0 0 1 2
10 1 20 30 0 5 -1
11 3 20 26 0 1.5 10
12 3 20 -10 0 1.5 11
";

fn prepare(text: &str) -> (SkeletonGraph, Partition) {
    let mut g = parse_swc(text).unwrap();
    let mut p = partition(&mut g, &PartitionStrategy::default()).unwrap();
    parametrize_paths(&mut g, &mut p, ParametrizationStrategy::ChordLength).unwrap();
    (g, p)
}

fn settings() -> MeshingSettings {
    MeshingSettings {
        soma_refinements: 2,
        flush_face_limit: None,
        ..MeshingSettings::default()
    }
}

#[test]
fn y_branch_mesh_is_closed() {
    let (g, p) = prepare(Y_BRANCH);
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("y.obj");
    let report = mesh_network(&g, &p, &settings(), &out).unwrap();

    assert_eq!(report.elements.len(), 3);
    assert!(matches!(report.elements[0].kind, ElementKind::Soma(_)));
    assert!(report.elements[0].stats.is_none());
    assert!(report.elements[1..].iter().all(|e| e.stats.is_some()));
    assert_eq!(report.flushes, 0);

    let mesh = read_obj(&out).unwrap();
    assert_eq!(mesh.face_count() as u64, report.faces_written);
    assert!(mesh.is_closed_manifold());
    assert_eq!(mesh.euler_characteristic(), 2);
}

#[test]
fn radius_factor_decreases_monotonically() {
    let s = MeshingSettings {
        outer_loop_maxiter: 3,
        radius_factor_decrement: 0.1,
        ..MeshingSettings::default()
    };
    let factors: Vec<f64> = (0..7).map(|k| radius_factor(&s, k)).collect();
    assert_relative_eq!(factors[0], 1.0);
    assert_relative_eq!(factors[2], 0.8);
    // extra decrement after every third attempt
    assert_relative_eq!(factors[3], 0.6);
    assert_relative_eq!(factors[6], 0.2, epsilon = 1e-12);
    assert!(factors.windows(2).all(|w| w[1] < w[0]));
}

fn budget() -> MergeError {
    MergeError::BudgetExceeded {
        initial: 4,
        created: 9,
        limit: 8.0,
    }
}

#[test]
fn budget_violation_retries_with_smaller_factor() {
    let s = MeshingSettings {
        radius_factor_decrement: 0.1,
        ..settings()
    };
    let mut phases = Vec::new();
    let (factors, stats) = merge_with_retries(&s, 1, |_, phase| {
        phases.push(phase);
        Ok(if phases.len() < 3 {
            Err(budget())
        } else {
            Ok(Some(MergeStats::default()))
        })
    })
    .unwrap();

    assert_eq!(factors.len(), 3);
    assert!(factors.windows(2).all(|w| w[1] < w[0]));
    assert_relative_eq!(factors[2], 0.8, epsilon = 1e-12);
    assert_relative_eq!(phases[2], 2.0 * GOLDEN_ANGLE);
    assert_eq!(stats, Some(MergeStats::default()));
}

#[test]
fn failing_element_stops_at_the_factor_floor() {
    let s = MeshingSettings {
        outer_loop_maxiter: 3,
        radius_factor_decrement: 0.1,
        ..settings()
    };
    let mut tried = Vec::new();
    let err = merge_with_retries(&s, 7, |factor, _| {
        tried.push(factor);
        Ok(Err(budget()))
    })
    .unwrap_err();

    // 1.0, 0.9, 0.8, 0.6, 0.5; the next factor 0.4 is below the floor
    assert_eq!(tried.len(), 5);
    assert!(tried.windows(2).all(|w| w[1] < w[0]));
    assert!(tried.iter().all(|&f| f >= RADIUS_FACTOR_FLOOR));
    match err {
        MeshingError::OuterLoopExhausted {
            element,
            attempts,
            last_factor,
            source,
        } => {
            assert_eq!(element, 7);
            assert_eq!(attempts, 5);
            assert_relative_eq!(last_factor, 0.5, epsilon = 1e-12);
            assert_eq!(source, budget());
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn tessellation_errors_are_not_retried() {
    let mut calls = 0;
    let err = merge_with_retries(&settings(), 2, |_, _| {
        calls += 1;
        Err(MeshingError::Mesh(cellgen_mesh::MeshError::degenerate("flat")))
    })
    .unwrap_err();
    assert_eq!(calls, 1);
    assert!(matches!(err, MeshingError::Mesh(_)));
}

#[test]
fn crossing_tubes_exhaust_the_radius_factor() {
    // long strips: every edge of one tube spanning the other crosses it
    // twice, and so does one half after splitting
    let (g, p) = prepare(CROSSING);
    let dir = tempfile::tempdir().unwrap();
    let s = MeshingSettings {
        triangle_height_factor: 20.0,
        radius_factor_decrement: 0.3,
        complex_edge_max_growth_factor: 0.0,
        ..settings()
    };
    let err = mesh_network(&g, &p, &s, dir.path().join("x.obj")).unwrap_err();
    match err {
        MeshingError::OuterLoopExhausted {
            attempts, last_factor, ..
        } => {
            assert_eq!(attempts, 2);
            assert_relative_eq!(last_factor, 0.7, epsilon = 1e-12);
            assert!(radius_factor(&s, attempts) < RADIUS_FACTOR_FLOOR);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn degenerate_paths_are_not_meshed() {
    let text = format!("{Y_BRANCH}6 2 25 -5 0 0.8 5\n");
    let (g, p) = prepare(&text);
    assert_eq!(p.paths.iter().filter(|path| path.is_degenerate()).count(), 1);
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("d.obj");
    let report = mesh_network(&g, &p, &settings(), &out).unwrap();

    assert_eq!(report.elements.len(), 2);
    let mesh = read_obj(&out).unwrap();
    assert!(mesh.is_closed_manifold());
    assert_eq!(mesh.euler_characteristic(), 2);
}

#[test]
fn element_reports_record_every_attempt() {
    let (g, p) = prepare(Y_BRANCH);
    let dir = tempfile::tempdir().unwrap();
    let report = mesh_network(&g, &p, &settings(), dir.path().join("y.obj")).unwrap();
    for e in &report.elements {
        assert!(e.attempts() >= 1);
        assert_relative_eq!(e.radius_factors[0], 1.0);
        assert!(e.radius_factors.windows(2).all(|w| w[1] < w[0]));
        assert!(e.radius_factors.iter().all(|&f| f >= RADIUS_FACTOR_FLOOR));
    }
}

#[test]
fn flushing_streams_finished_faces() {
    let (g, p) = prepare(Y_BRANCH);
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("flushed.obj");
    let s = MeshingSettings {
        flush_face_limit: Some(1),
        ..settings()
    };
    let report = mesh_network(&g, &p, &s, &out).unwrap();
    assert!(report.flushes >= 1);
    assert!(report.faces_flushed > 0);
    assert!(report.faces_flushed <= report.faces_written);

    let mesh = read_obj(&out).unwrap();
    assert_eq!(mesh.face_count() as u64, report.faces_written);
    assert!(mesh.is_closed_manifold());
    assert_eq!(mesh.euler_characteristic(), 2);
}

#[test]
fn separate_cells_give_separate_components() {
    let (g, p) = prepare(TWO_CELLS);
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("two.obj");
    let report = mesh_network(&g, &p, &settings(), &out).unwrap();
    assert_eq!(report.elements.len(), 4);
    // the second soma does not touch the first cell
    assert!(report.elements[2].stats.is_none());

    let mesh = read_obj(&out).unwrap();
    assert!(mesh.is_closed_manifold());
    assert_eq!(mesh.euler_characteristic(), 4);
}

#[test]
fn individual_surfaces_are_not_merged() {
    let (g, p) = prepare(Y_BRANCH);
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("surfaces.obj");
    let faces = mesh_individual_surfaces(&g, &p, &settings(), &out).unwrap();

    let mesh = read_obj(&out).unwrap();
    assert_eq!(mesh.face_count(), faces);
    assert!(mesh.is_closed_manifold());
    // soma and two tubes, each a closed sphere
    assert_eq!(mesh.euler_characteristic(), 6);
}

#[test]
fn unparametrized_paths_are_rejected() {
    let mut g = parse_swc(Y_BRANCH).unwrap();
    let p = partition(&mut g, &PartitionStrategy::default()).unwrap();
    let dir = tempfile::tempdir().unwrap();
    let err = mesh_network(&g, &p, &settings(), dir.path().join("y.obj")).unwrap_err();
    assert!(matches!(err, MeshingError::MissingGeometry(_)));
}

#[test]
fn unwritable_output_is_io_error() {
    let (g, p) = prepare(Y_BRANCH);
    let dir = tempfile::tempdir().unwrap();
    let err = mesh_network(&g, &p, &settings(), dir.path().join("missing").join("y.obj")).unwrap_err();
    assert!(matches!(err, MeshingError::Mesh(cellgen_mesh::MeshError::Io { .. })));
}
