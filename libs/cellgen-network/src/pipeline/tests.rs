use super::*;
use cellgen_geometry::Vec3;
use cellgen_mesh::icosphere::icosphere;

#[test]
fn output_files_use_the_network_file_name() {
    let dir = Path::new("/tmp/out");
    assert_eq!(output_file(dir, "ri05.CNG"), PathBuf::from("/tmp/out/ri05.CNG.obj"));
    assert_eq!(output_file(dir, "cells/ri05"), PathBuf::from("/tmp/out/ri05.obj"));
}

#[test]
fn missing_union_mesh_skips_post_processing() {
    let dir = tempfile::tempdir().unwrap();
    let config = CellgenConfig::default();
    let (out, stats) = post_process_file(&config, &dir.path().join("absent.obj"), &dir.path().join("pp.obj"));
    assert!(out.is_none());
    assert!(stats.is_none());
    assert!(!dir.path().join("pp.obj").exists());
}

#[test]
fn post_processing_writes_a_closed_mesh() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("sphere.obj");
    write_obj(&input, &icosphere(Vec3::ZERO, 3.0, 2, 0.0, 0)).unwrap();
    let config = CellgenConfig::default();
    let (out, stats) = post_process_file(&config, &input, &dir.path().join("pp.obj"));
    let mesh = read_obj(out.unwrap()).unwrap();
    assert!(mesh.is_closed_manifold());
    assert!(stats.is_some());
}

#[test]
fn failed_meshing_is_not_success() {
    let report = RunReport {
        precondition: None,
        paths: 0,
        degenerate_paths: 0,
        analysis: None,
        meshing: MeshingOutcome::Failed(MeshingError::MissingGeometry(crate::path::PathId(0))),
        individual_surfaces: None,
        post_processed: None,
        gec: None,
    };
    assert!(!report.success());
    assert!(report.meshing.report().is_none());
}
