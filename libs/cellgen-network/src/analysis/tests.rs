use super::status::IntersectionStatus;
use super::*;
use crate::parametrize::parametrize_paths;
use crate::partition::partition;
use config::settings::{ParametrizationStrategy, PartitionStrategy};

fn settings(nthreads: usize) -> AnalysisSettings {
    AnalysisSettings {
        nthreads,
        ..AnalysisSettings::default()
    }
}

/// Adds a soma with one unbranched neurite through `points`.
fn cell(g: &mut SkeletonGraph, centre: Vec3, radius: f64, points: &[(Vec3, f64)]) -> Vec<VertexId> {
    let soma = g.add_vertex(centre, radius, VertexKind::Soma);
    let mut ids = vec![soma];
    for &(p, r) in points {
        let v = g.add_vertex(p, r, VertexKind::Dendrite);
        g.add_edge(*ids.last().unwrap(), v).unwrap();
        ids.push(v);
    }
    ids
}

fn run(g: &mut SkeletonGraph, nthreads: usize) -> (Partition, AnalysisReport) {
    let mut p = partition(g, &PartitionStrategy::SimpleNeuritePaths).unwrap();
    parametrize_paths(g, &mut p, ParametrizationStrategy::ChordLength).unwrap();
    let report = analyze(g, &p, &settings(nthreads)).unwrap();
    (p, report)
}

/// Status of the segment ending at `v`.
fn status_into(g: &SkeletonGraph, v: VertexId) -> IntersectionStatus {
    let e = g.vertex(v).unwrap().parent.unwrap();
    g.edge(e).unwrap().segment().unwrap().status.clone()
}

fn incoming(g: &SkeletonGraph, v: VertexId) -> EdgeId {
    g.vertex(v).unwrap().parent.unwrap()
}

fn y_branch() -> SkeletonGraph {
    let mut g = SkeletonGraph::new();
    let ids = cell(
        &mut g,
        Vec3::ZERO,
        5.0,
        &[(Vec3::new(4.5, 0.0, 0.0), 1.0), (Vec3::new(15.0, 0.0, 0.0), 1.0)],
    );
    let a = g.add_vertex(Vec3::new(25.0, 5.0, 0.0), 0.8, VertexKind::Dendrite);
    let b = g.add_vertex(Vec3::new(25.0, -5.0, 0.0), 0.8, VertexKind::Axon);
    g.add_edge(ids[2], a).unwrap();
    g.add_edge(ids[2], b).unwrap();
    g
}

#[test]
fn y_branch_is_clean() {
    let mut g = y_branch();
    let (p, report) = run(&mut g, 2);
    assert_eq!(p.len(), 3);
    assert_eq!(report.segments, 3);
    assert_eq!(report.counts, ConflictCounts::default());
    assert_eq!(report.anomalies, 0);
    assert!(report.clean);
    assert!(g.segments().all(|(_, e)| e.segment().unwrap().status.is_clean()));
}

#[test]
fn looping_path_intersects_itself() {
    let mut g = SkeletonGraph::new();
    let ids = cell(
        &mut g,
        Vec3::ZERO,
        5.0,
        &[
            (Vec3::new(4.0, 0.0, 0.0), 1.0),
            (Vec3::new(14.0, 0.0, 0.0), 1.0),
            (Vec3::new(24.0, 0.0, 0.0), 1.0),
            (Vec3::new(24.0, 6.0, 0.0), 1.0),
            (Vec3::new(14.0, 1.5, 0.0), 1.0),
        ],
    );
    let (_, report) = run(&mut g, 1);
    assert!(!report.clean);
    assert!(report.counts.pmdv > 0);

    let last = status_into(&g, ids[5]);
    assert!(last.flags().gsi);
    let partners: Vec<EdgeId> = last.gsi().unwrap().contacts.iter().map(|c| c.partner).collect();
    assert!(partners.contains(&incoming(&g, ids[3])));

    // mirrored onto the partner
    let second = status_into(&g, ids[3]);
    let back = second.gsi().unwrap().contacts.iter().find(|c| c.partner == incoming(&g, ids[5]));
    assert!(back.is_some());
}

#[test]
fn crossing_cells_are_independent_contacts() {
    let mut g = SkeletonGraph::new();
    let a = cell(
        &mut g,
        Vec3::ZERO,
        5.0,
        &[(Vec3::new(4.0, 0.0, 0.0), 1.0), (Vec3::new(40.0, 0.0, 0.0), 1.0)],
    );
    let b = cell(
        &mut g,
        Vec3::new(20.0, 30.0, 0.0),
        5.0,
        &[(Vec3::new(20.0, 26.0, 0.0), 1.0), (Vec3::new(20.0, -10.0, 0.0), 1.0)],
    );
    let (_, report) = run(&mut g, 2);
    assert_eq!(report.counts.icin_nsns, 2);
    assert_eq!(report.counts.total(), 2);
    assert!(report.candidate_pairs >= 1);

    let sa = status_into(&g, a[2]);
    let contact = sa.nsns().unwrap().contacts[0];
    assert_eq!(contact.relation, NsnsRelation::Independent);
    assert_eq!(contact.contact.partner, incoming(&g, b[2]));
    let sb = status_into(&g, b[2]);
    assert_eq!(sb.nsns().unwrap().contacts[0].contact.partner, incoming(&g, a[2]));
    assert!(!sb.flags().icrn_nsns);
}

#[test]
fn child_folding_onto_parent_is_related_contact() {
    let mut g = SkeletonGraph::new();
    let ids = cell(
        &mut g,
        Vec3::ZERO,
        5.0,
        &[(Vec3::new(4.0, 0.0, 0.0), 1.0), (Vec3::new(14.0, 0.0, 0.0), 1.0)],
    );
    let fork = ids[2];
    let straight = g.add_vertex(Vec3::new(24.0, 0.0, 0.0), 1.0, VertexKind::Dendrite);
    let up = g.add_vertex(Vec3::new(14.0, 8.0, 0.0), 1.0, VertexKind::Dendrite);
    let back = g.add_vertex(Vec3::new(7.0, 1.5, 0.0), 1.0, VertexKind::Dendrite);
    g.add_edge(fork, straight).unwrap();
    g.add_edge(fork, up).unwrap();
    g.add_edge(up, back).unwrap();

    let (p, report) = run(&mut g, 2);
    assert_eq!(p.len(), 3);
    assert!(report.counts.icrn_nsns >= 1);
    assert_eq!(report.counts.icin_nsns, 0);

    let folded = status_into(&g, back);
    let nsns = folded.nsns().unwrap();
    assert!(nsns
        .contacts
        .iter()
        .any(|c| c.relation == NsnsRelation::RelatedNeighbour && c.contact.partner == incoming(&g, fork)));
    // first segments of child paths touch the parent by construction
    assert!(!status_into(&g, up).flags().icrn_nsns);
    assert!(!status_into(&g, straight).flags().rc_nsns);
}

#[test]
fn root_vertex_outside_soma_breaks_required_contact() {
    let mut g = SkeletonGraph::new();
    let ids = cell(
        &mut g,
        Vec3::ZERO,
        5.0,
        &[(Vec3::new(8.0, 0.0, 0.0), 1.0), (Vec3::new(18.0, 0.0, 0.0), 1.0)],
    );
    let (_, report) = run(&mut g, 1);
    assert_eq!(report.counts.rc_sons, 1);
    let st = status_into(&g, ids[2]);
    assert!(st.sons().unwrap().required_contact_broken);
    assert!(!st.flags().ic_sons);
}

#[test]
fn neurite_passing_foreign_soma_is_illegal_contact() {
    let mut g = SkeletonGraph::new();
    let a = cell(
        &mut g,
        Vec3::ZERO,
        5.0,
        &[(Vec3::new(4.0, 0.0, 0.0), 1.0), (Vec3::new(40.0, 0.0, 0.0), 1.0)],
    );
    let b = cell(
        &mut g,
        Vec3::new(25.0, 2.5, 0.0),
        2.0,
        &[(Vec3::new(25.0, 4.0, 0.0), 0.5), (Vec3::new(25.0, 20.0, 0.0), 0.5)],
    );
    let (_, report) = run(&mut g, 2);
    assert_eq!(report.counts.ic_sons, 1);
    assert_eq!(report.counts.rc_sons, 0);
    let st = status_into(&g, a[2]);
    assert_eq!(st.sons().unwrap().contacts[0].soma, b[0]);
}

#[test]
fn distance_violations() {
    let mut g = SkeletonGraph::new();
    let short = cell(
        &mut g,
        Vec3::ZERO,
        5.0,
        &[
            (Vec3::new(4.0, 0.0, 0.0), 1.0),
            (Vec3::new(14.0, 0.0, 0.0), 3.0),
            (Vec3::new(15.0, 0.0, 0.0), 1.0),
            (Vec3::new(25.0, 0.0, 0.0), 1.0),
        ],
    );
    let returning = cell(
        &mut g,
        Vec3::new(0.0, 100.0, 0.0),
        5.0,
        &[
            (Vec3::new(4.0, 100.0, 0.0), 0.5),
            (Vec3::new(14.0, 100.0, 0.0), 0.5),
            (Vec3::new(14.0, 110.0, 0.0), 0.5),
            (Vec3::new(2.0, 102.0, 0.0), 0.5),
        ],
    );
    let (_, report) = run(&mut g, 2);
    assert!(status_into(&g, short[3]).flags().smdv);
    assert!(status_into(&g, returning[4]).flags().spmdv);
    assert!(!status_into(&g, returning[3]).flags().spmdv);
    assert!(report.counts.smdv >= 1);
    assert!(report.counts.spmdv >= 1);
    assert!(!report.clean);
}

#[test]
fn thread_count_does_not_change_results() {
    let build = || {
        let mut g = y_branch();
        let extra = cell(
            &mut g,
            Vec3::new(20.0, 30.0, 0.0),
            5.0,
            &[(Vec3::new(20.0, 26.0, 0.0), 1.0), (Vec3::new(20.0, -10.0, 0.0), 1.0)],
        );
        (g, extra)
    };
    let (mut g1, _) = build();
    let (mut g4, _) = build();
    let (_, r1) = run(&mut g1, 1);
    let (_, r4) = run(&mut g4, 4);
    assert_eq!(r1, r4);
    let s1: Vec<IntersectionStatus> = g1.segments().map(|(_, e)| e.segment().unwrap().status.clone()).collect();
    let s4: Vec<IntersectionStatus> = g4.segments().map(|(_, e)| e.segment().unwrap().status.clone()).collect();
    assert_eq!(s1, s4);
    assert!(!r1.clean);
}

#[test]
fn repeated_analysis_replaces_status() {
    let mut g = y_branch();
    let (p, first) = run(&mut g, 1);
    let second = analyze(&mut g, &p, &settings(1)).unwrap();
    assert_eq!(first, second);
}

#[test]
fn paths_without_geometry_are_rejected() {
    let mut g = y_branch();
    let p = partition(&mut g, &PartitionStrategy::SimpleNeuritePaths).unwrap();
    let err = analyze(&mut g, &p, &settings(1)).unwrap_err();
    assert!(matches!(err, AnalysisError::MissingGeometry(_)));
}

#[test]
fn degenerate_paths_count_as_anomalies() {
    let mut g = SkeletonGraph::new();
    let ids = cell(
        &mut g,
        Vec3::ZERO,
        5.0,
        &[
            (Vec3::new(4.5, 0.0, 0.0), 1.0),
            (Vec3::new(15.0, 0.0, 0.0), 1.0),
            (Vec3::new(25.0, 0.0, 0.0), 1.0),
            (Vec3::new(25.0, 0.0, 0.0), 1.0),
        ],
    );
    let (p, report) = run(&mut g, 2);

    assert!(p.paths[0].is_degenerate());
    assert!(!report.clean);
    assert_eq!(report.segments, 4);
    assert_eq!(report.anomalies, 4);
    assert_eq!(report.counts.total(), 0);
    let last = status_into(&g, ids[4]);
    assert_eq!(last.anomalies(), 1);
    assert!(!last.is_clean());
}
