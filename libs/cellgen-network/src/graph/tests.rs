use super::*;

/// soma ─ root ─ mid ─ tip, with a side branch at mid.
fn branched() -> (SkeletonGraph, [VertexId; 5]) {
    let mut g = SkeletonGraph::new();
    let soma = g.add_vertex(Vec3::ZERO, 5.0, VertexKind::Soma);
    let root = g.add_vertex(Vec3::new(4.0, 0.0, 0.0), 1.0, VertexKind::Dendrite);
    let mid = g.add_vertex(Vec3::new(14.0, 0.0, 0.0), 1.5, VertexKind::Dendrite);
    let tip = g.add_vertex(Vec3::new(24.0, 0.0, 0.0), 0.5, VertexKind::Dendrite);
    let side = g.add_vertex(Vec3::new(14.0, 10.0, 0.0), 2.0, VertexKind::Dendrite);
    g.add_edge(soma, root).unwrap();
    g.add_edge(root, mid).unwrap();
    g.add_edge(mid, tip).unwrap();
    g.add_edge(mid, side).unwrap();
    (g, [soma, root, mid, tip, side])
}

#[test]
fn edge_kind_follows_end_points() {
    let (g, [soma, root, ..]) = branched();
    let first = g.vertex(root).unwrap().parent.unwrap();
    match &g.edge(first).unwrap().kind {
        EdgeKind::RootEdge(info) => assert!((info.depth - 1.0).abs() < 1e-12),
        EdgeKind::Segment(_) => panic!("soma edge must be a root edge"),
    }
    assert!(g.is_neurite_root(root).unwrap());
    assert_eq!(g.segment_count(), 3);
    assert_eq!(g.cells(), vec![soma]);
}

#[test]
fn invalid_edges_are_rejected() {
    let (mut g, [soma, root, mid, tip, _]) = branched();
    assert_eq!(g.add_edge(tip, tip), Err(GraphError::SelfLoop(tip)));
    assert_eq!(g.add_edge(root, soma), Err(GraphError::SomaWithParent(soma)));
    assert_eq!(g.add_edge(root, mid), Err(GraphError::MultipleParents(mid)));
    assert_eq!(
        g.add_edge(root, VertexId(99)),
        Err(GraphError::UnknownVertex(VertexId(99)))
    );
}

#[test]
fn validate_reports_orphans_and_radii() {
    let (mut g, _) = branched();
    assert!(g.validate().is_ok());
    let orphan = g.add_vertex(Vec3::new(50.0, 0.0, 0.0), 1.0, VertexKind::Axon);
    assert_eq!(g.validate(), Err(GraphError::MissingParent(orphan)));

    let (mut g, [_, _, mid, ..]) = branched();
    g.vertex_mut(mid).unwrap().radius = 0.0;
    assert!(matches!(g.validate(), Err(GraphError::InvalidRadius { vertex, .. }) if vertex == mid));

    assert_eq!(SkeletonGraph::new().validate(), Err(GraphError::NoSoma));
}

#[test]
fn removing_interior_vertex_reparents_child() {
    let mut g = SkeletonGraph::new();
    let soma = g.add_vertex(Vec3::ZERO, 5.0, VertexKind::Soma);
    let a = g.add_vertex(Vec3::X * 4.0, 1.0, VertexKind::Axon);
    let b = g.add_vertex(Vec3::X * 5.0, 1.0, VertexKind::Axon);
    let c = g.add_vertex(Vec3::X * 15.0, 1.0, VertexKind::Axon);
    g.add_edge(soma, a).unwrap();
    let ab = g.add_edge(a, b).unwrap();
    g.add_edge(b, c).unwrap();

    g.remove_interior_vertex(b).unwrap();
    assert!(g.vertex(b).is_none());
    assert_eq!(g.edge(ab).unwrap().dst, c);
    assert_eq!(g.vertex(c).unwrap().parent, Some(ab));
    assert_eq!(g.segment_count(), 1);
    assert!(g.validate().is_ok());

    assert_eq!(g.remove_interior_vertex(c), Err(GraphError::NotInterior(c)));
    assert_eq!(g.remove_interior_vertex(a), Err(GraphError::NotInterior(a)));
}

#[test]
fn subdivide_interpolates() {
    let (mut g, [_, root, mid, ..]) = branched();
    let e = g.vertex(mid).unwrap().parent.unwrap();
    let inserted = g.subdivide(e, 4).unwrap();
    assert_eq!(inserted.len(), 3);
    let first = g.vertex(inserted[0]).unwrap();
    assert!((first.position.x - 6.5).abs() < 1e-12);
    assert!((first.radius - 1.125).abs() < 1e-12);
    assert_eq!(g.edge(e).unwrap().dst, inserted[0]);
    assert_eq!(g.parent_vertex(mid).unwrap(), Some(inserted[2]));
    assert_eq!(g.parent_vertex(inserted[0]).unwrap(), Some(root));
    assert_eq!(g.segment_count(), 6);
    assert!(g.validate().is_ok());
}

#[test]
fn neighbourhood_radii() {
    let (mut g, [_, root, mid, tip, _]) = branched();
    g.update_rmax_nb().unwrap();
    let root_mid = g.segment_checked(g.vertex(mid).unwrap().parent.unwrap()).unwrap();
    // root only sees mid (the soma is not a neurite neighbour)
    assert_eq!(root_mid.src_rmax_nb, 1.5);
    // mid sees the side branch
    assert_eq!(root_mid.dst_rmax_nb, 2.0);
    let mid_tip = g.segment_checked(g.vertex(tip).unwrap().parent.unwrap()).unwrap();
    assert_eq!(mid_tip.dst_rmax_nb, 1.5);
    assert_eq!(g.soma_of(tip).unwrap(), g.soma_of(root).unwrap());
}

#[test]
fn bfs_visits_cell() {
    let (g, [soma, root, mid, tip, side]) = branched();
    assert_eq!(g.bfs_from(soma).unwrap(), vec![soma, root, mid, tip, side]);
}
