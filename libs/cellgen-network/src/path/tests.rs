use super::*;
use cellgen_geometry::Vec3;

fn straight(n: u32) -> NeuritePath {
    let mut path = NeuritePath::new(PathId(0), VertexId(0), VertexId(1), None);
    for k in 0..n {
        path.extend(EdgeId(k + 1), VertexId(k + 2));
    }
    path
}

fn surfaces(n: usize) -> Vec<CanalSurface> {
    (0..n)
        .map(|k| {
            let a = Vec3::X * (10.0 * k as f64);
            CanalSurface::linear(a, a + Vec3::X * 10.0, 1.0, 1.0).unwrap()
        })
        .collect()
}

#[test]
fn extend_keeps_vertex_edge_invariant() {
    let mut path = NeuritePath::new(PathId(3), VertexId(0), VertexId(7), None);
    assert_eq!(path.num_vertices(), path.num_edges() + 1);
    for k in 0..5 {
        path.extend(EdgeId(k), VertexId(10 + k));
        assert_eq!(path.num_vertices(), path.num_edges() + 1);
    }
    assert_eq!(path.start(), VertexId(7));
    assert_eq!(path.vertices().last(), Some(&VertexId(14)));
}

#[test]
fn bounding_box_is_cached_and_invalidated() {
    let mut path = straight(2);
    assert!(path.bounding_box().is_none());
    path.update_geometry(vec![0.0, 10.0, 20.0], 20.0, 1.0, surfaces(2));
    assert!(path.geometry_updated());
    assert!(!path.bounding_box_cached());
    let bb = path.bounding_box().unwrap();
    assert!(path.bounding_box_cached());
    // magnified radius 1.26
    assert!((bb.max.x - 21.26).abs() < 1e-9);
    assert!((bb.min.y + 1.26).abs() < 1e-9);

    path.extend(EdgeId(9), VertexId(9));
    assert!(!path.geometry_updated());
    assert!(!path.bounding_box_cached());
    assert!(path.bounding_box().is_none());
    assert!(path.parameters().is_empty());
}

#[test]
fn mismatched_geometry_is_not_marked_updated() {
    let mut path = straight(3);
    path.update_geometry(vec![0.0, 1.0, 2.0], 20.0, 10.0, surfaces(2));
    assert!(!path.geometry_updated());
    assert_eq!(path.magnified().len(), 2);
}

#[test]
fn degenerate_mark_drops_geometry_until_replaced() {
    let mut path = straight(2);
    path.update_geometry(vec![0.0, 10.0, 20.0], 20.0, 1.0, surfaces(2));
    path.mark_degenerate();
    assert!(path.is_degenerate());
    assert!(!path.geometry_updated());
    assert!(path.surfaces().is_empty());
    assert!(path.bounding_box().is_none());

    path.update_geometry(vec![0.0, 10.0, 20.0], 20.0, 1.0, surfaces(2));
    assert!(!path.is_degenerate());
    assert!(path.geometry_updated());
}

#[test]
fn segment_arc_length_uses_scale_factor() {
    let mut path = straight(2);
    path.update_geometry(vec![0.0, 0.5, 1.0], 20.0, 20.0, surfaces(2));
    assert!((path.segment_arc_length(1) - 10.0).abs() < 1e-12);
    assert_eq!(path.segment_arc_length(5), 0.0);
}

#[test]
fn tree_bfs_order() {
    let mut tree = PathTree::new(VertexId(0));
    tree.roots = vec![PathId(0), PathId(1)];
    tree.children.insert(PathId(0), vec![PathId(2), PathId(3)]);
    tree.children.insert(PathId(1), vec![PathId(4)]);
    tree.children.insert(PathId(2), vec![PathId(5)]);
    let order: Vec<u32> = tree.bfs().into_iter().map(|p| p.0).collect();
    assert_eq!(order, vec![0, 1, 2, 3, 4, 5]);
}
