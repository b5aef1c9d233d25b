#![cfg(not(feature = "loom"))]
//! Connection, validity, depth and reduction behavior.

use callflow::{Graph, GraphError, from};

#[test]
fn empty_graph_is_valid() {
    let graph = Graph::new();
    assert!(graph.valid());
}

#[test]
fn connected_graph_is_valid() {
    let mut graph = Graph::new();
    let a = graph.insert(|| ());
    graph.connect(a, || ()).unwrap();
    assert!(graph.valid());
}

#[test]
fn validity_flips_when_last_slot_binds() {
    let mut graph = Graph::new();
    let a = graph.insert(|| 1_u32);
    let b = graph.insert(|| 2_u32);
    let c = graph.insert(|| 3_u32);
    let d = graph.insert(|| 4_u32);

    let e = graph
        .connect_to(a, |_: u32, _: u32, _: u32, _: u32| (), 0)
        .unwrap();
    assert!(!graph.valid());

    graph.connect_to(b, e, 1).unwrap();
    assert!(!graph.valid());

    graph.connect_to(c, e, 2).unwrap();
    assert!(!graph.valid());

    graph.connect_to(d, e, 3).unwrap();
    assert!(graph.valid());
}

#[test]
fn empty_graph_depth_is_one() {
    let graph = Graph::new();
    assert_eq!(graph.depth(), 1);
}

#[test]
fn depth_counts_parallel_paths() {
    let mut graph = Graph::new();
    let a = graph.insert(|| ());
    graph.connect(a, || ()).unwrap();
    graph.connect(a, || ()).unwrap();
    assert_eq!(graph.depth(), 2);

    graph.connect(a, || ()).unwrap();
    assert_eq!(graph.depth(), 3);
}

#[test]
fn reduction_decreases_depth_and_preserves_validity() {
    let mut graph = Graph::new();
    let a = graph.insert(|| ());
    let b = graph.connect(a, || ()).unwrap();
    let c = graph.connect(a, || ()).unwrap();
    let d = graph.connect(a, || ()).unwrap();
    graph.connect(b, c).unwrap();
    graph.connect(b, d).unwrap();
    graph.connect(c, d).unwrap();
    let e = graph.connect(c, || ()).unwrap();
    graph.connect(d, e).unwrap();

    assert_eq!(graph.depth(), 6);
    assert!(graph.valid());

    graph.reduce();

    // The surviving edges form the chain a -> b -> c -> d -> e.
    assert_eq!(graph.depth(), 1);
    assert!(graph.valid());
}

#[test]
fn reduction_is_idempotent() {
    let mut graph = Graph::new();
    let a = graph.insert(|| ());
    let b = graph.connect(a, || ()).unwrap();
    let c = graph.connect(a, || ()).unwrap();
    graph.connect(b, c).unwrap();

    graph.reduce();
    let depth = graph.depth();
    let leaves = graph.leaves();

    graph.reduce();
    assert_eq!(graph.depth(), depth);
    assert_eq!(graph.leaves(), leaves);
}

#[test]
fn leaves_counts_childless_nodes() {
    let mut graph = Graph::new();
    // Root alone is the only leaf.
    assert_eq!(graph.leaves(), 1);

    let a = graph.insert(|| ());
    assert_eq!(graph.leaves(), 1);

    graph.connect(a, || ()).unwrap();
    graph.connect(a, || ()).unwrap();
    assert_eq!(graph.leaves(), 2);
}

#[test]
fn unknown_source_is_rejected() {
    let mut other = Graph::new();
    let foreign = other.insert(|| ());

    let mut graph = Graph::new();
    let before_depth = graph.depth();
    let before_leaves = graph.leaves();

    let err = graph.connect(foreign, || ()).unwrap_err();
    assert_eq!(err, GraphError::SourceNotFound);
    assert_eq!(graph.depth(), before_depth);
    assert_eq!(graph.leaves(), before_leaves);
}

#[test]
fn unknown_destination_vertex_is_rejected() {
    let mut other = Graph::new();
    let foreign = other.insert(|| ());

    let mut graph = Graph::new();
    let a = graph.insert(|| ());
    let err = graph.connect(a, foreign).unwrap_err();
    assert_eq!(err, GraphError::UnknownVertex);
}

#[test]
fn self_connection_is_a_cycle() {
    let mut graph = Graph::new();
    let a = graph.insert(|| ());
    assert_eq!(graph.connect(a, a).unwrap_err(), GraphError::Cycle);
}

#[test]
fn back_edge_is_a_cycle() {
    let mut graph = Graph::new();
    let a = graph.insert(|| ());
    let b = graph.connect(a, || ()).unwrap();
    assert_eq!(graph.connect(b, a).unwrap_err(), GraphError::Cycle);
}

#[test]
fn long_back_edge_is_a_cycle() {
    let mut graph = Graph::new();
    let a = graph.insert(|| 0_u32);
    let b = graph.insert(|| 1_u32);
    let c = graph.connect_to(a, |i: u32, j: u32| i + j, 0).unwrap();
    graph.connect_to(b, c, 1).unwrap();
    let d = graph.connect_to(c, |_: u32| (), 0).unwrap();

    assert_eq!(graph.connect(d, a).unwrap_err(), GraphError::Cycle);
}

#[test]
fn rejected_cycle_leaves_graph_unchanged() {
    let mut graph = Graph::new();
    let a = graph.insert(|| ());
    let b = graph.connect(a, || ()).unwrap();

    let depth = graph.depth();
    let leaves = graph.leaves();
    assert_eq!(graph.connect(b, a).unwrap_err(), GraphError::Cycle);
    assert_eq!(graph.depth(), depth);
    assert_eq!(graph.leaves(), leaves);
    assert!(graph.valid());
}

#[test]
fn slot_out_of_range_is_rejected() {
    let mut graph = Graph::new();
    let a = graph.insert(|| 1_u32);
    let err = graph.connect_to(a, |_: u32| (), 3).unwrap_err();
    assert_eq!(
        err,
        GraphError::SlotOutOfRange { slot: 3, arity: 1 }
    );
}

#[test]
fn slot_type_mismatch_is_rejected() {
    let mut graph = Graph::new();
    let a = graph.insert(|| 1_u32);
    let b = graph.insert(|| "text");
    let c = graph.connect_to(a, |_: u32, _: u32| (), 0).unwrap();

    let err = graph.connect_to(b, c, 1).unwrap_err();
    assert!(matches!(err, GraphError::SlotType { .. }));
    // Slot one is still unbound after the rejected connection.
    assert!(!graph.valid());
}

#[test]
fn projection_type_mismatch_is_rejected() {
    let mut graph = Graph::new();
    let a = graph.insert(|| (1_u32, "two"));
    let b = graph.connect_from(a, from::<0>(), |_: u32| (), 0).unwrap();

    // Component one is a string; feeding it into a u32 slot must fail.
    let err = graph.connect_from(a, from::<1>(), b, 0).unwrap_err();
    assert!(matches!(err, GraphError::SlotType { .. }));
}

#[test]
fn vertices_compare_by_node_identity() {
    let mut graph = Graph::new();
    let a = graph.insert(|| ());
    let b = graph.insert(|| ());
    let a_again = a;
    assert_eq!(a, a_again);
    assert_ne!(a, b);
}

#[test]
fn connections_through_vertex_handles() {
    let mut graph = Graph::new();
    let a = graph.insert(|| (1_u32, 2_u32));
    let b = graph.connect_from(a, from::<0>(), |_: u32, _: u32| (), 0).unwrap();
    graph.connect_from(a, from::<1>(), b, 1).unwrap();
    assert!(graph.valid());
    assert_eq!(graph.leaves(), 1);
}
