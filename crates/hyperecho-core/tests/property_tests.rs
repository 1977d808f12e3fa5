//! # Property-Based Tests
//!
//! Structural invariants of the substrate under random node/edge workloads.

#![allow(clippy::unwrap_used, clippy::panic)]

use hyperecho_core::{
    HyperEdge, HyperNode, Identity, NodeId, Substrate, resonance, substrate_from_bytes,
    substrate_to_bytes,
};
use proptest::collection::{btree_set, vec};
use proptest::prelude::*;
use std::collections::BTreeSet;

/// Build a substrate over nodes `n0..n{count}` with the given member sets.
fn build(count: usize, edges: &[BTreeSet<usize>]) -> Substrate {
    let substrate = Substrate::new();
    for i in 0..count {
        substrate.add_node(HyperNode::new(format!("n{i}"), "node"));
    }
    for (index, members) in edges.iter().enumerate() {
        let members = members.iter().map(|m| format!("n{}", m % count));
        substrate
            .add_edge(HyperEdge::new(format!("e{index}"), "edge", members))
            .expect("members exist");
    }
    substrate
}

fn edge_sets() -> impl Strategy<Value = (usize, Vec<BTreeSet<usize>>)> {
    (2usize..12).prop_flat_map(|count| {
        (
            Just(count),
            vec(btree_set(0..count, 1..4), 0..20),
        )
    })
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Repeated inserts of the same ids grow the table once per distinct id.
    #[test]
    fn duplicate_inserts_counted_once(ids in vec(0u16..50, 1..80)) {
        let substrate = Substrate::new();
        let mut accepted = 0usize;
        for id in &ids {
            if substrate.add_node(HyperNode::new(format!("n{id}"), "")) {
                accepted += 1;
            }
        }
        let distinct: BTreeSet<_> = ids.iter().collect();
        prop_assert_eq!(accepted, distinct.len());
        prop_assert_eq!(substrate.node_count(), distinct.len());
    }

    /// Adjacency is symmetric and never includes the node itself.
    #[test]
    fn connected_nodes_symmetric((count, edges) in edge_sets()) {
        let substrate = build(count, &edges);
        for i in 0..count {
            let id = NodeId::new(format!("n{i}"));
            let neighbors = substrate.connected_nodes(&id);
            prop_assert!(!neighbors.contains(&id));
            for other in &neighbors {
                prop_assert!(substrate.connected_nodes(other).contains(&id));
            }
        }
    }

    /// After removing a node no edge references it and unrelated edges survive.
    #[test]
    fn cascade_never_leaves_dangling_edges(
        (count, edges) in edge_sets(),
        victim in 0usize..12,
    ) {
        let substrate = build(count, &edges);
        let victim = NodeId::new(format!("n{}", victim % count));
        let untouched: BTreeSet<_> = substrate
            .edge_ids()
            .into_iter()
            .filter(|e| !substrate.members_of(e).contains(&victim))
            .collect();

        prop_assert!(substrate.remove_node(&victim));

        let remaining: BTreeSet<_> = substrate.edge_ids().into_iter().collect();
        prop_assert_eq!(remaining, untouched);
        prop_assert!(substrate.incident_edges(&victim).is_empty());
        prop_assert_eq!(substrate.persistence().edge_count(), substrate.edge_count());
    }

    /// Clustering coefficients stay within [0, 1].
    #[test]
    fn clustering_is_a_fraction((count, edges) in edge_sets()) {
        let substrate = build(count, &edges);
        for i in 0..count {
            let coefficient = substrate.clustering_coefficient(&format!("n{i}").into());
            prop_assert!((0.0..=1.0).contains(&coefficient));
        }
    }

    /// Propagation never lowers any activation and sets the source exactly.
    #[test]
    fn propagation_is_monotonic(
        (count, edges) in edge_sets(),
        source in 0usize..12,
        initial in 0.0f64..10.0,
    ) {
        let substrate = build(count, &edges);
        let before: Vec<f64> = (0..count)
            .map(|i| substrate.get_activation(&format!("n{i}").into()))
            .collect();
        let source = NodeId::new(format!("n{}", source % count));

        substrate.propagate(&source, initial);

        prop_assert!((substrate.get_activation(&source) - initial).abs() < 1e-12);
        for (i, old) in before.iter().enumerate() {
            let id = NodeId::new(format!("n{i}"));
            if id != source {
                prop_assert!(substrate.get_activation(&id) >= *old);
            }
        }
    }

    /// Snapshot bytes decode to the same tables.
    #[test]
    fn snapshot_bytes_preserve_tables((count, edges) in edge_sets()) {
        let substrate = build(count, &edges);
        let snapshot = substrate.snapshot();

        let decoded = substrate_from_bytes(&substrate_to_bytes(&snapshot).unwrap()).unwrap();
        prop_assert_eq!(decoded, snapshot);
    }

    /// Each distinct pattern hit multiplies the same base score by 1.2.
    #[test]
    fn resonance_compounds(text in "[a-z ]{1,40}") {
        let text = format!("{text} zzqx qqzy");
        let none = Identity::new("prop_identity");
        let one = none.clone().with_patterns(["zzqx"]);
        let two = none.clone().with_patterns(["zzqx", "qqzy"]);

        let r0 = resonance(&text, &none);
        let r1 = resonance(&text, &one);
        let r2 = resonance(&text, &two);

        prop_assert!(r0 > 0.0);
        prop_assert!(r2 > r1 && r1 > r0);
        prop_assert!((r1 / r0 - 1.2).abs() < 1e-9);
    }
}
