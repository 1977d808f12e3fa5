//! # Substrate Invariant Tests (T0-T5)
//!
//! Each tier pins one externally observable guarantee of the substrate and
//! the kernel. A failure in any tier means callers can no longer rely on it.
//!
//! ## Tiers
//! - T0: Node identity (no silent overwrite)
//! - T1: Referential integrity and cascade delete
//! - T2: Structural metrics
//! - T3: Activation propagation
//! - T4: Resonance and state machine
//! - T5: Persistence round-trip

#![allow(clippy::unwrap_used, clippy::panic)]

use hyperecho_core::{
    CognitiveKernel, CognitiveState, EdgeId, HyperEdge, HyperError, HyperNode, Identity, NodeId,
    RedbPersistence, Substrate,
};
use std::collections::BTreeSet;
use std::sync::Arc;

fn triangle() -> Substrate {
    let substrate = Substrate::new();
    for id in ["A", "B", "C"] {
        assert!(substrate.add_node(HyperNode::new(id, id)));
    }
    substrate
        .add_edge(HyperEdge::new("ab", "link", ["A", "B"]))
        .expect("ab");
    substrate
        .add_edge(HyperEdge::new("bc", "link", ["B", "C"]))
        .expect("bc");
    substrate
        .add_edge(HyperEdge::new("ac", "link", ["A", "C"]))
        .expect("ac");
    substrate
}

// =============================================================================
// TIER T0: NODE IDENTITY
// =============================================================================

mod t0_node_identity {
    use super::*;

    /// T0.1: Second insert of the same id is refused.
    #[test]
    fn duplicate_insert_refused() {
        let substrate = Substrate::new();

        assert!(substrate.add_node(HyperNode::new("n", "first")));
        assert!(!substrate.add_node(HyperNode::new("n", "second")));

        assert_eq!(substrate.node_count(), 1);
        assert_eq!(substrate.get_node(&"n".into()).unwrap().label, "first");
    }

    /// T0.2: Update requires an existing id and replaces the whole node.
    #[test]
    fn update_is_full_replacement() {
        let substrate = Substrate::new();
        assert!(!substrate.update_node(HyperNode::new("n", "ghost")));

        substrate.add_node(HyperNode::new("n", "v1").with_attribute("a", "1"));
        assert!(substrate.update_node(HyperNode::new("n", "v2")));

        let node = substrate.get_node(&"n".into()).unwrap();
        assert_eq!(node.label, "v2");
        assert!(node.attributes.is_empty());
    }

    /// T0.3: Lookups of missing ids are absent, never errors.
    #[test]
    fn missing_ids_are_benign() {
        let substrate = Substrate::new();
        let ghost = NodeId::from("ghost");

        assert!(substrate.get_node(&ghost).is_none());
        assert!(!substrate.node_exists(&ghost));
        assert!(!substrate.remove_node(&ghost));
        assert!(!substrate.remove_edge(&"ghost".into()));
        assert!(substrate.connected_nodes(&ghost).is_empty());
        assert!(substrate.members_of(&"ghost".into()).is_empty());
        assert!(substrate.find_nodes_by_attribute("k", "v").is_empty());
    }
}

// =============================================================================
// TIER T1: REFERENTIAL INTEGRITY
// =============================================================================

mod t1_referential_integrity {
    use super::*;

    /// T1.1: An edge naming a missing node fails and is not stored.
    #[test]
    fn dangling_member_rejected() {
        let substrate = Substrate::new();
        substrate.add_node(HyperNode::new("a", ""));

        let result = substrate.add_edge(HyperEdge::new("e", "", ["a", "missing"]));

        match result {
            Err(HyperError::ReferentialIntegrity { edge, node }) => {
                assert_eq!(edge, EdgeId::from("e"));
                assert_eq!(node, NodeId::from("missing"));
            }
            other => panic!("expected referential integrity error, got {other:?}"),
        }
        assert_eq!(substrate.edge_count(), 0);
    }

    /// T1.2: Update applies the same validation.
    #[test]
    fn update_validates_members() {
        let substrate = triangle();

        assert!(!substrate
            .update_edge(HyperEdge::new("zz", "", ["A"]))
            .expect("absent id is benign"));
        assert!(substrate
            .update_edge(HyperEdge::new("ab", "", ["A", "Q"]))
            .is_err());
        assert_eq!(
            substrate.members_of(&"ab".into()),
            BTreeSet::from([NodeId::from("A"), NodeId::from("B")])
        );
    }

    /// T1.3: Removing a node removes exactly the edges referencing it.
    #[test]
    fn cascade_removes_only_incident_edges() {
        let substrate = Substrate::new();
        for id in ["1", "2", "3"] {
            substrate.add_node(HyperNode::new(id, ""));
        }
        substrate.add_edge(HyperEdge::new("e1", "", ["1", "2"])).unwrap();
        substrate.add_edge(HyperEdge::new("e2", "", ["1", "3"])).unwrap();
        substrate.add_edge(HyperEdge::new("e3", "", ["2", "3"])).unwrap();

        assert!(substrate.remove_node(&"1".into()));

        assert_eq!(substrate.node_count(), 2);
        assert_eq!(substrate.edge_ids(), vec!["e3".into()]);
        assert_eq!(substrate.persistence().edge_count(), 1);
        assert_eq!(substrate.persistence().node_count(), 2);
    }

    /// T1.4: A duplicate edge id is a benign false.
    #[test]
    fn duplicate_edge_is_false() {
        let substrate = triangle();
        assert!(!substrate
            .add_edge(HyperEdge::new("ab", "again", ["A", "C"]))
            .unwrap());
        assert_eq!(substrate.edge_count(), 3);
    }
}

// =============================================================================
// TIER T2: STRUCTURAL METRICS
// =============================================================================

mod t2_metrics {
    use super::*;

    /// T2.1: A complete triangle is fully clustered and fully dense.
    #[test]
    fn triangle_is_complete() {
        let substrate = triangle();

        for id in ["A", "B", "C"] {
            let coefficient = substrate.clustering_coefficient(&id.into());
            assert!((coefficient - 1.0).abs() < f64::EPSILON, "{id}: {coefficient}");
        }
        assert!((substrate.density() - 1.0).abs() < f64::EPSILON);
    }

    /// T2.2: Hyperedges count once towards density regardless of arity.
    #[test]
    fn density_is_pairwise() {
        let substrate = Substrate::new();
        for id in ["a", "b", "c", "d"] {
            substrate.add_node(HyperNode::new(id, ""));
        }
        substrate
            .add_edge(HyperEdge::new("all", "", ["a", "b", "c", "d"]))
            .unwrap();

        assert!((substrate.density() - 1.0 / 6.0).abs() < 1e-12);
        // One hyperedge closes every neighbor pair.
        assert!((substrate.clustering_coefficient(&"a".into()) - 1.0).abs() < f64::EPSILON);
    }

    /// T2.3: Degenerate inputs score zero.
    #[test]
    fn degenerate_metrics_are_zero() {
        let substrate = Substrate::new();
        assert!(substrate.density().abs() < f64::EPSILON);

        substrate.add_node(HyperNode::new("solo", ""));
        assert!(substrate.density().abs() < f64::EPSILON);
        assert!(substrate.clustering_coefficient(&"solo".into()).abs() < f64::EPSILON);
    }

    /// T2.4: Metrics summary agrees with the individual queries.
    #[test]
    fn metrics_summary_matches_queries() {
        let substrate = triangle();
        let metrics = substrate.metrics(Some(&"A".into()));

        assert_eq!(metrics.node_count, 3);
        assert_eq!(metrics.edge_count, 3);
        assert_eq!(metrics.max_arity, 2);
        let focus = metrics.focus.unwrap();
        assert_eq!(focus.connections, 2);
        assert_eq!(focus.incident_edges, 2);
        assert!((focus.clustering_coefficient - 1.0).abs() < f64::EPSILON);
    }
}

// =============================================================================
// TIER T3: ACTIVATION PROPAGATION
// =============================================================================

mod t3_propagation {
    use super::*;

    /// Chain s - a - b - c plus an isolated node.
    fn chain() -> Substrate {
        let substrate = Substrate::new();
        for id in ["s", "a", "b", "c", "island"] {
            substrate.add_node(HyperNode::new(id, ""));
        }
        substrate.add_edge(HyperEdge::new("sa", "", ["s", "a"])).unwrap();
        substrate.add_edge(HyperEdge::new("ab", "", ["a", "b"])).unwrap();
        substrate.add_edge(HyperEdge::new("bc", "", ["b", "c"])).unwrap();
        substrate
    }

    /// T3.1: Source is set, nodes within two hops rise, others stay put.
    #[test]
    fn two_hop_bound() {
        let substrate = chain();
        substrate.update_activation(&"c".into(), 0.3);

        substrate.propagate(&"s".into(), 1.0);

        assert!((substrate.get_activation(&"s".into()) - 1.0).abs() < f64::EPSILON);
        assert!((substrate.get_activation(&"a".into()) - 0.7).abs() < 1e-12);
        assert!((substrate.get_activation(&"b".into()) - 0.7).abs() < 1e-12);
        assert!((substrate.get_activation(&"c".into()) - 0.3).abs() < f64::EPSILON);
        assert!(substrate.get_activation(&"island".into()).abs() < f64::EPSILON);
    }

    /// T3.2: Repeated propagation accumulates on reached nodes.
    #[test]
    fn propagation_accumulates() {
        let substrate = chain();
        substrate.propagate(&"s".into(), 1.0);
        substrate.propagate(&"s".into(), 1.0);

        assert!((substrate.get_activation(&"a".into()) - 1.4).abs() < 1e-12);
        assert!((substrate.get_activation(&"s".into()) - 1.0).abs() < f64::EPSILON);
    }

    /// T3.3: Unknown source is a no-op and does not fire the hook.
    #[test]
    fn unknown_source_is_noop() {
        let fired = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let flag = Arc::clone(&fired);
        let substrate = Substrate::new().with_propagation_hook(move |_, _, _| {
            flag.store(true, std::sync::atomic::Ordering::SeqCst);
        });

        substrate.propagate(&"nobody".into(), 1.0);

        assert!(!fired.load(std::sync::atomic::Ordering::SeqCst));
        assert_eq!(substrate.node_count(), 0);
    }

    /// T3.4: A single hyperedge makes all members one hop apart.
    #[test]
    fn hyperedge_members_are_adjacent() {
        let substrate = Substrate::new();
        for id in ["s", "x", "y", "z"] {
            substrate.add_node(HyperNode::new(id, ""));
        }
        substrate
            .add_edge(HyperEdge::new("group", "", ["s", "x", "y", "z"]))
            .unwrap();

        substrate.propagate(&"s".into(), 2.0);

        for id in ["x", "y", "z"] {
            assert!((substrate.get_activation(&id.into()) - 1.4).abs() < 1e-12);
        }
    }
}

// =============================================================================
// TIER T4: RESONANCE AND STATE MACHINE
// =============================================================================

mod t4_kernel {
    use super::*;

    fn kernel() -> CognitiveKernel {
        let kernel = CognitiveKernel::new();
        kernel.initialize(Identity::new("test_identity").with_patterns(["cognitive", "test"]));
        kernel
    }

    /// T4.1: Empty text never resonates.
    #[test]
    fn empty_text_is_zero() {
        assert!(kernel().calculate_resonance("").abs() < f64::EPSILON);
        assert!(CognitiveKernel::new().calculate_resonance("anything").abs() < f64::EPSILON);
    }

    /// T4.2: Matching patterns raise resonance.
    #[test]
    fn pattern_matches_raise_resonance() {
        let kernel = kernel();
        let matching = kernel.calculate_resonance("test cognitive data");
        let plain = kernel.calculate_resonance("unrelated information");

        assert!(matching > plain);
        assert!(matching > 0.0 && plain > 0.0);
    }

    /// T4.3: A failing hook leaves the machine where it started.
    #[test]
    fn failed_processing_rolls_back() {
        let kernel = kernel();
        assert_eq!(kernel.state(), CognitiveState::Awakening);

        let result: Result<f64, &str> = kernel.process_signal_with("signal", |_, _| Err("boom"));

        assert_eq!(result, Err("boom"));
        assert_eq!(kernel.state(), CognitiveState::Awakening);
    }

    /// T4.4: Successful processing ends in Reflecting and counts.
    #[test]
    fn processing_reflects() {
        let kernel = kernel();
        kernel.process_signal("one");
        kernel.process_signal("two");

        assert_eq!(kernel.state(), CognitiveState::Reflecting);
        assert_eq!(kernel.process_count(), 2);
        assert_eq!(kernel.memory().retrieve("last_signal").as_deref(), Some("two"));
    }
}

// =============================================================================
// TIER T5: PERSISTENCE ROUND-TRIP
// =============================================================================

mod t5_round_trip {
    use super::*;
    use tempfile::tempdir;

    /// T5.1: save, clear, load restores counts and attributes.
    #[test]
    fn save_clear_load() {
        let temp = tempdir().expect("temp dir");
        let store = RedbPersistence::open(temp.path().join("rt.redb")).expect("open");
        let substrate = Substrate::with_persistence(store);

        for i in 0..5 {
            substrate.add_node(
                HyperNode::new(format!("n{i}"), "node").with_attribute("index", i.to_string()),
            );
        }
        for i in 0..4 {
            substrate
                .add_edge(HyperEdge::new(
                    format!("e{i}"),
                    "next",
                    [format!("n{i}"), format!("n{}", i + 1)],
                ))
                .unwrap();
        }

        assert!(substrate.save());
        substrate.clear();
        assert_eq!(substrate.node_count(), 0);
        assert_eq!(substrate.edge_count(), 0);

        assert!(substrate.load());
        assert_eq!(substrate.node_count(), 5);
        assert_eq!(substrate.edge_count(), 4);
        for i in 0..5 {
            let node = substrate.get_node(&format!("n{i}").into()).unwrap();
            assert_eq!(node.attribute("index"), Some(i.to_string().as_str()));
        }
    }

    /// T5.2: A second substrate over the same file sees the same universe.
    #[test]
    fn reopen_reconstructs_tables() {
        let temp = tempdir().expect("temp dir");
        let path = temp.path().join("reopen.redb");
        {
            let substrate = Substrate::with_persistence(RedbPersistence::open(&path).expect("open"));
            substrate.add_node(HyperNode::new("a", ""));
            substrate.add_node(HyperNode::new("b", ""));
            substrate.add_edge(HyperEdge::new("ab", "", ["a", "b"])).unwrap();
            substrate.remove_node(&"b".into());
        }

        let substrate = Substrate::with_persistence(RedbPersistence::open(&path).expect("reopen"));
        assert!(substrate.load());
        assert_eq!(substrate.node_ids(), vec!["a".into()]);
        assert_eq!(substrate.edge_count(), 0);
    }
}
