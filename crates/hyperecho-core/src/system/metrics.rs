//! Substrate-wide and per-node metrics.

use crate::graph::Hypergraph;
use crate::types::NodeId;
use serde::{Deserialize, Serialize};

/// Maximum number of neighbor ids listed in [`NodeMetrics::connected`].
pub const MAX_LISTED_NEIGHBORS: usize = 10;

/// Metrics for the whole substrate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubstrateMetrics {
    /// Total number of nodes.
    pub node_count: usize,
    /// Total number of hyperedges.
    pub edge_count: usize,
    /// `edge_count / C(node_count, 2)`.
    pub density: f64,
    /// Sum of all node activations.
    pub total_activation: f64,
    /// Largest member count of any hyperedge.
    pub max_arity: usize,
    /// Per-node figures, when a focus node was requested and exists.
    pub focus: Option<NodeMetrics>,
}

/// Metrics for a single node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeMetrics {
    pub id: NodeId,
    /// Number of distinct connected nodes.
    pub connections: usize,
    /// Number of hyperedges containing the node.
    pub incident_edges: usize,
    pub clustering_coefficient: f64,
    pub activation: f64,
    /// First connected node ids in id order, at most `MAX_LISTED_NEIGHBORS`.
    pub connected: Vec<NodeId>,
}

impl SubstrateMetrics {
    /// Metrics of an empty substrate.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            node_count: 0,
            edge_count: 0,
            density: 0.0,
            total_activation: 0.0,
            max_arity: 0,
            focus: None,
        }
    }

    /// Compute metrics from a hypergraph.
    #[must_use]
    pub fn from_graph(graph: &Hypergraph, focus: Option<&NodeId>) -> Self {
        let focus = focus
            .filter(|id| graph.contains_node(id))
            .map(|id| NodeMetrics::from_graph(graph, id));

        Self {
            node_count: graph.node_count(),
            edge_count: graph.edge_count(),
            density: graph.density(),
            total_activation: graph.nodes().map(|n| n.activation).sum(),
            max_arity: graph.edges().map(|e| e.arity()).max().unwrap_or(0),
            focus,
        }
    }
}

impl NodeMetrics {
    fn from_graph(graph: &Hypergraph, id: &NodeId) -> Self {
        let connected = graph.connected_nodes(id);
        Self {
            id: id.clone(),
            connections: connected.len(),
            incident_edges: graph.incident_edges(id).len(),
            clustering_coefficient: graph.clustering_coefficient(id),
            activation: graph.activation(id),
            connected: connected.into_iter().take(MAX_LISTED_NEIGHBORS).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::types::{HyperEdge, HyperNode};

    fn fan(size: usize) -> Hypergraph {
        let mut graph = Hypergraph::new();
        graph.add_node(HyperNode::new("hub", "hub"));
        let mut members = vec!["hub".to_string()];
        for i in 0..size {
            let id = format!("leaf{i:02}");
            graph.add_node(HyperNode::new(id.as_str(), "leaf").with_activation(0.5));
            members.push(id);
        }
        graph.add_edge(HyperEdge::new("fan", "fan", members)).unwrap();
        graph
    }

    #[test]
    fn empty_graph_metrics() {
        let metrics = SubstrateMetrics::from_graph(&Hypergraph::new(), None);
        assert_eq!(metrics, SubstrateMetrics::empty());
    }

    #[test]
    fn whole_graph_figures() {
        let metrics = SubstrateMetrics::from_graph(&fan(3), None);
        assert_eq!(metrics.node_count, 4);
        assert_eq!(metrics.edge_count, 1);
        assert_eq!(metrics.max_arity, 4);
        assert!((metrics.total_activation - 1.5).abs() < 1e-12);
        assert!((metrics.density - 1.0 / 6.0).abs() < 1e-12);
        assert!(metrics.focus.is_none());
    }

    #[test]
    fn focus_lists_at_most_ten_neighbors() {
        let graph = fan(12);
        let metrics = SubstrateMetrics::from_graph(&graph, Some(&"hub".into()));
        let focus = metrics.focus.unwrap();

        assert_eq!(focus.connections, 12);
        assert_eq!(focus.incident_edges, 1);
        assert_eq!(focus.connected.len(), MAX_LISTED_NEIGHBORS);
        assert_eq!(focus.connected[0], NodeId::from("leaf00"));
        assert!((focus.clustering_coefficient - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_focus_is_skipped() {
        let metrics = SubstrateMetrics::from_graph(&fan(1), Some(&"ghost".into()));
        assert!(metrics.focus.is_none());
    }
}
