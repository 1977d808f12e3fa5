//! # Hypergraph Tables
//!
//! The lock-free core of the substrate.
//!
//! `Hypergraph` owns the node and edge tables and implements every query,
//! metric and mutation without any synchronization. `Substrate` wraps it in
//! a single mutex and calls into these functions while holding that lock
//! exactly once, so composite operations (cascade delete, clustering,
//! propagation) never re-enter a lock.
//!
//! All tables use `BTreeMap` for deterministic ordering.

use crate::primitives::{PROPAGATION_HOPS, PROPAGATION_RETENTION};
use crate::types::{EdgeId, HyperEdge, HyperError, HyperNode, NodeId, clamp_activation};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

// =============================================================================
// HYPERGRAPH
// =============================================================================

/// Node and edge tables plus the per-instance id sequence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Hypergraph {
    nodes: BTreeMap<NodeId, HyperNode>,
    edges: BTreeMap<EdgeId, HyperEdge>,
    next_sequence: u64,
}

impl Hypergraph {
    /// Create an empty hypergraph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &HyperNode> {
        self.nodes.values()
    }

    /// All edges in id order.
    pub fn edges(&self) -> impl Iterator<Item = &HyperEdge> {
        self.edges.values()
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Empty both tables. The id sequence keeps counting.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    /// Next value of the instance-owned sequence.
    pub fn next_sequence(&mut self) -> u64 {
        let value = self.next_sequence;
        self.next_sequence = self.next_sequence.saturating_add(1);
        value
    }

    // -------------------------------------------------------------------------
    // Nodes
    // -------------------------------------------------------------------------

    /// Insert `node` if its id is new. Never overwrites.
    pub fn add_node(&mut self, mut node: HyperNode) -> bool {
        if self.nodes.contains_key(&node.id) {
            return false;
        }
        node.activation = clamp_activation(node.activation);
        self.nodes.insert(node.id.clone(), node);
        true
    }

    /// Remove a node and every edge that references it.
    ///
    /// Returns the ids of the cascaded edges, or `None` if the node was absent.
    pub fn remove_node(&mut self, id: &NodeId) -> Option<Vec<EdgeId>> {
        if !self.nodes.contains_key(id) {
            return None;
        }
        let cascaded: Vec<EdgeId> = self.incident_edges(id).into_iter().collect();
        for edge_id in &cascaded {
            self.edges.remove(edge_id);
        }
        self.nodes.remove(id);
        Some(cascaded)
    }

    /// Replace an existing node wholesale.
    pub fn update_node(&mut self, mut node: HyperNode) -> bool {
        match self.nodes.get_mut(&node.id) {
            Some(slot) => {
                node.activation = clamp_activation(node.activation);
                *slot = node;
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn get_node(&self, id: &NodeId) -> Option<&HyperNode> {
        self.nodes.get(id)
    }

    #[must_use]
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    // -------------------------------------------------------------------------
    // Edges
    // -------------------------------------------------------------------------

    /// Check that every member of `edge` is in the node table.
    pub fn validate_members(&self, edge: &HyperEdge) -> Result<(), HyperError> {
        match edge.members.iter().find(|m| !self.nodes.contains_key(*m)) {
            Some(missing) => Err(HyperError::ReferentialIntegrity {
                edge: edge.id.clone(),
                node: missing.clone(),
            }),
            None => Ok(()),
        }
    }

    /// Insert `edge` if its id is new and all members exist.
    ///
    /// A duplicate id is `Ok(false)`. A missing member is an error and
    /// nothing is stored.
    pub fn add_edge(&mut self, edge: HyperEdge) -> Result<bool, HyperError> {
        if self.edges.contains_key(&edge.id) {
            return Ok(false);
        }
        self.validate_members(&edge)?;
        self.edges.insert(edge.id.clone(), edge);
        Ok(true)
    }

    /// Replace an existing edge, with the same member validation as insert.
    pub fn update_edge(&mut self, edge: HyperEdge) -> Result<bool, HyperError> {
        if !self.edges.contains_key(&edge.id) {
            return Ok(false);
        }
        self.validate_members(&edge)?;
        self.edges.insert(edge.id.clone(), edge);
        Ok(true)
    }

    pub fn remove_edge(&mut self, id: &EdgeId) -> bool {
        self.edges.remove(id).is_some()
    }

    #[must_use]
    pub fn get_edge(&self, id: &EdgeId) -> Option<&HyperEdge> {
        self.edges.get(id)
    }

    #[must_use]
    pub fn contains_edge(&self, id: &EdgeId) -> bool {
        self.edges.contains_key(id)
    }

    // -------------------------------------------------------------------------
    // Relationship queries
    // -------------------------------------------------------------------------

    /// Every other member of every edge containing `id`.
    #[must_use]
    pub fn connected_nodes(&self, id: &NodeId) -> BTreeSet<NodeId> {
        self.edges
            .values()
            .filter(|edge| edge.contains(id))
            .flat_map(|edge| edge.members.iter())
            .filter(|member| *member != id)
            .cloned()
            .collect()
    }

    /// Every edge whose members contain `id`.
    #[must_use]
    pub fn incident_edges(&self, id: &NodeId) -> BTreeSet<EdgeId> {
        self.edges
            .values()
            .filter(|edge| edge.contains(id))
            .map(|edge| edge.id.clone())
            .collect()
    }

    /// Members of an edge, empty if the edge is absent.
    #[must_use]
    pub fn members_of(&self, edge_id: &EdgeId) -> BTreeSet<NodeId> {
        self.edges
            .get(edge_id)
            .map(|edge| edge.members.clone())
            .unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Attribute / pattern search
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn find_nodes_by_attribute(&self, key: &str, value: &str) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|node| node.attributes.get(key).is_some_and(|v| v == value))
            .map(|node| node.id.clone())
            .collect()
    }

    #[must_use]
    pub fn find_edges_by_attribute(&self, key: &str, value: &str) -> Vec<EdgeId> {
        self.edges
            .values()
            .filter(|edge| edge.attributes.get(key).is_some_and(|v| v == value))
            .map(|edge| edge.id.clone())
            .collect()
    }

    /// Nodes whose identity carries `pattern` exactly.
    #[must_use]
    pub fn find_nodes_by_pattern(&self, pattern: &str) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|node| node.identity.has_pattern(pattern))
            .map(|node| node.id.clone())
            .collect()
    }

    // -------------------------------------------------------------------------
    // Activation
    // -------------------------------------------------------------------------

    /// Nodes within `max_hops` of `source` by hyperedge membership.
    /// The source itself is never included.
    #[must_use]
    pub fn reachable(&self, source: &NodeId, max_hops: usize) -> BTreeSet<NodeId> {
        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::new();

        if !self.nodes.contains_key(source) {
            return visited;
        }

        visited.insert(source.clone());
        queue.push_back((source.clone(), 0usize));

        while let Some((current, hops)) = queue.pop_front() {
            if hops >= max_hops {
                continue;
            }
            for neighbor in self.connected_nodes(&current) {
                if visited.insert(neighbor.clone()) {
                    queue.push_back((neighbor, hops.saturating_add(1)));
                }
            }
        }

        visited.remove(source);
        visited
    }

    /// Set the source activation and add `initial * PROPAGATION_RETENTION`
    /// to every node within `PROPAGATION_HOPS`.
    ///
    /// Returns the reached set, or `None` if the source is absent.
    pub fn propagate(&mut self, source: &NodeId, initial: f64) -> Option<BTreeSet<NodeId>> {
        let node = self.nodes.get_mut(source)?;
        node.activation = clamp_activation(initial);

        let reached = self.reachable(source, PROPAGATION_HOPS);
        let delta = initial * PROPAGATION_RETENTION;
        for id in &reached {
            if let Some(target) = self.nodes.get_mut(id) {
                target.activation = clamp_activation(target.activation + delta);
            }
        }
        Some(reached)
    }

    /// Overwrite a node's activation. Returns false if the node is absent.
    pub fn set_activation(&mut self, id: &NodeId, value: f64) -> bool {
        match self.nodes.get_mut(id) {
            Some(node) => {
                node.activation = clamp_activation(value);
                true
            }
            None => false,
        }
    }

    /// Activation of a node, zero if absent.
    #[must_use]
    pub fn activation(&self, id: &NodeId) -> f64 {
        self.nodes.get(id).map_or(0.0, |node| node.activation)
    }

    // -------------------------------------------------------------------------
    // Structural metrics
    // -------------------------------------------------------------------------

    /// Fraction of neighbor pairs of `id` that are themselves connected.
    #[must_use]
    pub fn clustering_coefficient(&self, id: &NodeId) -> f64 {
        let neighbors: Vec<NodeId> = self.connected_nodes(id).into_iter().collect();
        let n = neighbors.len();
        if n < 2 {
            return 0.0;
        }

        let adjacency: Vec<BTreeSet<NodeId>> =
            neighbors.iter().map(|v| self.connected_nodes(v)).collect();

        let mut closed = 0usize;
        for (i, adjacent) in adjacency.iter().enumerate() {
            for other in &neighbors[i + 1..] {
                if adjacent.contains(other) {
                    closed += 1;
                }
            }
        }

        closed as f64 / pair_count(n) as f64
    }

    /// `edge_count / C(node_count, 2)`, zero below two nodes.
    ///
    /// Each edge counts as one connection whatever its arity.
    #[must_use]
    pub fn density(&self) -> f64 {
        let n = self.nodes.len();
        if n < 2 {
            return 0.0;
        }
        self.edges.len() as f64 / pair_count(n) as f64
    }
}

/// `C(n, 2)`.
fn pair_count(n: usize) -> usize {
    n.saturating_mul(n.saturating_sub(1)) / 2
}

// =============================================================================
// TESTS
// =============================================================================
