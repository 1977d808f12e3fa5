//! # Hypergraph Substrate
//!
//! The shared, thread-safe hypergraph store.
//!
//! A `Substrate` owns one mutex around its `Hypergraph` tables. Every public
//! operation takes that lock exactly once and calls the lock-free functions
//! on `Hypergraph`; nothing here calls another public `Substrate` method
//! while holding the lock. The propagation hook runs after the lock is
//! released.
//!
//! Every mutation is mirrored into the persistence strategy while the lock
//! is held. Mirroring is best-effort: a failed mirror write is counted in
//! [`Substrate::mirror_failures`] and the next [`Substrate::save`] pushes the
//! full tables again.

use crate::graph::Hypergraph;
use crate::storage::{MemoryPersistence, SubstratePersistence};
use crate::system::SubstrateMetrics;
use crate::types::{EdgeId, HyperEdge, HyperError, HyperNode, NodeId};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Callback fired after propagation with `(source, reached, initial_activation)`.
pub type PropagationHook = Box<dyn Fn(&NodeId, &BTreeSet<NodeId>, f64) + Send + Sync>;

/// Thread-safe hypergraph with a pluggable persistence strategy.
pub struct Substrate<P = MemoryPersistence> {
    graph: Mutex<Hypergraph>,
    persistence: P,
    on_propagation: Option<PropagationHook>,
    mirror_failures: AtomicU64,
}

impl<P> fmt::Debug for Substrate<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let graph = self.graph.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Substrate")
            .field("node_count", &graph.node_count())
            .field("edge_count", &graph.edge_count())
            .field("mirror_failures", &self.mirror_failures.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl Substrate<MemoryPersistence> {
    /// Create an empty substrate backed by in-memory persistence.
    #[must_use]
    pub fn new() -> Self {
        Self::with_persistence(MemoryPersistence::new())
    }
}

impl Default for Substrate<MemoryPersistence> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: SubstratePersistence> Substrate<P> {
    /// Create an empty substrate that mirrors into `persistence`.
    #[must_use]
    pub fn with_persistence(persistence: P) -> Self {
        Self {
            graph: Mutex::new(Hypergraph::new()),
            persistence,
            on_propagation: None,
            mirror_failures: AtomicU64::new(0),
        }
    }

    /// Install a hook that runs after every successful propagation.
    #[must_use]
    pub fn with_propagation_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&NodeId, &BTreeSet<NodeId>, f64) + Send + Sync + 'static,
    {
        self.on_propagation = Some(Box::new(hook));
        self
    }

    /// The active persistence strategy.
    #[must_use]
    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    /// Number of mirror writes that failed since construction.
    #[must_use]
    pub fn mirror_failures(&self) -> u64 {
        self.mirror_failures.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, Hypergraph> {
        self.graph.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn mirror<T>(&self, result: Result<T, HyperError>) {
        if result.is_err() {
            self.mirror_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn mirror_node(&self, graph: &Hypergraph, id: &NodeId) {
        if let Some(node) = graph.get_node(id) {
            self.mirror(self.persistence.save_node(node));
        }
    }

    fn mirror_edge(&self, graph: &Hypergraph, id: &EdgeId) {
        if let Some(edge) = graph.get_edge(id) {
            self.mirror(self.persistence.save_edge(edge));
        }
    }

    // =========================================================================
    // NODE OPERATIONS
    // =========================================================================

    /// Insert `node` if its id is new. Returns false on a duplicate id.
    pub fn add_node(&self, node: HyperNode) -> bool {
        let mut graph = self.lock();
        let id = node.id.clone();
        if !graph.add_node(node) {
            return false;
        }
        self.mirror_node(&graph, &id);
        true
    }

    /// Remove a node and cascade to every edge referencing it.
    pub fn remove_node(&self, id: &NodeId) -> bool {
        let mut graph = self.lock();
        let Some(cascaded) = graph.remove_node(id) else {
            return false;
        };
        for edge_id in &cascaded {
            self.mirror(self.persistence.remove_edge(edge_id));
        }
        self.mirror(self.persistence.remove_node(id));
        true
    }

    /// Replace an existing node. Returns false if the id is absent.
    pub fn update_node(&self, node: HyperNode) -> bool {
        let mut graph = self.lock();
        let id = node.id.clone();
        if !graph.update_node(node) {
            return false;
        }
        self.mirror_node(&graph, &id);
        true
    }

    #[must_use]
    pub fn get_node(&self, id: &NodeId) -> Option<HyperNode> {
        self.lock().get_node(id).cloned()
    }

    #[must_use]
    pub fn node_exists(&self, id: &NodeId) -> bool {
        self.lock().contains_node(id)
    }

    // =========================================================================
    // EDGE OPERATIONS
    // =========================================================================

    /// Insert `edge` if its id is new.
    ///
    /// Fails with [`HyperError::ReferentialIntegrity`] if any member is not
    /// in the node table; the edge is not stored in that case.
    pub fn add_edge(&self, edge: HyperEdge) -> Result<bool, HyperError> {
        let mut graph = self.lock();
        let id = edge.id.clone();
        if !graph.add_edge(edge)? {
            return Ok(false);
        }
        self.mirror_edge(&graph, &id);
        Ok(true)
    }

    /// Replace an existing edge, validating members like [`add_edge`](Self::add_edge).
    pub fn update_edge(&self, edge: HyperEdge) -> Result<bool, HyperError> {
        let mut graph = self.lock();
        let id = edge.id.clone();
        if !graph.update_edge(edge)? {
            return Ok(false);
        }
        self.mirror_edge(&graph, &id);
        Ok(true)
    }

    pub fn remove_edge(&self, id: &EdgeId) -> bool {
        let mut graph = self.lock();
        if !graph.remove_edge(id) {
            return false;
        }
        self.mirror(self.persistence.remove_edge(id));
        true
    }

    #[must_use]
    pub fn get_edge(&self, id: &EdgeId) -> Option<HyperEdge> {
        self.lock().get_edge(id).cloned()
    }

    #[must_use]
    pub fn edge_exists(&self, id: &EdgeId) -> bool {
        self.lock().contains_edge(id)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    #[must_use]
    pub fn connected_nodes(&self, id: &NodeId) -> BTreeSet<NodeId> {
        self.lock().connected_nodes(id)
    }

    #[must_use]
    pub fn incident_edges(&self, id: &NodeId) -> BTreeSet<EdgeId> {
        self.lock().incident_edges(id)
    }

    #[must_use]
    pub fn members_of(&self, edge_id: &EdgeId) -> BTreeSet<NodeId> {
        self.lock().members_of(edge_id)
    }

    #[must_use]
    pub fn find_nodes_by_attribute(&self, key: &str, value: &str) -> Vec<NodeId> {
        self.lock().find_nodes_by_attribute(key, value)
    }

    #[must_use]
    pub fn find_edges_by_attribute(&self, key: &str, value: &str) -> Vec<EdgeId> {
        self.lock().find_edges_by_attribute(key, value)
    }

    #[must_use]
    pub fn find_nodes_by_pattern(&self, pattern: &str) -> Vec<NodeId> {
        self.lock().find_nodes_by_pattern(pattern)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.lock().node_count()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.lock().edge_count()
    }

    #[must_use]
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.lock().nodes().map(|n| n.id.clone()).collect()
    }

    #[must_use]
    pub fn edge_ids(&self) -> Vec<EdgeId> {
        self.lock().edges().map(|e| e.id.clone()).collect()
    }

    /// Next value of this substrate's id sequence.
    pub fn next_sequence(&self) -> u64 {
        self.lock().next_sequence()
    }

    // =========================================================================
    // ACTIVATION
    // =========================================================================

    /// Spread activation from `source` over at most two hops.
    ///
    /// The source is set to `initial`; every reached node gains
    /// `initial * 0.7`. A missing source is a no-op and skips the hook.
    pub fn propagate(&self, source: &NodeId, initial: f64) {
        let reached = {
            let mut graph = self.lock();
            let Some(reached) = graph.propagate(source, initial) else {
                return;
            };
            self.mirror_node(&graph, source);
            for id in &reached {
                self.mirror_node(&graph, id);
            }
            reached
        };

        if let Some(hook) = &self.on_propagation {
            hook(source, &reached, initial);
        }
    }

    /// Overwrite a node's activation. Absent ids are ignored.
    pub fn update_activation(&self, id: &NodeId, value: f64) {
        let mut graph = self.lock();
        if graph.set_activation(id, value) {
            self.mirror_node(&graph, id);
        }
    }

    /// Activation of a node, zero if absent.
    #[must_use]
    pub fn get_activation(&self, id: &NodeId) -> f64 {
        self.lock().activation(id)
    }

    // =========================================================================
    // METRICS
    // =========================================================================

    #[must_use]
    pub fn clustering_coefficient(&self, id: &NodeId) -> f64 {
        self.lock().clustering_coefficient(id)
    }

    #[must_use]
    pub fn density(&self) -> f64 {
        self.lock().density()
    }

    /// Whole-substrate metrics, plus per-node figures for `focus` if given.
    #[must_use]
    pub fn metrics(&self, focus: Option<&NodeId>) -> SubstrateMetrics {
        SubstrateMetrics::from_graph(&self.lock(), focus)
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Push every live node and edge to the persistence strategy.
    ///
    /// Returns false if any individual save failed. Successful saves are not
    /// rolled back.
    pub fn save(&self) -> bool {
        let graph = self.lock();
        let mut all_saved = true;
        for node in graph.nodes() {
            all_saved &= self.persistence.save_node(node).is_ok();
        }
        for edge in graph.edges() {
            all_saved &= self.persistence.save_edge(edge).is_ok();
        }
        all_saved
    }

    /// Rebuild the tables from the persistence strategy.
    ///
    /// Returns false only if the id listings cannot be read. Ids that fail to
    /// load, and edges whose members did not load, are skipped.
    pub fn load(&self) -> bool {
        let mut graph = self.lock();
        let (Ok(node_ids), Ok(edge_ids)) = (
            self.persistence.list_node_ids(),
            self.persistence.list_edge_ids(),
        ) else {
            return false;
        };

        graph.clear();
        for id in &node_ids {
            if let Ok(Some(node)) = self.persistence.load_node(id) {
                graph.add_node(node);
            }
        }
        for id in &edge_ids {
            if let Ok(Some(edge)) = self.persistence.load_edge(id) {
                // Edges with a member that did not load are skipped.
                graph.add_edge(edge).ok();
            }
        }
        true
    }

    /// Empty the tables, and the persistence strategy if it is volatile.
    pub fn clear(&self) {
        let mut graph = self.lock();
        graph.clear();
        self.persistence.clear_volatile();
    }

    /// Consistent copy of the current tables.
    #[must_use]
    pub fn snapshot(&self) -> Hypergraph {
        self.lock().clone()
    }

    /// Replace the tables with `snapshot` and bring persistence in line.
    ///
    /// Returns false if any persistence write failed.
    pub fn restore(&self, snapshot: Hypergraph) -> bool {
        let mut graph = self.lock();
        *graph = snapshot;

        let mut all_synced = true;
        if let Ok(stored) = self.persistence.list_edge_ids() {
            for id in stored.iter().filter(|id| !graph.contains_edge(id)) {
                all_synced &= self.persistence.remove_edge(id).is_ok();
            }
        } else {
            all_synced = false;
        }
        if let Ok(stored) = self.persistence.list_node_ids() {
            for id in stored.iter().filter(|id| !graph.contains_node(id)) {
                all_synced &= self.persistence.remove_node(id).is_ok();
            }
        } else {
            all_synced = false;
        }
        for node in graph.nodes() {
            all_synced &= self.persistence.save_node(node).is_ok();
        }
        for edge in graph.edges() {
            all_synced &= self.persistence.save_edge(edge).is_ok();
        }
        all_synced
    }
}

// =============================================================================
// TESTS
// =============================================================================
