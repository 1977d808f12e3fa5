//! # In-Memory Persistence
//!
//! The reference persistence strategy: synchronized maps with no durability
//! beyond process memory.

use super::SubstratePersistence;
use crate::types::{EdgeId, HyperEdge, HyperError, HyperNode, NodeId};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Tables {
    nodes: BTreeMap<NodeId, HyperNode>,
    edges: BTreeMap<EdgeId, HyperEdge>,
}

/// Mutex-synchronized node and edge maps.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    tables: Mutex<Tables>,
}

impl MemoryPersistence {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.lock().nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.lock().edges.len()
    }

    /// Drop every stored node and edge.
    pub fn clear(&self) {
        let mut tables = self.lock();
        tables.nodes.clear();
        tables.edges.clear();
    }
}

impl SubstratePersistence for MemoryPersistence {
    fn save_node(&self, node: &HyperNode) -> Result<(), HyperError> {
        self.lock().nodes.insert(node.id.clone(), node.clone());
        Ok(())
    }

    fn save_edge(&self, edge: &HyperEdge) -> Result<(), HyperError> {
        self.lock().edges.insert(edge.id.clone(), edge.clone());
        Ok(())
    }

    fn load_node(&self, id: &NodeId) -> Result<Option<HyperNode>, HyperError> {
        Ok(self.lock().nodes.get(id).cloned())
    }

    fn load_edge(&self, id: &EdgeId) -> Result<Option<HyperEdge>, HyperError> {
        Ok(self.lock().edges.get(id).cloned())
    }

    fn remove_node(&self, id: &NodeId) -> Result<bool, HyperError> {
        Ok(self.lock().nodes.remove(id).is_some())
    }

    fn remove_edge(&self, id: &EdgeId) -> Result<bool, HyperError> {
        Ok(self.lock().edges.remove(id).is_some())
    }

    fn list_node_ids(&self) -> Result<Vec<NodeId>, HyperError> {
        Ok(self.lock().nodes.keys().cloned().collect())
    }

    fn list_edge_ids(&self) -> Result<Vec<EdgeId>, HyperError> {
        Ok(self.lock().edges.keys().cloned().collect())
    }

    fn clear_volatile(&self) {
        self.clear();
    }
}
