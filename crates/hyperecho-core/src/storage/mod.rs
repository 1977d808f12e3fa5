//! # Storage Module
//!
//! The persistence strategy contract and its implementations.
//!
//! - `MemoryPersistence`: synchronized in-process maps, the reference strategy
//! - `RedbPersistence`: disk-backed strategy on the redb embedded database
//!
//! A substrate mirrors every mutation into its strategy, so `Substrate::load`
//! can rebuild the same node and edge universe from the id listings.

mod memory;
mod redb_store;

pub use memory::MemoryPersistence;
pub use redb_store::RedbPersistence;

use crate::types::{EdgeId, HyperEdge, HyperError, HyperNode, NodeId};

// =============================================================================
// PERSISTENCE STRATEGY
// =============================================================================

/// Save/load/remove/enumerate capability set for nodes and edges.
///
/// - `save_*` is an upsert
/// - `load_*` reports absence as `Ok(None)`, never as an error
/// - `list_*_ids` must cover every stored element
pub trait SubstratePersistence: Send + Sync {
    fn save_node(&self, node: &HyperNode) -> Result<(), HyperError>;

    fn save_edge(&self, edge: &HyperEdge) -> Result<(), HyperError>;

    fn load_node(&self, id: &NodeId) -> Result<Option<HyperNode>, HyperError>;

    fn load_edge(&self, id: &EdgeId) -> Result<Option<HyperEdge>, HyperError>;

    /// Returns false if the node was not stored.
    fn remove_node(&self, id: &NodeId) -> Result<bool, HyperError>;

    /// Returns false if the edge was not stored.
    fn remove_edge(&self, id: &EdgeId) -> Result<bool, HyperError>;

    fn list_node_ids(&self) -> Result<Vec<NodeId>, HyperError>;

    fn list_edge_ids(&self) -> Result<Vec<EdgeId>, HyperError>;

    /// Called by `Substrate::clear`.
    ///
    /// Only strategies without durability drop their contents here. Durable
    /// strategies keep the default no-op and expose their own clear.
    fn clear_volatile(&self) {}
}

impl<P: SubstratePersistence + ?Sized> SubstratePersistence for Box<P> {
    fn save_node(&self, node: &HyperNode) -> Result<(), HyperError> {
        (**self).save_node(node)
    }

    fn save_edge(&self, edge: &HyperEdge) -> Result<(), HyperError> {
        (**self).save_edge(edge)
    }

    fn load_node(&self, id: &NodeId) -> Result<Option<HyperNode>, HyperError> {
        (**self).load_node(id)
    }

    fn load_edge(&self, id: &EdgeId) -> Result<Option<HyperEdge>, HyperError> {
        (**self).load_edge(id)
    }

    fn remove_node(&self, id: &NodeId) -> Result<bool, HyperError> {
        (**self).remove_node(id)
    }

    fn remove_edge(&self, id: &EdgeId) -> Result<bool, HyperError> {
        (**self).remove_edge(id)
    }

    fn list_node_ids(&self) -> Result<Vec<NodeId>, HyperError> {
        (**self).list_node_ids()
    }

    fn list_edge_ids(&self) -> Result<Vec<EdgeId>, HyperError> {
        (**self).list_edge_ids()
    }

    fn clear_volatile(&self) {
        (**self).clear_volatile();
    }
}
