//! # redb-backed Persistence
//!
//! A disk-backed persistence strategy using the redb embedded database.
//!
//! Every save or remove runs in its own write transaction, so each mirrored
//! mutation is durable once the call returns. Nodes and edges are stored
//! postcard-encoded under their string ids.
//!
//! `Substrate::clear` does not touch this strategy; call
//! [`RedbPersistence::clear`] explicitly to wipe the database.

use super::SubstratePersistence;
use crate::types::{EdgeId, HyperEdge, HyperError, HyperNode, NodeId};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;

/// String-keyed table of postcard blobs.
type BlobTable = TableDefinition<'static, &'static str, &'static [u8]>;

/// Table for nodes: node id -> serialized HyperNode bytes
const NODES: BlobTable = TableDefinition::new("nodes");

/// Table for edges: edge id -> serialized HyperEdge bytes
const EDGES: BlobTable = TableDefinition::new("edges");

fn io_err(e: impl std::fmt::Display) -> HyperError {
    HyperError::IoError(e.to_string())
}

fn ser_err(e: impl std::fmt::Display) -> HyperError {
    HyperError::SerializationError(e.to_string())
}

/// Persistence strategy backed by a redb database file.
pub struct RedbPersistence {
    db: Database,
}

impl std::fmt::Debug for RedbPersistence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbPersistence").finish_non_exhaustive()
    }
}

impl RedbPersistence {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, HyperError> {
        let db = Database::create(path.as_ref()).map_err(io_err)?;

        // Initialize tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(io_err)?;
            let _ = write_txn.open_table(NODES).map_err(io_err)?;
            let _ = write_txn.open_table(EDGES).map_err(io_err)?;
            write_txn.commit().map_err(io_err)?;
        }

        Ok(Self { db })
    }

    /// Delete every stored node and edge.
    pub fn clear(&self) -> Result<(), HyperError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        write_txn.delete_table(NODES).map_err(io_err)?;
        write_txn.delete_table(EDGES).map_err(io_err)?;
        let _ = write_txn.open_table(NODES).map_err(io_err)?;
        let _ = write_txn.open_table(EDGES).map_err(io_err)?;
        write_txn.commit().map_err(io_err)
    }

    pub fn node_count(&self) -> Result<usize, HyperError> {
        self.count(NODES)
    }

    pub fn edge_count(&self) -> Result<usize, HyperError> {
        self.count(EDGES)
    }

    fn count(&self, table: BlobTable) -> Result<usize, HyperError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(table).map_err(io_err)?;
        Ok(table.len().map_err(io_err)? as usize)
    }

    fn put<T: Serialize>(
        &self,
        table: BlobTable,
        key: &str,
        value: &T,
    ) -> Result<(), HyperError> {
        let bytes = postcard::to_allocvec(value).map_err(ser_err)?;
        let write_txn = self.db.begin_write().map_err(io_err)?;
        {
            let mut table = write_txn.open_table(table).map_err(io_err)?;
            table.insert(key, bytes.as_slice()).map_err(io_err)?;
        }
        write_txn.commit().map_err(io_err)
    }

    fn get<T: DeserializeOwned>(
        &self,
        table: BlobTable,
        key: &str,
    ) -> Result<Option<T>, HyperError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(table).map_err(io_err)?;
        match table.get(key).map_err(io_err)? {
            Some(data) => postcard::from_bytes(data.value())
                .map(Some)
                .map_err(ser_err),
            None => Ok(None),
        }
    }

    fn delete(&self, table: BlobTable, key: &str) -> Result<bool, HyperError> {
        let write_txn = self.db.begin_write().map_err(io_err)?;
        let removed = {
            let mut table = write_txn.open_table(table).map_err(io_err)?;
            table.remove(key).map_err(io_err)?.is_some()
        };
        write_txn.commit().map_err(io_err)?;
        Ok(removed)
    }

    fn keys(&self, table: BlobTable) -> Result<Vec<String>, HyperError> {
        let read_txn = self.db.begin_read().map_err(io_err)?;
        let table = read_txn.open_table(table).map_err(io_err)?;
        let mut keys = Vec::new();
        for entry in table.iter().map_err(io_err)? {
            let (key, _) = entry.map_err(io_err)?;
            keys.push(key.value().to_string());
        }
        Ok(keys)
    }
}

impl SubstratePersistence for RedbPersistence {
    fn save_node(&self, node: &HyperNode) -> Result<(), HyperError> {
        self.put(NODES, node.id.as_str(), node)
    }

    fn save_edge(&self, edge: &HyperEdge) -> Result<(), HyperError> {
        self.put(EDGES, edge.id.as_str(), edge)
    }

    fn load_node(&self, id: &NodeId) -> Result<Option<HyperNode>, HyperError> {
        self.get(NODES, id.as_str())
    }

    fn load_edge(&self, id: &EdgeId) -> Result<Option<HyperEdge>, HyperError> {
        self.get(EDGES, id.as_str())
    }

    fn remove_node(&self, id: &NodeId) -> Result<bool, HyperError> {
        self.delete(NODES, id.as_str())
    }

    fn remove_edge(&self, id: &EdgeId) -> Result<bool, HyperError> {
        self.delete(EDGES, id.as_str())
    }

    fn list_node_ids(&self) -> Result<Vec<NodeId>, HyperError> {
        Ok(self.keys(NODES)?.into_iter().map(NodeId::from).collect())
    }

    fn list_edge_ids(&self) -> Result<Vec<EdgeId>, HyperError> {
        Ok(self.keys(EDGES)?.into_iter().map(EdgeId::from).collect())
    }
}
