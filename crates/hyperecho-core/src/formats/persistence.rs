//! # Snapshot Format
//!
//! Binary serialization for HyperEcho substrate snapshots.
//!
//! Format: Header (5 bytes) + postcard-serialized `Hypergraph`.
//! - 4 bytes: Magic ("HYPE")
//! - 1 byte: Version
//!
//! Size and header are validated before the payload is decoded, and a
//! decoded snapshot is checked for edges that reference missing nodes.

use crate::graph::Hypergraph;
use crate::primitives;
use crate::types::HyperError;

// =============================================================================
// LIMITS
// =============================================================================

/// Maximum accepted snapshot size (500 MB), checked before decoding.
pub const MAX_SNAPSHOT_SIZE: usize = 500 * 1024 * 1024;

/// Header length in bytes.
pub const HEADER_SIZE: usize = 5;

// =============================================================================
// FILE HEADER
// =============================================================================

/// The snapshot header precedes all substrate data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotHeader {
    pub magic: [u8; 4],
    pub version: u8,
}

impl SnapshotHeader {
    /// Create a new header with current format version.
    #[must_use]
    pub fn new() -> Self {
        Self {
            magic: *primitives::MAGIC_BYTES,
            version: primitives::FORMAT_VERSION,
        }
    }

    /// Validate the header.
    pub fn validate(&self) -> Result<(), HyperError> {
        if &self.magic != primitives::MAGIC_BYTES {
            return Err(HyperError::SerializationError(
                "Invalid magic bytes".to_string(),
            ));
        }
        if self.version != primitives::FORMAT_VERSION {
            return Err(HyperError::SerializationError(format!(
                "Unsupported version: {} (expected {})",
                self.version,
                primitives::FORMAT_VERSION
            )));
        }
        Ok(())
    }

    /// Write header to bytes.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut bytes = [0u8; HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4] = self.version;
        bytes
    }

    /// Read header from bytes.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, HyperError> {
        match bytes {
            [m0, m1, m2, m3, version, ..] => Ok(Self {
                magic: [*m0, *m1, *m2, *m3],
                version: *version,
            }),
            _ => Err(HyperError::SerializationError(
                "Header too short".to_string(),
            )),
        }
    }
}

impl Default for SnapshotHeader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// SERIALIZATION FUNCTIONS
// =============================================================================

/// Serialize a snapshot to bytes (header + payload).
pub fn substrate_to_bytes(graph: &Hypergraph) -> Result<Vec<u8>, HyperError> {
    let payload = postcard::to_stdvec(graph)
        .map_err(|e| HyperError::SerializationError(e.to_string()))?;

    let mut result = Vec::with_capacity(HEADER_SIZE + payload.len());
    result.extend_from_slice(&SnapshotHeader::new().to_bytes());
    result.extend_from_slice(&payload);
    Ok(result)
}

/// Deserialize a snapshot from bytes.
///
/// Rejects data that is too short or too large, carries a foreign header,
/// fails to decode, or contains an edge referencing a missing node.
pub fn substrate_from_bytes(bytes: &[u8]) -> Result<Hypergraph, HyperError> {
    if bytes.len() < HEADER_SIZE {
        return Err(HyperError::SerializationError(format!(
            "Data too short: minimum {HEADER_SIZE} bytes required"
        )));
    }

    if bytes.len() > MAX_SNAPSHOT_SIZE {
        return Err(HyperError::SerializationError(format!(
            "Data size {} bytes exceeds maximum allowed {} bytes",
            bytes.len(),
            MAX_SNAPSHOT_SIZE
        )));
    }

    SnapshotHeader::from_bytes(bytes)?.validate()?;

    let graph: Hypergraph = postcard::from_bytes(&bytes[HEADER_SIZE..]).map_err(|e| {
        HyperError::SerializationError(format!("Failed to deserialize substrate data: {}", e))
    })?;

    for edge in graph.edges() {
        graph.validate_members(edge)?;
    }

    Ok(graph)
}

// =============================================================================
// TESTS
// =============================================================================
