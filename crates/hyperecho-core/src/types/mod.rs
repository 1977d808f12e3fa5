//! # Core Type Definitions
//!
//! This module contains all core types for the HyperEcho substrate:
//! - Node and edge identifiers (`NodeId`, `EdgeId`)
//! - Identity signatures (`Identity`)
//! - Hypergraph elements (`HyperNode`, `HyperEdge`)
//! - Error types (`HyperError`)
//!
//! ## Determinism Guarantees
//!
//! Attribute maps and member sets use `BTreeMap`/`BTreeSet`, so iteration
//! and serialization order never depend on insertion history.

use crate::primitives::{DEFAULT_STRENGTH, DEFAULT_WEIGHT};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

/// Flat string attribute map carried by nodes and edges.
pub type Attributes = BTreeMap<String, String>;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Unique identifier for a hypernode within a substrate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a new node id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier for a hyperedge within a substrate.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Create a new edge id.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for EdgeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// IDENTITY
// =============================================================================

/// A named identity signature.
///
/// Pattern order matters for the `identity.pattern.<i>` memory keys and the
/// `cognitive.echo.pattern.<i>` metadata keys, not for matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub signature: String,
    pub frequency: u64,
    pub patterns: Vec<String>,
    pub weight: f64,
}

impl Default for Identity {
    fn default() -> Self {
        Self {
            signature: String::new(),
            frequency: 0,
            patterns: Vec::new(),
            weight: DEFAULT_WEIGHT,
        }
    }
}

impl Identity {
    /// Create an identity with the given signature and default weight.
    #[must_use]
    pub fn new(signature: impl Into<String>) -> Self {
        Self {
            signature: signature.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_frequency(mut self, frequency: u64) -> Self {
        self.frequency = frequency;
        self
    }

    #[must_use]
    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.patterns = patterns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the weight. Negative and NaN weights are clamped to zero.
    #[must_use]
    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight.max(0.0);
        self
    }

    /// Check if the identity carries `pattern` exactly.
    #[must_use]
    pub fn has_pattern(&self, pattern: &str) -> bool {
        self.patterns.iter().any(|p| p == pattern)
    }
}

// =============================================================================
// HYPERNODE
// =============================================================================

/// A labelled unit of data with attributes, an identity stamp and an
/// activation level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperNode {
    pub id: NodeId,
    pub label: String,
    pub attributes: Attributes,
    pub identity: Identity,
    /// Raised by propagation, overwritten by explicit updates. Never decays.
    pub activation: f64,
}

impl HyperNode {
    /// Create a node with no attributes, a default identity and zero activation.
    #[must_use]
    pub fn new(id: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            attributes: Attributes::new(),
            identity: Identity::default(),
            activation: 0.0,
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    #[must_use]
    pub fn with_activation(mut self, activation: f64) -> Self {
        self.activation = clamp_activation(activation);
        self
    }

    /// Get an attribute value.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }
}

/// Activation is kept non-negative; NaN collapses to zero.
#[must_use]
pub(crate) fn clamp_activation(value: f64) -> f64 {
    value.max(0.0)
}

// =============================================================================
// HYPEREDGE
// =============================================================================

/// A labelled relationship over an arbitrary-size set of nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperEdge {
    pub id: EdgeId,
    pub label: String,
    pub members: BTreeSet<NodeId>,
    pub attributes: Attributes,
    pub strength: f64,
}

impl HyperEdge {
    /// Create an edge over `members` with the default strength.
    #[must_use]
    pub fn new<I, N>(id: impl Into<EdgeId>, label: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = N>,
        N: Into<NodeId>,
    {
        Self {
            id: id.into(),
            label: label.into(),
            members: members.into_iter().map(Into::into).collect(),
            attributes: Attributes::new(),
            strength: DEFAULT_STRENGTH,
        }
    }

    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    /// Check if `node` is a member of this edge.
    #[must_use]
    pub fn contains(&self, node: &NodeId) -> bool {
        self.members.contains(node)
    }

    /// Number of members spanned by this edge.
    #[must_use]
    pub fn arity(&self) -> usize {
        self.members.len()
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the HyperEcho system.
///
/// Benign no-ops (duplicate insert, missing id) are reported as `false` or
/// `None`, never as an error.
#[derive(Debug, Error)]
pub enum HyperError {
    /// An edge referenced a node that is not in the node table.
    #[error("Referential integrity violation: edge {edge} references missing node {node}")]
    ReferentialIntegrity { edge: EdgeId, node: NodeId },

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O or storage error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// A processing unit handler reported a failure.
    #[error("Handler failed: {0}")]
    HandlerFailed(String),
}

// =============================================================================
// TESTS
// =============================================================================
