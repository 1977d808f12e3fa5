//! # hyperecho-core
//!
//! A thread-safe hypergraph substrate paired with a cognitive kernel.
//!
//! The substrate records nodes and n-ary edges, enforces referential
//! integrity, cascades deletions and spreads activation over a bounded
//! two-hop neighborhood. Every mutation is mirrored to a pluggable
//! persistence strategy. The kernel carries an identity, a key/value
//! memory and a small state machine, and scores text by resonance
//! against its identity. A processing unit composes the two with an
//! injected text handler.
//!
//! ## Constraints
//!
//! - No async, no network, no logging: hosts observe through hooks
//! - Deterministic iteration: `BTreeMap`/`BTreeSet` only
//! - One lock per instance; hooks run after it is released

// =============================================================================
// MODULES
// =============================================================================

pub mod formats;
pub mod graph;
pub mod kernel;
pub mod memory;
pub mod primitives;
pub mod storage;
pub mod substrate;
pub mod system;
pub mod types;
pub mod unit;

// =============================================================================
// RE-EXPORTS: Core Types
// =============================================================================

pub use types::{Attributes, EdgeId, HyperEdge, HyperError, HyperNode, Identity, NodeId};

// =============================================================================
// RE-EXPORTS: Substrate
// =============================================================================

pub use graph::Hypergraph;
pub use storage::{MemoryPersistence, RedbPersistence, SubstratePersistence};
pub use substrate::{PropagationHook, Substrate};

// =============================================================================
// RE-EXPORTS: Kernel
// =============================================================================

pub use kernel::{CognitiveKernel, CognitiveState, TransitionHook, fnv1a64, resonance};
pub use memory::Memory;
pub use unit::{Outcome, ProcessingUnit, Record, TextHandler, UnitContext};

// =============================================================================
// RE-EXPORTS: Formats and System
// =============================================================================

pub use formats::{SnapshotHeader, substrate_from_bytes, substrate_to_bytes};
pub use system::{NodeMetrics, SubstrateMetrics};
