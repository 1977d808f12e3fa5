//! # Text Handlers
//!
//! The two handlers the host plugs into a `ProcessingUnit`.
//!
//! - `EchoHandler` - scores content against the unit identity and routes on it
//! - `MapperHandler` - maps content, words and attributes into the substrate
//!
//! Both write their results as flat `cognitive.*` / `hypergraph.*` metadata.

mod echo;
mod mapper;

pub use echo::EchoHandler;
pub use mapper::{FLOW_ID_ATTRIBUTE, MapperHandler, flow_id, tokenize};

use hyperecho_core::fnv1a64;

// =============================================================================
// ROUTES
// =============================================================================

pub const ROUTE_HIGH_RESONANCE: &str = "high-resonance";
pub const ROUTE_LOW_RESONANCE: &str = "low-resonance";
pub const ROUTE_CLUSTERED: &str = "clustered";
pub const ROUTE_ENHANCED: &str = "enhanced";
pub const ROUTE_MAPPED: &str = "mapped";
pub const ROUTE_ISOLATED: &str = "isolated";

// =============================================================================
// METADATA KEYS
// =============================================================================

pub const META_ECHO_IDENTITY: &str = "cognitive.echo.identity";
pub const META_ECHO_FREQUENCY: &str = "cognitive.echo.frequency";
pub const META_ECHO_WEIGHT: &str = "cognitive.echo.weight";
pub const META_ECHO_PATTERN_PREFIX: &str = "cognitive.echo.pattern.";
pub const META_RESONANCE: &str = "cognitive.resonance";
pub const META_STATE: &str = "cognitive.state";
pub const META_PROCESSOR: &str = "cognitive.processor";

pub const META_FLOW_ID: &str = "hypergraph.flow_id";
pub const META_TOTAL_NODES: &str = "hypergraph.total_nodes";
pub const META_TOTAL_EDGES: &str = "hypergraph.total_edges";
pub const META_DENSITY: &str = "hypergraph.substrate_density";
pub const META_CONNECTIONS: &str = "hypergraph.node_connections";
pub const META_INCIDENT_EDGES: &str = "hypergraph.incident_edges";
pub const META_CLUSTERING: &str = "hypergraph.clustering_coefficient";
pub const META_ACTIVATION: &str = "hypergraph.node_activation";
pub const META_CONNECTED_NODES: &str = "hypergraph.connected_nodes";
pub const META_SIMILAR_COUNT: &str = "hypergraph.similar_content_count";
pub const META_GRAPH_PROCESSOR: &str = "hypergraph.processor";

/// Record attributes with this prefix never become attribute nodes.
pub const COGNITIVE_PREFIX: &str = "cognitive.";

/// Memory key for the hash of the last echoed content.
pub const KEY_LAST_CONTENT_HASH: &str = "last_content_hash";

/// Memory key for the `uuid` attribute of the last echoed record.
pub const KEY_LAST_PROCESSED_UUID: &str = "last_processed_uuid";

/// Stable hex hash of record content.
#[must_use]
pub fn content_hash(content: &str) -> String {
    format!("{:016x}", fnv1a64(content.as_bytes()))
}
