//! # Host Configuration
//!
//! Optional TOML file tuning the unit identity and handler thresholds.
//!
//! ```toml
//! unit_name = "hyperecho"
//! resonance_threshold = 0.5
//! min_word_length = 4
//! cluster_threshold = 0.5
//! cluster_min_connections = 3
//! similarity_min_shared = 2
//! extra_patterns = ["archive"]
//! ```
//!
//! Every key is optional. A missing file yields the defaults.

use hyperecho_core::HyperError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Maximum configuration file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Host settings loaded from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfig {
    /// Unit name; the identity signature is `<unit_name>_cognitive_identity`.
    pub unit_name: String,
    /// Echo routes to `high-resonance` at or above this score.
    pub resonance_threshold: f64,
    /// Shortest word (in characters) that becomes a word node.
    pub min_word_length: usize,
    /// Clustering coefficient that must be exceeded for `clustered`.
    pub cluster_threshold: f64,
    /// Connections required, with the threshold, for `clustered`.
    pub cluster_min_connections: usize,
    /// Shared neighbors required to link two content nodes as similar.
    pub similarity_min_shared: usize,
    /// Patterns appended after the derived identity patterns.
    pub extra_patterns: Vec<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            unit_name: "hyperecho".to_string(),
            resonance_threshold: 0.5,
            min_word_length: 4,
            cluster_threshold: 0.5,
            cluster_min_connections: 3,
            similarity_min_shared: 2,
            extra_patterns: Vec::new(),
        }
    }
}

impl HostConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, HyperError> {
        toml::from_str(source)
            .map_err(|e| HyperError::SerializationError(format!("Invalid config: {}", e)))
    }

    /// Load from `path`, falling back to defaults when it does not exist.
    pub fn load(path: &Path) -> Result<Self, HyperError> {
        if !path.exists() {
            tracing::info!("Config file {:?} not found, using defaults", path);
            return Ok(Self::default());
        }

        let metadata = std::fs::metadata(path)
            .map_err(|e| HyperError::IoError(format!("Cannot read config metadata: {}", e)))?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(HyperError::SerializationError(format!(
                "Config size {} bytes exceeds maximum allowed {} bytes",
                metadata.len(),
                MAX_CONFIG_FILE_SIZE
            )));
        }

        let source = std::fs::read_to_string(path)
            .map_err(|e| HyperError::IoError(format!("Read config: {}", e)))?;
        Self::from_toml_str(&source)
    }
}
