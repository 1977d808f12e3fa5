//! # System Module
//!
//! Structural metrics over a substrate snapshot.
//!
//! Metrics are computed by brute-force traversal under a single lock, so all
//! figures in one `SubstrateMetrics` describe the same state.

mod metrics;

pub use metrics::*;
