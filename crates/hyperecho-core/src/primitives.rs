//! # Innate Primitives
//!
//! Hardcoded runtime constants for the HyperEcho substrate and kernel.
//!
//! These primitives are compiled into the binary and are immutable at runtime.
//!
//! ## Primitives
//!
//! 1. **Propagation Primitive**: bounded-hop activation spreading.
//! 2. **Resonance Primitive**: pattern boost applied per matching identity pattern.
//! 3. **Persistence Primitive**: snapshot header layout.

/// Maximum number of hyperedge hops reached by activation propagation.
///
/// An edge with members `{a, b, c}` puts every pair of members one hop apart.
pub const PROPAGATION_HOPS: usize = 2;

/// Fraction of the initial activation added to every reachable node.
pub const PROPAGATION_RETENTION: f64 = 0.7;

/// Multiplier applied to resonance once per distinct matching identity pattern.
pub const PATTERN_BOOST: f64 = 1.2;

/// Default identity weight.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// Default hyperedge strength.
pub const DEFAULT_STRENGTH: f64 = 1.0;

/// Magic bytes for the HyperEcho snapshot header.
///
/// - File Header = Magic Bytes ("HYPE") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"HYPE";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the serialization format.
pub const FORMAT_VERSION: u8 = 1;

// =============================================================================
// MEMORY KEYS
// =============================================================================

/// Memory key holding the identity signature.
pub const KEY_IDENTITY_SIGNATURE: &str = "identity.signature";

/// Memory key holding the identity frequency.
pub const KEY_IDENTITY_FREQUENCY: &str = "identity.frequency";

/// Memory key holding the identity weight.
pub const KEY_IDENTITY_WEIGHT: &str = "identity.weight";

/// Prefix of the per-pattern memory keys (`identity.pattern.<index>`).
pub const KEY_IDENTITY_PATTERN_PREFIX: &str = "identity.pattern.";

/// Memory key holding the last processed signal text.
pub const KEY_LAST_SIGNAL: &str = "last_signal";

/// Memory key holding the last computed resonance.
pub const KEY_LAST_RESONANCE: &str = "last_resonance";

/// Memory key holding the number of processed signals.
pub const KEY_PROCESS_COUNT: &str = "process_count";

/// Memory key for the identity pattern at `index`.
#[must_use]
pub fn pattern_key(index: usize) -> String {
    format!("{KEY_IDENTITY_PATTERN_PREFIX}{index}")
}

/// Render a float the way every stored or written-back value is rendered.
#[must_use]
pub fn format_float(value: f64) -> String {
    format!("{value:.6}")
}
