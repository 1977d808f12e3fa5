//! # Cognitive Kernel
//!
//! Identity, working memory and an explicit processing state machine.
//!
//! The kernel owns one lock over its identity, state and counters. Memory
//! carries its own lock and is always taken after the kernel lock. The
//! transition hook runs after every lock has been released, so a hook may
//! call back into the kernel.

use crate::memory::Memory;
use crate::primitives::{
    self, KEY_IDENTITY_FREQUENCY, KEY_IDENTITY_PATTERN_PREFIX, KEY_IDENTITY_SIGNATURE,
    KEY_IDENTITY_WEIGHT, KEY_LAST_RESONANCE, KEY_LAST_SIGNAL, KEY_PROCESS_COUNT, PATTERN_BOOST,
};
use crate::types::Identity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

// =============================================================================
// COGNITIVE STATE
// =============================================================================

/// Processing state of a kernel. Any state may move to any other.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub enum CognitiveState {
    #[default]
    Dormant,
    Awakening,
    Processing,
    Learning,
    Reasoning,
    Creating,
    Reflecting,
}

impl CognitiveState {
    /// All states in declaration order.
    pub const ALL: [Self; 7] = [
        Self::Dormant,
        Self::Awakening,
        Self::Processing,
        Self::Learning,
        Self::Reasoning,
        Self::Creating,
        Self::Reflecting,
    ];

    /// Lowercase name, as written to `cognitive.state`.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Dormant => "dormant",
            Self::Awakening => "awakening",
            Self::Processing => "processing",
            Self::Learning => "learning",
            Self::Reasoning => "reasoning",
            Self::Creating => "creating",
            Self::Reflecting => "reflecting",
        }
    }
}

impl fmt::Display for CognitiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// RESONANCE
// =============================================================================

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// 64-bit FNV-1a hash. Stable across processes and platforms.
#[must_use]
pub fn fnv1a64(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, &byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}

/// Resonance of `text` against `identity`.
///
/// `base = 1 / (1 + |h(text) - h(signature)| / max(h(text), h(signature)))`,
/// boosted by `PATTERN_BOOST` once per distinct non-empty pattern found as a
/// substring of `text`, then scaled by the identity weight.
#[must_use]
pub fn resonance(text: &str, identity: &Identity) -> f64 {
    if text.is_empty() || identity.signature.is_empty() {
        return 0.0;
    }

    let text_hash = fnv1a64(text.as_bytes());
    let signature_hash = fnv1a64(identity.signature.as_bytes());
    let max_hash = text_hash.max(signature_hash);
    let base = if max_hash == 0 {
        1.0
    } else {
        1.0 / (1.0 + text_hash.abs_diff(signature_hash) as f64 / max_hash as f64)
    };

    let distinct: BTreeSet<&str> = identity.patterns.iter().map(String::as_str).collect();
    let boosted = distinct
        .into_iter()
        .filter(|pattern| !pattern.is_empty() && text.contains(pattern))
        .fold(base, |score, _| score * PATTERN_BOOST);

    (boosted * identity.weight).max(0.0)
}

// =============================================================================
// KERNEL
// =============================================================================

/// Callback fired on every actual state change with `(from, to)`.
pub type TransitionHook = Box<dyn Fn(CognitiveState, CognitiveState) + Send + Sync>;

#[derive(Debug, Default)]
struct KernelState {
    identity: Identity,
    state: CognitiveState,
    process_count: u64,
}

/// The cognitive kernel: identity, memory and state machine.
#[derive(Default)]
pub struct CognitiveKernel {
    inner: Mutex<KernelState>,
    memory: Memory,
    on_transition: Option<TransitionHook>,
}

impl fmt::Debug for CognitiveKernel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.lock();
        f.debug_struct("CognitiveKernel")
            .field("signature", &inner.identity.signature)
            .field("state", &inner.state)
            .field("process_count", &inner.process_count)
            .finish_non_exhaustive()
    }
}

impl CognitiveKernel {
    /// Create a dormant kernel with an empty identity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a kernel that reports every state change to `hook`.
    #[must_use]
    pub fn with_transition_hook<F>(hook: F) -> Self
    where
        F: Fn(CognitiveState, CognitiveState) + Send + Sync + 'static,
    {
        Self {
            on_transition: Some(Box::new(hook)),
            ..Self::default()
        }
    }

    fn lock(&self) -> MutexGuard<'_, KernelState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the state and fire the hook outside the lock. Returns the old state.
    fn swap_state(&self, next: CognitiveState) -> CognitiveState {
        let previous = {
            let mut inner = self.lock();
            std::mem::replace(&mut inner.state, next)
        };
        if previous != next {
            if let Some(hook) = &self.on_transition {
                hook(previous, next);
            }
        }
        previous
    }

    /// Store `identity`, reseed memory from it and move to `Awakening`.
    ///
    /// Pattern keys left over from a longer previous pattern list are removed.
    pub fn initialize(&self, identity: Identity) {
        {
            let mut inner = self.lock();
            self.memory
                .store(KEY_IDENTITY_SIGNATURE, identity.signature.clone());
            self.memory
                .store(KEY_IDENTITY_FREQUENCY, identity.frequency.to_string());
            self.memory
                .store(KEY_IDENTITY_WEIGHT, primitives::format_float(identity.weight));
            self.memory.remove_prefixed(KEY_IDENTITY_PATTERN_PREFIX);
            for (index, pattern) in identity.patterns.iter().enumerate() {
                self.memory
                    .store(primitives::pattern_key(index), pattern.clone());
            }
            inner.identity = identity;
        }
        self.swap_state(CognitiveState::Awakening);
    }

    /// Score `text`, record it in memory and move through
    /// `Processing` to `Reflecting`.
    pub fn process_signal(&self, text: &str) -> f64 {
        match self.process_signal_with(text, |_, _| Ok::<(), Infallible>(())) {
            Ok(score) => score,
            Err(never) => match never {},
        }
    }

    /// Like [`process_signal`](Self::process_signal), running `hook` with the
    /// text and its resonance while in `Processing`.
    ///
    /// If the hook fails the kernel returns to the state it had before the
    /// call and the hook's error is returned unchanged.
    pub fn process_signal_with<F, E>(&self, text: &str, hook: F) -> Result<f64, E>
    where
        F: FnOnce(&str, f64) -> Result<(), E>,
    {
        let previous = self.swap_state(CognitiveState::Processing);

        let score = {
            let mut inner = self.lock();
            inner.process_count = inner.process_count.saturating_add(1);
            let score = resonance(text, &inner.identity);
            self.memory.store(KEY_LAST_SIGNAL, text);
            self.memory
                .store(KEY_LAST_RESONANCE, primitives::format_float(score));
            self.memory
                .store(KEY_PROCESS_COUNT, inner.process_count.to_string());
            score
        };

        if let Err(err) = hook(text, score) {
            self.swap_state(previous);
            return Err(err);
        }

        self.swap_state(CognitiveState::Reflecting);
        Ok(score)
    }

    /// Resonance of `text` against the stored identity.
    #[must_use]
    pub fn calculate_resonance(&self, text: &str) -> f64 {
        resonance(text, &self.lock().identity)
    }

    /// Set the state directly. The hook fires only on an actual change.
    pub fn set_state(&self, state: CognitiveState) {
        self.swap_state(state);
    }

    #[must_use]
    pub fn state(&self) -> CognitiveState {
        self.lock().state
    }

    /// Clone of the stored identity.
    #[must_use]
    pub fn identity(&self) -> Identity {
        self.lock().identity.clone()
    }

    #[must_use]
    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    #[must_use]
    pub fn process_count(&self) -> u64 {
        self.lock().process_count
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn test_identity() -> Identity {
        Identity::new("test_identity").with_patterns(["cognitive", "test"])
    }

    #[test]
    fn fnv1a64_known_vectors() {
        assert_eq!(fnv1a64(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a64(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn starts_dormant() {
        let kernel = CognitiveKernel::new();
        assert_eq!(kernel.state(), CognitiveState::Dormant);
        assert_eq!(kernel.process_count(), 0);
    }

    #[test]
    fn state_names_are_lowercase() {
        for state in CognitiveState::ALL {
            assert_eq!(state.name(), state.name().to_lowercase());
            assert_eq!(state.to_string(), state.name());
        }
    }

    #[test]
    fn initialize_seeds_memory_and_awakens() {
        let kernel = CognitiveKernel::new();
        kernel.initialize(test_identity().with_frequency(42));

        let memory = kernel.memory();
        assert_eq!(
            memory.retrieve(KEY_IDENTITY_SIGNATURE).as_deref(),
            Some("test_identity")
        );
        assert_eq!(memory.retrieve(KEY_IDENTITY_FREQUENCY).as_deref(), Some("42"));
        assert_eq!(
            memory.retrieve(KEY_IDENTITY_WEIGHT).as_deref(),
            Some("1.000000")
        );
        assert_eq!(
            memory.retrieve("identity.pattern.0").as_deref(),
            Some("cognitive")
        );
        assert_eq!(memory.retrieve("identity.pattern.1").as_deref(), Some("test"));
        assert_eq!(kernel.state(), CognitiveState::Awakening);
    }

    #[test]
    fn reinitialize_drops_stale_pattern_keys() {
        let kernel = CognitiveKernel::new();
        kernel.initialize(test_identity());
        kernel.initialize(Identity::new("other").with_patterns(["only"]));

        assert_eq!(kernel.memory().retrieve("identity.pattern.0").as_deref(), Some("only"));
        assert!(!kernel.memory().exists("identity.pattern.1"));
        assert_eq!(kernel.identity().signature, "other");
    }

    #[test]
    fn process_signal_records_and_reflects() {
        let kernel = CognitiveKernel::new();
        kernel.initialize(test_identity());

        let score = kernel.process_signal("test cognitive data");
        kernel.process_signal("again");

        assert!(score > 0.0);
        assert_eq!(kernel.state(), CognitiveState::Reflecting);
        assert_eq!(kernel.process_count(), 2);
        let memory = kernel.memory();
        assert_eq!(memory.retrieve(KEY_LAST_SIGNAL).as_deref(), Some("again"));
        assert_eq!(memory.retrieve(KEY_PROCESS_COUNT).as_deref(), Some("2"));
        assert!(memory.exists(KEY_LAST_RESONANCE));
    }

    #[test]
    fn failing_hook_restores_previous_state() {
        let kernel = CognitiveKernel::new();
        kernel.initialize(test_identity());
        kernel.set_state(CognitiveState::Learning);

        let result = kernel.process_signal_with("test", |_, _| Err("boom"));

        assert_eq!(result, Err("boom"));
        assert_eq!(kernel.state(), CognitiveState::Learning);
    }

    #[test]
    fn hook_sees_processing_state_and_score() {
        let kernel = Arc::new(CognitiveKernel::new());
        kernel.initialize(test_identity());
        let observer = Arc::clone(&kernel);

        let score = kernel
            .process_signal_with("cognitive", |text, score| {
                assert_eq!(text, "cognitive");
                assert_eq!(observer.state(), CognitiveState::Processing);
                assert!(score > 0.0);
                Ok::<(), ()>(())
            })
            .unwrap();
        assert!(score > 0.0);
    }

    #[test]
    fn transition_hook_fires_only_on_change() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let kernel = CognitiveKernel::with_transition_hook(move |from, to| {
            sink.lock().unwrap().push((from, to));
        });

        kernel.set_state(CognitiveState::Dormant);
        kernel.set_state(CognitiveState::Creating);
        kernel.set_state(CognitiveState::Creating);
        kernel.set_state(CognitiveState::Reasoning);

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                (CognitiveState::Dormant, CognitiveState::Creating),
                (CognitiveState::Creating, CognitiveState::Reasoning),
            ]
        );
    }

    #[test]
    fn transition_hook_may_reenter_kernel() {
        let kernel = Arc::new(Mutex::new(None::<Arc<CognitiveKernel>>));
        let slot = Arc::clone(&kernel);
        let built = Arc::new(CognitiveKernel::with_transition_hook(move |_, to| {
            if let Some(k) = slot.lock().unwrap().as_ref() {
                assert_eq!(k.state(), to);
            }
        }));
        *kernel.lock().unwrap() = Some(Arc::clone(&built));

        built.initialize(test_identity());
        built.process_signal("test");
        assert_eq!(built.state(), CognitiveState::Reflecting);
        *kernel.lock().unwrap() = None;
    }

    #[test]
    fn empty_inputs_have_zero_resonance() {
        let kernel = CognitiveKernel::new();
        assert!(kernel.calculate_resonance("anything").abs() < f64::EPSILON);

        kernel.initialize(test_identity());
        assert!(kernel.calculate_resonance("").abs() < f64::EPSILON);
    }

    #[test]
    fn matching_patterns_raise_resonance() {
        let kernel = CognitiveKernel::new();
        kernel.initialize(test_identity());

        let matching = kernel.calculate_resonance("test cognitive data");
        let unrelated = kernel.calculate_resonance("unrelated information");
        assert!(matching > unrelated);
    }

    #[test]
    fn patterns_compound_multiplicatively() {
        let bare = Identity::new("test_identity");
        let patterned = test_identity();
        let text = "test cognitive data";

        let ratio = resonance(text, &patterned) / resonance(text, &bare);
        assert!((ratio - PATTERN_BOOST * PATTERN_BOOST).abs() < 1e-9);
    }

    #[test]
    fn duplicate_patterns_count_once() {
        let once = Identity::new("sig").with_patterns(["echo"]);
        let twice = Identity::new("sig").with_patterns(["echo", "echo"]);
        let text = "echo chamber";
        assert!((resonance(text, &once) - resonance(text, &twice)).abs() < 1e-12);
    }

    #[test]
    fn weight_scales_resonance() {
        let unit = test_identity();
        let half = test_identity().with_weight(0.5);
        let zero = test_identity().with_weight(0.0);
        let text = "test cognitive data";

        assert!((resonance(text, &half) * 2.0 - resonance(text, &unit)).abs() < 1e-12);
        assert!(resonance(text, &zero).abs() < f64::EPSILON);
    }

    #[test]
    fn base_score_within_unit_interval() {
        let identity = Identity::new("sig");
        for text in ["a", "hello", "the quick brown fox", "sig"] {
            let score = resonance(text, &identity);
            assert!(score > 0.0 && score <= 1.0, "{text}: {score}");
        }
    }
}
