//! # Working Memory
//!
//! A thread-safe string-keyed store used by the cognitive kernel.
//!
//! Keys are unique and last-write-wins. The store only grows until
//! `clear()` is called.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Synchronized key-value working memory.
#[derive(Debug, Default)]
pub struct Memory {
    entries: Mutex<BTreeMap<String, String>>,
}

impl Memory {
    /// Create an empty memory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn store(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock().insert(key.into(), value.into());
    }

    /// Retrieve the value stored under `key`.
    #[must_use]
    pub fn retrieve(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    #[must_use]
    pub fn exists(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    /// Remove `key`. Returns false if it was absent.
    pub fn remove(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Remove every key starting with `prefix`. Returns the number removed.
    pub fn remove_prefixed(&self, prefix: &str) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|key, _| !key.starts_with(prefix));
        before - entries.len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
