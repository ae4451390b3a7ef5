//! Deduplicating warning registry.
//!
//! Backend fallbacks are reported through `log::warn!`, but the same cause
//! (e.g. a legacy `.xls` file forcing the slow automation path) can fire once
//! per sheet or per repeated call. The registry keeps a set of stable keys so
//! each distinct cause is logged exactly once per extraction session.

use std::collections::HashSet;

/// Emits each warning at most once, keyed by a caller-chosen stable key.
///
/// One registry is owned by a single extraction session; dropping it resets
/// the deduplication state.
#[derive(Debug, Default)]
pub struct WarnRegistry {
    seen: HashSet<String>,
}

impl WarnRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Log `message` via `log::warn!` unless `key` has been seen before.
    ///
    /// Returns true when the message was actually emitted.
    pub fn warn_once(&mut self, key: impl Into<String>, message: impl AsRef<str>) -> bool {
        if self.seen.insert(key.into()) {
            log::warn!("{}", message.as_ref());
            true
        } else {
            false
        }
    }

    /// Whether a key has already been emitted.
    pub fn has_warned(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    /// Number of distinct warnings emitted so far.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Check if no warnings have been emitted.
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warn_once_deduplicates() {
        let mut registry = WarnRegistry::new();
        assert!(registry.warn_once("xls-fallback::book.xls", "first"));
        assert!(!registry.warn_once("xls-fallback::book.xls", "second"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_distinct_keys_both_fire() {
        let mut registry = WarnRegistry::new();
        assert!(registry.warn_once("a", "msg"));
        assert!(registry.warn_once("b", "msg"));
        assert!(registry.has_warned("a"));
        assert!(registry.has_warned("b"));
        assert!(!registry.has_warned("c"));
    }

    #[test]
    fn test_fresh_registry_resets_state() {
        let mut first = WarnRegistry::new();
        first.warn_once("k", "msg");
        let mut second = WarnRegistry::new();
        assert!(second.warn_once("k", "msg"));
    }
}
