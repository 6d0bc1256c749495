//! Shared response cache with per-entry TTL.
//!
//! Expiry is checked lazily on read; an expired entry is treated as absent
//! and evicted on access. There is no background sweep. The cache is
//! constructed once by the embedding application and handed to agents as
//! `Arc<ResultCache>` rather than reached through a global.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::result::AgentResult;

/// Default lifetime for volatile entries (live news, current deals pages).
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct CacheEntry {
    value: AgentResult,
    /// `None` means the entry never expires.
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant) -> bool {
        matches!(self.expires_at, Some(deadline) if now >= deadline)
    }
}

#[derive(Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<AgentResult> {
        let mut entries = self.entries.lock().unwrap();
        let now = Instant::now();
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                debug!(key, "cache entry expired");
                entries.remove(key);
                None
            }
            Some(entry) => {
                debug!(key, "cache hit");
                Some(entry.value.clone())
            }
            None => None,
        }
    }

    /// Store a fully constructed result. Overwriting a key resets its TTL.
    pub fn set(&self, key: impl Into<String>, value: AgentResult, ttl: Option<Duration>) {
        let key = key.into();
        debug!(key = %key, ttl_secs = ttl.map(|t| t.as_secs()), "cache store");
        let entry = CacheEntry {
            value,
            expires_at: ttl.map(|t| Instant::now() + t),
        };
        self.entries.lock().unwrap().insert(key, entry);
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

/// Deterministic cache key from an agent name and its normalized inputs:
/// lowercased, whitespace collapsed to `_`, joined by `_`.
pub fn cache_key(agent: &str, parts: &[&str]) -> String {
    let mut key = agent.to_ascii_lowercase();
    for part in parts {
        let normalized = part
            .to_lowercase()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_");
        key.push('_');
        if normalized.is_empty() {
            key.push_str("none");
        } else {
            key.push_str(&normalized);
        }
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::AgentResult;

    fn sample() -> AgentResult {
        AgentResult::ok("cached", crate::artifact::Artifact::empty("n/a"))
    }

    #[test]
    fn test_round_trip() {
        let cache = ResultCache::new();
        cache.set("k", sample(), Some(DEFAULT_TTL));
        let value = cache.get("k").expect("entry should be present");
        assert_eq!(value.summary, "cached");
    }

    #[test]
    fn test_expired_entry_is_absent_and_evicted() {
        let cache = ResultCache::new();
        cache.set("k", sample(), Some(Duration::ZERO));
        assert!(cache.get("k").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_unbounded_entry_never_expires() {
        let cache = ResultCache::new();
        cache.set("lore", sample(), None);
        assert!(cache.get("lore").is_some());
    }

    #[test]
    fn test_overwrite_resets_ttl() {
        let cache = ResultCache::new();
        cache.set("k", sample(), Some(Duration::ZERO));
        cache.set("k", sample(), Some(DEFAULT_TTL));
        assert!(cache.get("k").is_some());
    }

    #[test]
    fn test_cache_key_normalization() {
        assert_eq!(
            cache_key("tactician", &["Elden Ring", "  best STR build ", "1.10"]),
            "tactician_elden_ring_best_str_build_1.10"
        );
        assert_eq!(cache_key("guide", &["Hades", ""]), "guide_hades_none");
    }

    #[test]
    fn test_identical_inputs_share_a_key() {
        let a = cache_key("news", &["Elden Ring", "patch notes"]);
        let b = cache_key("news", &["elden  ring", "PATCH NOTES"]);
        assert_eq!(a, b);
    }
}
