use crate::pipeline::ExtractionResult;
use crate::render::RenderedFields;
use chrono::{DateTime, Duration, Utc};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Mutex;

/// Sweep interval. The sweep is a whole-cache clear, not a per-entry TTL.
pub const SWEEP_INTERVAL_SECS: i64 = 300;

/// Everything a cache hit has to reproduce: the structured result plus the
/// rendered field strings, so re-applying a previous extraction never
/// re-runs the pipeline or re-asks the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedExtraction {
    pub result: ExtractionResult,
    pub fields: RenderedFields,
}

#[derive(Debug)]
struct CacheState {
    entries: HashMap<u64, CachedExtraction>,
    last_sweep: DateTime<Utc>,
}

/// In-memory memo of extraction results keyed by a hash of the raw input
/// text. A single lock guards get/put/sweep; contention is negligible at a
/// human paste rate, and the sweep only ever clears, never partially
/// mutates, so in-flight extractions are unaffected.
#[derive(Debug)]
pub struct ResultCache {
    inner: Mutex<CacheState>,
}

impl Default for ResultCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultCache {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(CacheState {
                entries: HashMap::new(),
                last_sweep: Utc::now(),
            }),
        }
    }

    /// Cache key for a raw input text.
    pub fn key_for(text: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        hasher.finish()
    }

    pub fn get(&self, key: u64) -> Option<CachedExtraction> {
        self.inner.lock().expect("cache lock poisoned").entries.get(&key).cloned()
    }

    pub fn put(&self, key: u64, entry: CachedExtraction) {
        self.inner
            .lock()
            .expect("cache lock poisoned")
            .entries
            .insert(key, entry);
    }

    /// Unconditional whole-cache clear.
    pub fn sweep(&self) {
        let mut state = self.inner.lock().expect("cache lock poisoned");
        let evicted = state.entries.len();
        state.entries.clear();
        state.last_sweep = Utc::now();
        if evicted > 0 {
            log::debug!("[Cache] Swept {} entries", evicted);
        }
    }

    /// Clears the cache if the sweep interval has elapsed since the last
    /// sweep. Returns whether a sweep happened. Callers drive this from
    /// whatever timer their environment provides.
    pub fn sweep_if_due(&self, now: DateTime<Utc>) -> bool {
        let mut state = self.inner.lock().expect("cache lock poisoned");
        if now - state.last_sweep < Duration::seconds(SWEEP_INTERVAL_SECS) {
            return false;
        }
        state.entries.clear();
        state.last_sweep = now;
        true
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("cache lock poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::ExtractionResult;
    use crate::render::RenderedFields;

    fn entry(price: u64) -> CachedExtraction {
        CachedExtraction {
            result: ExtractionResult {
                price,
                legs: vec![],
                is_round_trip: false,
                warnings: vec![],
            },
            fields: RenderedFields {
                price: price.to_string(),
                legs: vec![],
                note: String::new(),
            },
        }
    }

    #[test]
    fn test_key_is_stable_and_text_sensitive() {
        let a = ResultCache::key_for("vj1175 hà nội");
        let b = ResultCache::key_for("vj1175 hà nội");
        let c = ResultCache::key_for("vj1175 hà nội ");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_put_get_sweep() {
        let cache = ResultCache::new();
        let key = ResultCache::key_for("text");
        assert!(cache.get(key).is_none());

        cache.put(key, entry(1_500_000));
        assert_eq!(cache.get(key).unwrap().result.price, 1_500_000);
        assert_eq!(cache.len(), 1);

        cache.sweep();
        assert!(cache.get(key).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_sweep_if_due_respects_interval() {
        let cache = ResultCache::new();
        cache.put(1, entry(1));

        let now = Utc::now();
        assert!(!cache.sweep_if_due(now), "interval has not elapsed yet");
        assert_eq!(cache.len(), 1);

        let later = now + Duration::seconds(SWEEP_INTERVAL_SECS + 1);
        assert!(cache.sweep_if_due(later));
        assert!(cache.is_empty());

        // A fresh interval starts counting from the sweep that just ran.
        assert!(!cache.sweep_if_due(later + Duration::seconds(1)));
    }
}
