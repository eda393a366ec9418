//! Fixed-window rate limiting over an injectable store.
//!
//! Windows reset lazily: a record is only refreshed when its identifier is
//! seen again after the window ended. Nothing is evicted unless the host
//! calls [`RateLimitStore::sweep`].

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Default quota when callers do not supply one.
pub const DEFAULT_MAX_REQUESTS: u32 = 100;
/// Default window length in milliseconds.
pub const DEFAULT_WINDOW_MS: u64 = 60_000;

/// Per-identifier counter state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitRecord {
    pub count: u32,
    pub reset_at_ms: u64,
}

/// Storage for rate-limit records, owned by the host.
pub trait RateLimitStore: Send + Sync {
    fn get(&self, key: &str) -> Option<RateLimitRecord>;

    fn set(&self, key: &str, record: RateLimitRecord);

    /// Replace the record for `key` with `f(current)` as one atomic step.
    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<RateLimitRecord>) -> RateLimitRecord,
    ) -> RateLimitRecord;

    /// Drop records whose window ended before `now_ms`. Returns how many went.
    fn sweep(&self, now_ms: u64) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// [`RateLimitStore`] backed by a concurrent map. Unbounded.
#[derive(Debug, Default)]
pub struct InMemoryRateLimitStore {
    records: DashMap<String, RateLimitRecord>,
}

impl InMemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RateLimitStore for InMemoryRateLimitStore {
    fn get(&self, key: &str) -> Option<RateLimitRecord> {
        self.records.get(key).map(|r| *r.value())
    }

    fn set(&self, key: &str, record: RateLimitRecord) {
        self.records.insert(key.to_string(), record);
    }

    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<RateLimitRecord>) -> RateLimitRecord,
    ) -> RateLimitRecord {
        match self.records.entry(key.to_string()) {
            Entry::Occupied(mut entry) => {
                let next = f(Some(*entry.get()));
                entry.insert(next);
                next
            }
            Entry::Vacant(entry) => {
                let next = f(None);
                entry.insert(next);
                next
            }
        }
    }

    fn sweep(&self, now_ms: u64) -> usize {
        let before = self.records.len();
        self.records.retain(|_, record| now_ms <= record.reset_at_ms);
        before.saturating_sub(self.records.len())
    }

    fn len(&self) -> usize {
        self.records.len()
    }
}

/// Outcome of one rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub count: u32,
    pub limit: u32,
    pub remaining: u32,
    pub reset_at_ms: u64,
}

/// Fixed-window counter keyed by an opaque identifier.
#[derive(Clone)]
pub struct FixedWindowLimiter {
    store: Arc<dyn RateLimitStore>,
}

impl FixedWindowLimiter {
    pub fn new(store: Arc<dyn RateLimitStore>) -> Self {
        Self { store }
    }

    /// Limiter over a fresh [`InMemoryRateLimitStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryRateLimitStore::new()))
    }

    pub fn store(&self) -> &Arc<dyn RateLimitStore> {
        &self.store
    }

    /// Count one request from `identifier` and report whether it is allowed.
    pub fn check_rate_limit(&self, identifier: &str, max_requests: u32, window_ms: u64) -> bool {
        self.check(identifier, max_requests, window_ms).allowed
    }

    pub fn check(&self, identifier: &str, max_requests: u32, window_ms: u64) -> RateLimitDecision {
        self.check_at(identifier, max_requests, window_ms, now_ms())
    }

    /// [`check`](Self::check) with an explicit clock reading.
    pub fn check_at(
        &self,
        identifier: &str,
        max_requests: u32,
        window_ms: u64,
        now_ms: u64,
    ) -> RateLimitDecision {
        let record = self.store.update(identifier, &mut |current| match current {
            Some(record) if now_ms <= record.reset_at_ms => RateLimitRecord {
                count: record.count.saturating_add(1),
                reset_at_ms: record.reset_at_ms,
            },
            _ => RateLimitRecord {
                count: 1,
                reset_at_ms: now_ms.saturating_add(window_ms),
            },
        });

        RateLimitDecision {
            allowed: record.count <= max_requests,
            count: record.count,
            limit: max_requests,
            remaining: max_requests.saturating_sub(record.count),
            reset_at_ms: record.reset_at_ms,
        }
    }

    /// Drop every record whose window has ended.
    pub fn sweep_expired(&self) -> usize {
        self.store.sweep(now_ms())
    }
}

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fourth_request_denied() {
        let limiter = FixedWindowLimiter::in_memory();
        let results: Vec<bool> = (0..4)
            .map(|i| limiter.check_at("client", 3, 1000, 10_000 + i * 10).allowed)
            .collect();
        assert_eq!(results, vec![true, true, true, false]);
    }

    #[test]
    fn test_wall_clock_check() {
        let limiter = FixedWindowLimiter::in_memory();
        let results: Vec<bool> = (0..4)
            .map(|_| limiter.check_rate_limit("client", 3, 60_000))
            .collect();
        assert_eq!(results, vec![true, true, true, false]);
    }

    #[test]
    fn test_window_resets_after_expiry() {
        let limiter = FixedWindowLimiter::in_memory();
        assert!(limiter.check_at("c", 1, 1000, 0).allowed);
        assert!(!limiter.check_at("c", 1, 1000, 500).allowed);
        // still inside the window at exactly reset time
        assert!(!limiter.check_at("c", 1, 1000, 1000).allowed);

        let decision = limiter.check_at("c", 1, 1000, 1001);
        assert!(decision.allowed);
        assert_eq!(decision.count, 1);
        assert_eq!(decision.reset_at_ms, 2001);
    }

    #[test]
    fn test_boundary_burst_is_allowed() {
        let limiter = FixedWindowLimiter::in_memory();
        let mut allowed = 0;
        for t in [0, 990, 995, 999] {
            if limiter.check_at("c", 2, 1000, t).allowed {
                allowed += 1;
            }
        }
        for t in [1001, 1002] {
            if limiter.check_at("c", 2, 1000, t).allowed {
                allowed += 1;
            }
        }
        assert_eq!(allowed, 4);
    }

    #[test]
    fn test_identifiers_independent() {
        let limiter = FixedWindowLimiter::in_memory();
        assert!(limiter.check_at("a", 1, 1000, 0).allowed);
        assert!(!limiter.check_at("a", 1, 1000, 1).allowed);
        assert!(limiter.check_at("b", 1, 1000, 1).allowed);
    }

    #[test]
    fn test_decision_remaining() {
        let limiter = FixedWindowLimiter::in_memory();
        let first = limiter.check_at("c", 2, 1000, 0);
        assert_eq!(first.remaining, 1);
        assert_eq!(first.limit, 2);
        limiter.check_at("c", 2, 1000, 1);
        let third = limiter.check_at("c", 2, 1000, 2);
        assert!(!third.allowed);
        assert_eq!(third.remaining, 0);
        assert_eq!(third.count, 3);
    }

    #[test]
    fn test_sweep_removes_only_expired() {
        let store = Arc::new(InMemoryRateLimitStore::new());
        let limiter = FixedWindowLimiter::new(store.clone());
        limiter.check_at("old", 5, 100, 0);
        limiter.check_at("fresh", 5, 100, 1000);
        assert_eq!(store.len(), 2);

        assert_eq!(store.sweep(500), 1);
        assert!(store.get("old").is_none());
        assert!(store.get("fresh").is_some());
    }

    #[test]
    fn test_store_get_set() {
        let store = InMemoryRateLimitStore::new();
        assert!(store.is_empty());
        let record = RateLimitRecord { count: 2, reset_at_ms: 99 };
        store.set("k", record);
        assert_eq!(store.get("k"), Some(record));
    }

    #[test]
    fn test_concurrent_updates_are_atomic() {
        let limiter = FixedWindowLimiter::in_memory();
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    (0..100)
                        .filter(|_| limiter.check_at("shared", 500, 60_000, 1).allowed)
                        .count()
                })
            })
            .collect();
        let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(allowed, 500);
        assert_eq!(limiter.store().get("shared").unwrap().count, 800);
    }
}
