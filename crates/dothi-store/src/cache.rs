//! Time-boxed in-memory key/value cache.
//!
//! Reads never check freshness on their own: [`TimeBoxedCache::get`] returns
//! whatever is stored and [`TimeBoxedCache::is_valid`] answers the freshness
//! question separately, so callers can deliberately serve stale data when the
//! backend is down.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use dothi_core::Clock;

/// Ten minutes.
pub const DEFAULT_CACHE_WINDOW: Duration = Duration::from_secs(10 * 60);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<T> {
    pub data: T,
    /// Epoch millis of the write.
    pub timestamp: i64,
}

/// Anything a background sweeper can prune.
pub trait Sweep: Send + Sync {
    /// Removes expired entries and returns how many were dropped.
    fn sweep(&self) -> usize;
}

pub struct TimeBoxedCache<T> {
    entries: Mutex<HashMap<String, CacheEntry<T>>>,
    window: Duration,
    clock: Arc<dyn Clock>,
}

impl<T: Clone> TimeBoxedCache<T> {
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_window(clock, DEFAULT_CACHE_WINDOW)
    }

    #[must_use]
    pub fn with_window(clock: Arc<dyn Clock>, window: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            window,
            clock,
        }
    }

    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// The stored value, fresh or not.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<T> {
        self.lock().get(key).map(|entry| entry.data.clone())
    }

    /// The stored entry including its write timestamp.
    #[must_use]
    pub fn entry(&self, key: &str) -> Option<CacheEntry<T>> {
        self.lock().get(key).cloned()
    }

    /// True iff an entry exists and is younger than the default window.
    #[must_use]
    pub fn is_valid(&self, key: &str) -> bool {
        self.is_valid_within(key, self.window)
    }

    /// True iff an entry exists and is younger than `window`.
    #[must_use]
    pub fn is_valid_within(&self, key: &str, window: Duration) -> bool {
        let now = self.clock.now_millis();
        self.lock()
            .get(key)
            .is_some_and(|entry| now.saturating_sub(entry.timestamp) < window_millis(window))
    }

    /// Stores `value` stamped with the current time, replacing any entry.
    pub fn set(&self, key: impl Into<String>, value: T) {
        let timestamp = self.clock.now_millis();
        self.insert_at(key, value, timestamp);
    }

    /// Stores `value` with an explicit timestamp, e.g. when restoring an entry
    /// from a persisted snapshot so its age carries over.
    pub fn insert_at(&self, key: impl Into<String>, value: T, timestamp: i64) {
        self.lock().insert(
            key.into(),
            CacheEntry {
                data: value,
                timestamp,
            },
        );
    }

    /// Removes `key`, or everything when `key` is `None`.
    pub fn invalidate(&self, key: Option<&str>) {
        let mut entries = self.lock();
        match key {
            Some(key) => {
                entries.remove(key);
            }
            None => entries.clear(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // A panic while holding the lock cannot leave a HashMap half-written in a
    // way that matters here, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry<T>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone + Send> Sweep for TimeBoxedCache<T> {
    /// Drops entries strictly older than the default window.
    fn sweep(&self) -> usize {
        let now = self.clock.now_millis();
        let limit = window_millis(self.window);
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, entry| now.saturating_sub(entry.timestamp) <= limit);
        before - entries.len()
    }
}

fn window_millis(window: Duration) -> i64 {
    i64::try_from(window.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use dothi_core::ManualClock;

    use super::*;

    fn cache_at(clock: &Arc<ManualClock>) -> TimeBoxedCache<Vec<u32>> {
        TimeBoxedCache::new(Arc::clone(clock) as Arc<dyn Clock>)
    }

    #[test]
    fn set_then_is_valid() {
        let clock = Arc::new(ManualClock::new(1_000));
        let cache = cache_at(&clock);
        cache.set("k", vec![1, 2]);
        assert!(cache.is_valid("k"));
        assert_eq!(cache.get("k"), Some(vec![1, 2]));
    }

    #[test]
    fn expired_entry_is_invalid_but_still_readable() {
        let clock = Arc::new(ManualClock::new(1_000));
        let cache = cache_at(&clock);
        cache.set("k", vec![7]);
        clock.advance(DEFAULT_CACHE_WINDOW + Duration::from_millis(1));
        assert!(!cache.is_valid("k"));
        assert_eq!(cache.get("k"), Some(vec![7]));
    }

    #[test]
    fn entry_exactly_at_window_is_invalid() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = cache_at(&clock);
        cache.set("k", vec![]);
        clock.advance(DEFAULT_CACHE_WINDOW);
        assert!(!cache.is_valid("k"));
    }

    #[test]
    fn custom_window_overrides_default() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = cache_at(&clock);
        cache.set("k", vec![]);
        clock.advance(Duration::from_secs(90));
        assert!(cache.is_valid("k"));
        assert!(!cache.is_valid_within("k", Duration::from_secs(60)));
    }

    #[test]
    fn missing_key_is_absent_and_invalid() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = cache_at(&clock);
        assert_eq!(cache.get("nope"), None);
        assert!(!cache.is_valid("nope"));
    }

    #[test]
    fn set_refreshes_timestamp() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = cache_at(&clock);
        cache.set("k", vec![1]);
        clock.advance(Duration::from_secs(9 * 60));
        cache.set("k", vec![2]);
        clock.advance(Duration::from_secs(9 * 60));
        assert!(cache.is_valid("k"));
        assert_eq!(cache.entry("k").map(|e| e.timestamp), Some(540_000));
    }

    #[test]
    fn invalidate_one_or_all() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = cache_at(&clock);
        cache.set("a", vec![1]);
        cache.set("b", vec![2]);
        cache.invalidate(Some("a"));
        assert_eq!(cache.get("a"), None);
        assert_eq!(cache.len(), 1);
        cache.invalidate(None);
        assert!(cache.is_empty());
    }

    #[test]
    fn sweep_removes_only_expired_entries() {
        let clock = Arc::new(ManualClock::new(0));
        let cache = cache_at(&clock);
        cache.set("old", vec![1]);
        clock.advance(Duration::from_secs(6 * 60));
        cache.set("new", vec![2]);
        clock.advance(Duration::from_secs(5 * 60));

        assert_eq!(cache.sweep(), 1);
        assert_eq!(cache.get("old"), None);
        assert_eq!(cache.get("new"), Some(vec![2]));
    }

    #[test]
    fn insert_at_keeps_supplied_age() {
        let clock = Arc::new(ManualClock::new(1_000_000));
        let cache = cache_at(&clock);
        cache.insert_at("k", vec![3], 1_000_000 - 599_000);
        assert!(cache.is_valid("k"));
        clock.advance(Duration::from_secs(2));
        assert!(!cache.is_valid("k"));
    }
}
