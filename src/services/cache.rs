// In-memory TTL cache for aggregate results
// Entries expire lazily: reads past the TTL are misses, and the stale entry is
// overwritten by the next successful put for the same key. purge_expired()
// exists for the background sweeper so dead entries do not pile up.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::models::AggregateResult;

/// Default time-to-live for cached lookups
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Source of "now" for expiry decisions
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: String,
    pub value: AggregateResult,
    pub created_at: DateTime<Utc>,
}

/// Normalize a title into a cache key: trimmed, lowercased, otherwise exact
pub fn cache_key(title: &str) -> String {
    title.trim().to_lowercase()
}

pub struct TtlCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl TtlCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
            clock,
        }
    }

    fn is_expired(&self, entry: &CacheEntry, now: DateTime<Utc>) -> bool {
        now - entry.created_at >= self.ttl
    }

    /// Fresh cached result for `key`, or None on miss or expiry
    pub async fn get(&self, key: &str) -> Option<AggregateResult> {
        let entries = self.entries.read().await;
        let entry = entries.get(key)?;

        if self.is_expired(entry, self.clock.now()) {
            tracing::debug!(
                "Cache entry for '{}' expired at {}",
                entry.key,
                entry.created_at + self.ttl
            );
            return None;
        }

        Some(entry.value.clone())
    }

    /// Store `value` under `key`, replacing whatever was there
    pub async fn put(&self, key: &str, value: AggregateResult) {
        let entry = CacheEntry {
            key: key.to_string(),
            value,
            created_at: self.clock.now(),
        };
        self.entries.write().await.insert(key.to_string(), entry);
    }

    /// Drop every expired entry, returning how many were removed
    pub async fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| !self.is_expired(entry, now));
        before - entries.len()
    }

    /// Number of stored entries, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}


#[cfg(test)]
mod tests {
    use super::testing::ManualClock;
    use super::*;
    use crate::models::Score;

    fn result(title: &str, score: f64) -> AggregateResult {
        AggregateResult {
            title: title.to_string(),
            imdb_score: Score::new(score),
            letterboxd_score: None,
            rotten_tomatoes: None,
            aggregate_score: Score::new(score).unwrap(),
            year: None,
            poster_url: None,
        }
    }

    fn cache(clock: &Arc<ManualClock>) -> TtlCache {
        TtlCache::with_clock(Duration::hours(DEFAULT_TTL_HOURS), clock.clone())
    }

    #[test]
    fn test_cache_key_is_case_insensitive() {
        assert_eq!(cache_key("The Departed"), cache_key("the departed"));
        assert_eq!(cache_key("  HEAT "), "heat");
        assert_ne!(cache_key("Heat"), cache_key("Heat 2"));
    }

    #[tokio::test]
    async fn test_hit_within_ttl() {
        let clock = ManualClock::new();
        let cache = cache(&clock);

        cache.put("heat", result("Heat", 83.0)).await;
        clock.advance(Duration::hours(23) + Duration::minutes(59));

        assert_eq!(cache.get("heat").await, Some(result("Heat", 83.0)));
    }

    #[tokio::test]
    async fn test_miss_at_and_after_ttl() {
        let clock = ManualClock::new();
        let cache = cache(&clock);

        cache.put("heat", result("Heat", 83.0)).await;
        clock.advance(Duration::hours(DEFAULT_TTL_HOURS));

        assert_eq!(cache.get("heat").await, None);
        // Expired entries linger until overwritten or purged
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_unknown_key_misses() {
        let clock = ManualClock::new();
        assert_eq!(cache(&clock).get("nothing").await, None);
    }

    #[tokio::test]
    async fn test_put_overwrites_and_resets_age() {
        let clock = ManualClock::new();
        let cache = cache(&clock);

        cache.put("heat", result("Heat", 83.0)).await;
        clock.advance(Duration::hours(30));
        cache.put("heat", result("Heat", 84.0)).await;
        clock.advance(Duration::hours(1));

        assert_eq!(cache.get("heat").await, Some(result("Heat", 84.0)));
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn test_purge_expired() {
        let clock = ManualClock::new();
        let cache = cache(&clock);

        cache.put("old", result("Old", 50.0)).await;
        clock.advance(Duration::hours(20));
        cache.put("new", result("New", 60.0)).await;
        clock.advance(Duration::hours(5));

        assert_eq!(cache.purge_expired().await, 1);
        assert_eq!(cache.len().await, 1);
        assert!(cache.get("new").await.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_access() {
        let cache = Arc::new(TtlCache::new(Duration::hours(1)));

        let mut handles = Vec::new();
        for i in 0..16 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move {
                let key = format!("title-{}", i % 4);
                cache.put(&key, result(&key, i as f64)).await;
                cache.get(&key).await
            }));
        }

        for handle in handles {
            assert!(handle.await.unwrap().is_some());
        }
        assert_eq!(cache.len().await, 4);
    }
}
