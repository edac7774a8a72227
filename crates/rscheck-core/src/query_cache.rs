use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;

use crate::outcome::Outcome;

/// Result of a [`QueryCache::lookup`].
pub enum Lookup {
    Hit(Outcome),
    Miss,
}

/// Memoized per-request on-demand check results with TTL eviction.
///
/// Keyed by the raw URL query string, byte-for-byte stable across
/// identical requests (spec.md §3). A concurrent miss followed by two
/// stores is accepted — see spec.md §4.2 "Collision semantics" — so this
/// type introduces no additional coordination beyond the map's own lock.
pub struct QueryCache {
    entries: RwLock<HashMap<String, (Outcome, Instant)>>,
}

impl QueryCache {
    pub fn new() -> Self {
        QueryCache {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Returns a cached outcome if one exists and `now - timestamp <= ttl`.
    pub async fn lookup(&self, key: &str, ttl: Duration) -> Lookup {
        match self.entries.read().await.get(key) {
            Some((outcome, stored_at)) if stored_at.elapsed() <= ttl => {
                Lookup::Hit(outcome.clone())
            }
            _ => Lookup::Miss,
        }
    }

    /// Upserts `outcome` under `key`. The outcome's own timestamp is
    /// authoritative for expiry bookkeeping elsewhere, but eviction here is
    /// driven by the instant of insertion to keep `Sweep` simple and exact.
    pub async fn store(&self, key: String, outcome: Outcome) {
        self.entries.write().await.insert(key, (outcome, Instant::now()));
    }

    /// Removes every entry older than `ttl`.
    pub async fn sweep(&self, ttl: Duration) {
        self.entries
            .write()
            .await
            .retain(|_, (_, stored_at)| stored_at.elapsed() <= ttl);
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn miss_on_empty_cache() {
        let cache = QueryCache::new();
        assert!(matches!(
            cache.lookup("k", Duration::from_secs(1)).await,
            Lookup::Miss
        ));
    }

    #[tokio::test]
    async fn hit_within_ttl() {
        let cache = QueryCache::new();
        cache.store("k".to_string(), Outcome::ok("v")).await;
        match cache.lookup("k", Duration::from_secs(60)).await {
            Lookup::Hit(o) => assert_eq!(o.message, "v"),
            Lookup::Miss => panic!("expected hit"),
        }
    }

    #[tokio::test]
    async fn expires_after_ttl() {
        let cache = QueryCache::new();
        cache.store("k".to_string(), Outcome::ok("v")).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(matches!(
            cache.lookup("k", Duration::from_millis(5)).await,
            Lookup::Miss
        ));
    }

    #[tokio::test]
    async fn sweep_removes_only_stale_entries() {
        let cache = QueryCache::new();
        cache.store("fresh".to_string(), Outcome::ok("")).await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        cache.store("also_fresh".to_string(), Outcome::ok("")).await;

        cache.sweep(Duration::from_millis(10)).await;

        // "fresh" is now >10ms old, "also_fresh" is not.
        assert_eq!(cache.len().await, 1);
    }

    #[tokio::test]
    async fn last_store_wins_on_collision() {
        let cache = QueryCache::new();
        cache.store("k".to_string(), Outcome::ok("first")).await;
        cache.store("k".to_string(), Outcome::ok("second")).await;
        match cache.lookup("k", Duration::from_secs(60)).await {
            Lookup::Hit(o) => assert_eq!(o.message, "second"),
            Lookup::Miss => panic!("expected hit"),
        }
    }
}
