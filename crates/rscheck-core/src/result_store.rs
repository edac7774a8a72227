use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::outcome::Outcome;

/// Thread-safe registry of named check outcomes.
///
/// The key set (configured check names) is fixed at startup — see
/// spec.md §3 Lifecycle. Writers ([`crate::runner::CheckRunner`]s) and the
/// reader ([`crate::aggregator::Aggregator`]) share one instance through an
/// `Arc`.
pub struct ResultStore {
    entries: RwLock<HashMap<String, Outcome>>,
}

impl ResultStore {
    /// Pre-populate one sentinel entry per configured check name, per
    /// spec.md §9's "explicit pre-population at startup over the known key
    /// set" redesign direction.
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        let entries = names
            .into_iter()
            .map(|name| (name, Outcome::sentinel()))
            .collect();
        ResultStore {
            entries: RwLock::new(entries),
        }
    }

    /// Replace the entry for `name`. Idempotent modulo timestamp.
    pub async fn update(&self, name: &str, outcome: Outcome) {
        self.entries.write().await.insert(name.to_string(), outcome);
    }

    /// Current outcome for `name`, or the sentinel if `name` is unknown.
    pub async fn get(&self, name: &str) -> Outcome {
        self.entries
            .read()
            .await
            .get(name)
            .cloned()
            .unwrap_or_else(Outcome::sentinel)
    }

    /// Point-in-time view of every entry whose name is not in `exclude`.
    ///
    /// Each returned `Outcome` is a complete, non-torn entry because it is
    /// cloned while holding the read lock; the snapshot as a whole need not
    /// be a simultaneous cut across all entries.
    pub async fn snapshot(&self, exclude: &std::collections::HashSet<String>) -> HashMap<String, Outcome> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|(name, _)| !exclude.contains(*name))
            .map(|(name, outcome)| (name.clone(), outcome.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Status;
    use std::collections::HashSet;

    #[tokio::test]
    async fn unknown_name_returns_sentinel() {
        let store = ResultStore::new(vec!["c1".to_string()]);
        let outcome = store.get("nope").await;
        assert_eq!(outcome.status, Status::Ok);
        assert_eq!(outcome.message, "");
    }

    #[tokio::test]
    async fn update_replaces_wholesale() {
        let store = ResultStore::new(vec!["c1".to_string()]);
        store.update("c1", Outcome::error("boom")).await;
        let outcome = store.get("c1").await;
        assert_eq!(outcome.status, Status::Error);
        assert_eq!(outcome.message, "boom");
    }

    #[tokio::test]
    async fn snapshot_respects_exclusion() {
        let store = ResultStore::new(vec!["c1".to_string(), "c2".to_string()]);
        store.update("c1", Outcome::ok("")).await;
        store.update("c2", Outcome::error("bad")).await;

        let mut exclude = HashSet::new();
        exclude.insert("c2".to_string());
        let snap = store.snapshot(&exclude).await;

        assert!(snap.contains_key("c1"));
        assert!(!snap.contains_key("c2"));
    }

    #[tokio::test]
    async fn timestamps_are_monotone_across_snapshots() {
        let store = ResultStore::new(vec!["c1".to_string()]);
        store.update("c1", Outcome::ok("first")).await;
        let first = store.get("c1").await.timestamp;

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.update("c1", Outcome::ok("second")).await;
        let second = store.get("c1").await.timestamp;

        assert!(second >= first);
    }
}
