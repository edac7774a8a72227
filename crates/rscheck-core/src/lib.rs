//! Host-side primitives for the RSCheck health-probing daemon: the
//! concurrent check-execution engine and result aggregator. HTTP
//! transport, configuration loading, and process supervision live in the
//! `rscheck` binary crate; this crate is pure `tokio`/async with no
//! framework dependency.

pub mod aggregator;
pub mod error;
pub mod outcome;
pub mod probe;
pub mod query_cache;
pub mod result_store;
pub mod runner;
pub mod spec;

pub use aggregator::{Aggregator, QueryArgs};
pub use error::{ConfigError, ProbeError, QueryError};
pub use outcome::{Outcome, Status};
pub use probe::{Probe, ProbeKind, ProbeResources, ProbeSuccess};
pub use query_cache::QueryCache;
pub use result_store::ResultStore;
pub use runner::CheckRunner;
pub use spec::CheckSpec;

#[cfg(test)]
mod property_tests {
    use std::collections::HashSet;

    use proptest::prelude::*;
    use proptest::test_runner::TestCaseError;
    use regex::Regex;

    use crate::outcome::Outcome;
    use crate::result_store::ResultStore;

    /// Monotone timestamps — spec.md §8: outcome timestamps for a given
    /// check never move backward across successive snapshots.
    fn monotone_timestamps_holds(updates: usize) -> Result<(), TestCaseError> {
        tokio::runtime::Runtime::new().unwrap().block_on(async {
            let store = ResultStore::new(vec!["c".to_string()]);
            let mut last = store.get("c").await.timestamp;
            for _ in 0..updates {
                store.update("c", Outcome::ok("")).await;
                let now = store.get("c").await.timestamp;
                prop_assert!(now >= last);
                last = now;
            }
            Ok(())
        })
    }

    /// Exclusion correctness — spec.md §8: a snapshot excludes exactly the
    /// names passed to it, regardless of their outcome.
    fn exclusion_correctness_holds(names: Vec<String>, exclude_idx: Vec<usize>) -> Result<(), TestCaseError> {
        tokio::runtime::Runtime::new().unwrap().block_on(async {
            let names: Vec<String> = names.into_iter().collect::<HashSet<_>>().into_iter().collect();
            if names.is_empty() {
                return Ok(());
            }
            let store = ResultStore::new(names.clone());
            let exclude: HashSet<String> = exclude_idx
                .into_iter()
                .filter_map(|i| names.get(i % names.len()).cloned())
                .collect();

            let snap = store.snapshot(&exclude).await;

            for name in &names {
                if exclude.contains(name) {
                    prop_assert!(!snap.contains_key(name));
                } else {
                    prop_assert!(snap.contains_key(name));
                }
            }
            Ok(())
        })
    }

    proptest! {
        #[test]
        fn monotone_timestamps(updates in 1usize..20) {
            monotone_timestamps_holds(updates)?;
        }

        #[test]
        fn exclusion_correctness(
            names in prop::collection::vec("[a-z]{1,6}", 1..8),
            exclude_idx in prop::collection::vec(0usize..8, 0..8),
        ) {
            exclusion_correctness_holds(names, exclude_idx)?;
        }

        /// Regex anchoring — spec.md §8: prefix match only, never a
        /// substring match starting mid-string.
        #[test]
        fn regex_anchoring_is_prefix_only(suffix in "[a-zA-Z0-9]{0,8}", prefix_garbage in "[a-zA-Z0-9]{1,8}") {
            let re = Regex::new("^true").unwrap();
            let anchored = format!("true{suffix}");
            let not_anchored = format!("{prefix_garbage} true{suffix}");

            prop_assert!(re.find(&anchored).map(|m| m.start() == 0).unwrap_or(false));

            let mid_match_ok = re
                .find(&not_anchored)
                .map(|m| m.start() == 0)
                .unwrap_or(false);
            prop_assert!(!mid_match_ok);
        }
    }
}
