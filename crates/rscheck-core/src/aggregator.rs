//! Top-level façade the HTTP layer calls into: [`Aggregator`] owns the
//! [`ResultStore`], the [`QueryCache`], and the configured check
//! directory, and exposes `run_query`/`snapshot`/`all_healthy` — spec.md
//! §4.5.

use std::collections::{HashMap, HashSet};
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;

use crate::error::{ProbeError, QueryError};
use crate::outcome::{Outcome, Status};
use crate::probe::interfaces::{check_interface, interface_has_ip};
use crate::probe::sysctl::read_sysctl;
use crate::query_cache::{Lookup, QueryCache};
use crate::result_store::ResultStore;

/// Parsed, first-occurrence-wins query-string arguments — spec.md §3.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryArgs {
    pub exclude: Vec<String>,
    pub virtual_if: Option<String>,
    pub virtual_ip: Vec<String>,
    /// First arg-name seen that isn't `exclude`, `virtual_if`, or
    /// `virtual_ip` — recognized-but-invalid at evaluation time, not a
    /// structural parse failure.
    pub unrecognized: Option<String>,
}

/// Splits a raw HTTP query string into ordered `(name, value)` pairs.
///
/// Structural validity only: every non-empty `&`-separated segment must
/// contain a `=`. Semantic validation (recognized arg-names, paired
/// `virtual_if`/`virtual_ip`) happens in [`QueryArgs::from_pairs`] and
/// [`evaluate_query`] — spec.md §6's `400` is for *this* failure only.
pub fn parse_pairs(raw: &str) -> Result<Vec<(String, String)>, QueryError> {
    if raw.is_empty() {
        return Ok(Vec::new());
    }
    raw.split('&')
        .map(|segment| {
            segment
                .split_once('=')
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .ok_or(QueryError::Malformed)
        })
        .collect()
}

impl QueryArgs {
    /// Builds [`QueryArgs`] from already-structurally-valid pairs, keeping
    /// only the first occurrence of each recognized arg-name.
    pub fn from_pairs(pairs: &[(String, String)]) -> QueryArgs {
        let mut args = QueryArgs::default();
        let mut seen: HashSet<&str> = HashSet::new();

        for (name, value) in pairs {
            match name.as_str() {
                "exclude" => {
                    if seen.insert("exclude") {
                        args.exclude = split_csv(value);
                    }
                }
                "virtual_if" => {
                    if seen.insert("virtual_if") {
                        args.virtual_if = Some(value.clone());
                    }
                }
                "virtual_ip" => {
                    if seen.insert("virtual_ip") {
                        args.virtual_ip = split_csv(value);
                    }
                }
                other => {
                    if args.unrecognized.is_none() {
                        args.unrecognized = Some(other.to_string());
                    }
                }
            }
        }

        args
    }
}

fn split_csv(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Owns [`ResultStore`] + [`QueryCache`] and the configured check
/// directory. Passed explicitly to HTTP handlers and runners rather than
/// exposed through process-wide statics — spec.md §9.
pub struct Aggregator {
    result_store: Arc<ResultStore>,
    query_cache: Arc<QueryCache>,
    query_cache_ttl: Duration,
}

impl Aggregator {
    pub fn new(result_store: Arc<ResultStore>, query_cache: Arc<QueryCache>, query_cache_ttl: Duration) -> Self {
        Aggregator {
            result_store,
            query_cache,
            query_cache_ttl,
        }
    }

    pub fn query_cache(&self) -> Arc<QueryCache> {
        self.query_cache.clone()
    }

    pub fn query_cache_ttl(&self) -> Duration {
        self.query_cache_ttl
    }

    /// Consults the query cache by the raw query string; on miss,
    /// synchronously evaluates the query under `query_timeout`, stores the
    /// result, and returns it.
    pub async fn run_query(
        &self,
        query_key: &str,
        args: &QueryArgs,
        query_timeout: Duration,
        error_message: bool,
    ) -> Outcome {
        if let Lookup::Hit(outcome) = self.query_cache.lookup(query_key, self.query_cache_ttl).await {
            return outcome;
        }

        let outcome = match timeout(query_timeout, evaluate_query(args)).await {
            Ok(Ok(())) => Outcome::ok(""),
            Ok(Err(cause)) => {
                tracing::error!(query = %query_key, error = %cause, "query evaluation failed");
                Outcome::error(if error_message { cause.to_string() } else { String::new() })
            }
            Err(_) => {
                tracing::error!(query = %query_key, "query evaluation timed out");
                Outcome::error(if error_message { "query timed out".to_string() } else { String::new() })
            }
        };

        self.query_cache.store(query_key.to_string(), outcome.clone()).await;
        outcome
    }

    /// Composes the query outcome (if any) and every non-excluded check
    /// outcome into a final `(status, message)` verdict — spec.md §4.5.
    pub async fn snapshot(&self, query_outcome: Option<&Outcome>, exclude: &[String]) -> (Status, String) {
        let exclude_set: HashSet<String> = exclude.iter().cloned().collect();
        let checks = self.result_store.snapshot(&exclude_set).await;

        let status = match query_outcome {
            Some(q) if !q.status.is_ok() => Status::Error,
            _ if checks.values().any(|o| !o.status.is_ok()) => Status::Error,
            _ => Status::Ok,
        };

        let message = compose_message(status, query_outcome, &checks);
        (status, message)
    }

    /// Predicate form of [`Aggregator::snapshot`]'s OK branch.
    pub async fn all_healthy(&self, query_outcome: Option<&Outcome>, exclude: &[String]) -> bool {
        self.snapshot(query_outcome, exclude).await.0.is_ok()
    }
}

/// Joins every message on the winning `status` side, sorted by check name
/// with the query message (if present) first; falls back to the canonical
/// `"true"`/`"false"` when nothing on that side has a message.
fn compose_message(status: Status, query_outcome: Option<&Outcome>, checks: &HashMap<String, Outcome>) -> String {
    let mut names: Vec<&String> = checks.keys().collect();
    names.sort();

    let mut parts: Vec<String> = Vec::new();

    if let Some(q) = query_outcome {
        if q.status == status && !q.message.is_empty() {
            parts.push(q.message.clone());
        }
    }

    for name in names {
        let outcome = &checks[name];
        if outcome.status == status && !outcome.message.is_empty() {
            parts.push(outcome.message.clone());
        }
    }

    if parts.is_empty() {
        if status.is_ok() { "true".to_string() } else { "false".to_string() }
    } else {
        parts.join("; ")
    }
}

/// Evaluates one parsed query against live host state — spec.md §4.5's
/// "Query evaluation" rules. `exclude` and `virtual_ip` alone contribute
/// no work; `virtual_if` triggers the virtual-interface check; any other
/// recognized-but-unexpected arg-name is an error.
async fn evaluate_query(args: &QueryArgs) -> Result<(), ProbeError> {
    if let Some(name) = &args.unrecognized {
        return Err(ProbeError::Other(QueryError::InvalidArg(name.clone()).to_string()));
    }

    match (&args.virtual_if, args.virtual_ip.is_empty()) {
        (None, true) => Ok(()),
        (Some(_), true) | (None, false) => {
            Err(ProbeError::Other(QueryError::IncompleteVirtualArgs.to_string()))
        }
        (Some(iface), false) => check_virtual_if(iface, &args.virtual_ip).await,
    }
}

async fn check_virtual_if(iface: &str, virtual_ip: &[String]) -> Result<(), ProbeError> {
    check_interface(iface).await?;

    let rp_filter_var = format!("net.ipv4.conf.{iface}.rp_filter");
    let rp_filter = read_sysctl(&rp_filter_var).await;
    if rp_filter != "0" {
        return Err(ProbeError::Other(format!(
            "rp_filter not disabled for {iface} (read {rp_filter:?})"
        )));
    }

    for ip_str in virtual_ip {
        let ip: IpAddr = ip_str
            .parse()
            .map_err(|_| ProbeError::Other(format!("invalid virtual_ip literal {ip_str:?}")))?;
        if !interface_has_ip(iface, ip).await? {
            return Err(ProbeError::Other(format!("{ip} not bound to {iface}")));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_pairs_splits_on_ampersand_and_equals() {
        let pairs = parse_pairs("exclude=c2&virtual_if=eth0").unwrap();
        assert_eq!(
            pairs,
            vec![
                ("exclude".to_string(), "c2".to_string()),
                ("virtual_if".to_string(), "eth0".to_string()),
            ]
        );
    }

    #[test]
    fn parse_pairs_empty_string_is_no_pairs() {
        assert_eq!(parse_pairs("").unwrap(), Vec::new());
    }

    #[test]
    fn parse_pairs_rejects_segment_without_equals() {
        assert!(parse_pairs("malformed").is_err());
        assert!(parse_pairs("exclude=c2&malformed").is_err());
    }

    #[test]
    fn from_pairs_first_occurrence_wins() {
        let pairs = vec![
            ("exclude".to_string(), "c1".to_string()),
            ("exclude".to_string(), "c2".to_string()),
        ];
        let args = QueryArgs::from_pairs(&pairs);
        assert_eq!(args.exclude, vec!["c1".to_string()]);
    }

    #[test]
    fn from_pairs_splits_csv_lists() {
        let pairs = vec![("virtual_ip".to_string(), "10.0.0.1, 10.0.0.2".to_string())];
        let args = QueryArgs::from_pairs(&pairs);
        assert_eq!(args.virtual_ip, vec!["10.0.0.1".to_string(), "10.0.0.2".to_string()]);
    }

    #[test]
    fn from_pairs_flags_unrecognized_name() {
        let pairs = vec![("bogus".to_string(), "1".to_string())];
        let args = QueryArgs::from_pairs(&pairs);
        assert_eq!(args.unrecognized, Some("bogus".to_string()));
    }

    #[tokio::test]
    async fn evaluate_query_with_no_args_is_ok() {
        let args = QueryArgs::default();
        assert!(evaluate_query(&args).await.is_ok());
    }

    #[tokio::test]
    async fn evaluate_query_virtual_if_without_virtual_ip_is_error() {
        let args = QueryArgs {
            virtual_if: Some("eth0".to_string()),
            ..Default::default()
        };
        assert!(evaluate_query(&args).await.is_err());
    }

    #[tokio::test]
    async fn evaluate_query_virtual_ip_without_virtual_if_is_error() {
        let args = QueryArgs {
            virtual_ip: vec!["10.0.0.1".to_string()],
            ..Default::default()
        };
        assert!(evaluate_query(&args).await.is_err());
    }

    #[tokio::test]
    async fn evaluate_query_unrecognized_name_is_error() {
        let args = QueryArgs {
            unrecognized: Some("bogus".to_string()),
            ..Default::default()
        };
        assert!(evaluate_query(&args).await.is_err());
    }

    #[tokio::test]
    async fn snapshot_ok_with_no_messages_renders_true() {
        let store = Arc::new(ResultStore::new(vec!["c1".to_string(), "c2".to_string()]));
        store.update("c1", Outcome::ok("")).await;
        store.update("c2", Outcome::ok("")).await;
        let agg = Aggregator::new(store, Arc::new(QueryCache::new()), Duration::from_secs(30));

        let (status, message) = agg.snapshot(None, &[]).await;
        assert_eq!(status, Status::Ok);
        assert_eq!(message, "true");
    }

    #[tokio::test]
    async fn snapshot_error_joins_error_messages_sorted_by_name() {
        let store = Arc::new(ResultStore::new(vec!["c1".to_string(), "c2".to_string()]));
        store.update("c1", Outcome::ok("")).await;
        store.update("c2", Outcome::error("c2 error: boom")).await;
        let agg = Aggregator::new(store, Arc::new(QueryCache::new()), Duration::from_secs(30));

        let (status, message) = agg.snapshot(None, &[]).await;
        assert_eq!(status, Status::Error);
        assert_eq!(message, "c2 error: boom");
    }

    #[tokio::test]
    async fn snapshot_respects_exclude() {
        let store = Arc::new(ResultStore::new(vec!["c1".to_string(), "c2".to_string()]));
        store.update("c1", Outcome::ok("")).await;
        store.update("c2", Outcome::error("c2 error: boom")).await;
        let agg = Aggregator::new(store, Arc::new(QueryCache::new()), Duration::from_secs(30));

        let (status, message) = agg.snapshot(None, &["c2".to_string()]).await;
        assert_eq!(status, Status::Ok);
        assert_eq!(message, "true");
    }

    #[tokio::test]
    async fn snapshot_status_message_true_surfaces_message() {
        let store = Arc::new(ResultStore::new(vec!["c1".to_string(), "c2".to_string()]));
        store.update("c1", Outcome::ok("gw=10.0.0.1")).await;
        store.update("c2", Outcome::ok("")).await;
        let agg = Aggregator::new(store, Arc::new(QueryCache::new()), Duration::from_secs(30));

        let (status, message) = agg.snapshot(None, &[]).await;
        assert_eq!(status, Status::Ok);
        assert_eq!(message, "gw=10.0.0.1");
    }

    #[tokio::test]
    async fn run_query_caches_result_across_calls() {
        let store = Arc::new(ResultStore::new(vec![]));
        let agg = Aggregator::new(store, Arc::new(QueryCache::new()), Duration::from_secs(30));
        let args = QueryArgs::default();

        let first = agg.run_query("", &args, Duration::from_secs(1), true).await;
        let second = agg.run_query("", &args, Duration::from_secs(1), true).await;
        assert_eq!(first, second);
    }
}
