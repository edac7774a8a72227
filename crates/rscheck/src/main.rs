//! `rscheck` — local health-probing daemon binary. Owns the CLI,
//! configuration loading, tracing initialization, the HTTP listener, and
//! top-level supervision; `rscheck_core` owns the check-execution engine
//! itself. SPEC_FULL.md §4.10.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use futures::stream::FuturesUnordered;
use futures::StreamExt;
use rscheck::{config, http, logging, watchdog};
use rscheck_core::{Aggregator, CheckRunner, ProbeResources, QueryCache, ResultStore};
use tracing::{error, info};

/// Local health-probing daemon for load-balanced service instances.
#[derive(Parser)]
#[command(name = "rscheck", version, about)]
struct Args {
    /// Path to the YAML configuration file.
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = config::load(&args.config)?;
    logging::init(&config.logging);

    let names = config.checks.iter().map(|c| c.name.clone());
    let result_store = Arc::new(ResultStore::new(names));
    let query_cache = Arc::new(QueryCache::new());

    let resources = ProbeResources {
        query_cache: query_cache.clone(),
        query_cache_ttl: config.http.query_cache_ttl,
    };

    let mut runner_handles = Vec::with_capacity(config.checks.len());
    for spec in config.checks {
        let probe = spec.kind.build(&resources)?;
        let runner = CheckRunner::new(
            spec.name.clone(),
            probe,
            spec.interval(),
            spec.timeout(),
            spec.error_message,
            spec.status_message,
            result_store.clone(),
        );
        info!(check = %spec.name, class = %spec.kind.class_name(), "starting check runner");
        runner_handles.push(tokio::spawn(runner.run()));
    }

    let aggregator = Aggregator::new(result_store, query_cache, config.http.query_cache_ttl);

    wait_for_first_healthy(&aggregator, config.http.wait_status_interval, config.http.wait_status_timeout).await;

    let addr = format!("{}:{}", config.http.address, config.http.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, location = %config.http.location, "listening");

    let app_state = Arc::new(http::AppState {
        aggregator,
        http: config.http.clone(),
    });
    let router = http::router(app_state);

    watchdog::notify_ready();

    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;

    tokio::select! {
        result = axum::serve(listener, router) => {
            result?;
        }
        _ = watchdog::run() => {}
        _ = tokio::signal::ctrl_c() => {
            info!("received ctrl-c, shutting down");
        }
        _ = sigterm.recv() => {
            info!("received SIGTERM, shutting down");
        }
        _ = supervise(runner_handles) => {
            error!("a supervised check task died unexpectedly, exiting");
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Polls `AllHealthy("", ∅)` until the first `true` or `wait_status_timeout`
/// elapses, whichever comes first — spec.md §4.5's startup-delay rule.
/// `wait_status_timeout = 0` skips the gate entirely.
async fn wait_for_first_healthy(
    aggregator: &Aggregator,
    wait_status_interval: std::time::Duration,
    wait_status_timeout: std::time::Duration,
) {
    if wait_status_timeout.is_zero() {
        return;
    }

    let deadline = tokio::time::Instant::now() + wait_status_timeout;
    loop {
        if aggregator.all_healthy(None, &[]).await {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            return;
        }
        tokio::time::sleep(wait_status_interval).await;
    }
}

/// Waits for any supervised `CheckRunner` task to end. Each runner's own
/// loop never returns and catches probe panics internally, so this only
/// fires on a runtime-level abort — spec.md §7 item 5.
async fn supervise(handles: Vec<tokio::task::JoinHandle<()>>) {
    let mut unordered: FuturesUnordered<_> = handles.into_iter().collect();
    unordered.next().await;
}
