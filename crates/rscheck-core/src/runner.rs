use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tracing::{error, warn};

use crate::outcome::Outcome;
use crate::probe::Probe;
use crate::result_store::ResultStore;

/// Supervises one [`Probe`] on a fixed interval, writing outcomes to the
/// shared [`ResultStore`] and isolating that probe's failures from every
/// other check, per spec.md §4.4.
pub struct CheckRunner {
    name: String,
    probe: Box<dyn Probe>,
    interval: Duration,
    timeout: Duration,
    error_message: bool,
    status_message: bool,
    store: Arc<ResultStore>,
}

impl CheckRunner {
    pub fn new(
        name: String,
        probe: Box<dyn Probe>,
        interval: Duration,
        timeout: Duration,
        error_message: bool,
        status_message: bool,
        store: Arc<ResultStore>,
    ) -> Self {
        CheckRunner {
            name,
            probe,
            interval,
            timeout,
            error_message,
            status_message,
            store,
        }
    }

    /// Runs forever: probe, record, sleep. Cadence is measured
    /// sleep-between-cycles, not fixed-rate — spec.md §4.4.
    pub async fn run(self) {
        loop {
            let outcome = self.run_one_cycle().await;
            self.store.update(&self.name, outcome).await;
            tokio::time::sleep(self.interval).await;
        }
    }

    async fn run_one_cycle(&self) -> Outcome {
        let result = AssertUnwindSafe(self.probe.execute(self.timeout))
            .catch_unwind()
            .await;

        match result {
            Ok(Ok(success)) => {
                let message = if self.status_message {
                    success.message
                } else {
                    String::new()
                };
                Outcome::ok(message)
            }
            Ok(Err(cause)) => {
                warn!(check = %self.name, error = %cause, "probe failed");
                let message = if self.error_message {
                    format!("{} error: {}", self.name, cause)
                } else {
                    String::new()
                };
                Outcome::error(message)
            }
            Err(panic) => {
                let cause = panic_message(&panic);
                error!(check = %self.name, %cause, "probe panicked");
                let message = if self.error_message {
                    format!("{} error: {}", self.name, cause)
                } else {
                    String::new()
                };
                Outcome::error(message)
            }
        }
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
