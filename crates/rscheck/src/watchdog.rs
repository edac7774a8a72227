//! `sd_notify` readiness and watchdog pings — SPEC_FULL.md §4.10,
//! spec.md §6's "Process integration". Adapted from a synchronous
//! `UnixDatagram` + poll-loop reference into a `tokio::time::interval`
//! background task.

use std::os::unix::net::UnixDatagram;
use std::time::Duration;

const DEFAULT_WATCHDOG_USEC: u64 = 3_000_000;

fn sd_notify(msg: &str) {
    let Ok(path) = std::env::var("NOTIFY_SOCKET") else {
        return;
    };
    let path = if let Some(abstract_name) = path.strip_prefix('@') {
        format!("\0{abstract_name}")
    } else {
        path
    };

    if let Ok(sock) = UnixDatagram::unbound() {
        let _ = sock.send_to(msg.as_bytes(), &path);
    }
}

/// One-time readiness notification, sent once the HTTP listener is bound.
pub fn notify_ready() {
    sd_notify("READY=1");
}

fn watchdog_interval() -> Duration {
    let usec = std::env::var("WATCHDOG_USEC")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .unwrap_or(DEFAULT_WATCHDOG_USEC);
    Duration::from_micros(usec / 2)
}

/// Pings the watchdog at half the configured interval, forever. Intended
/// to be `tokio::select!`ed against process-level task-death supervision
/// so it stops the moment any supervised task ends — spec.md §6: "while
/// all supervised tasks are alive".
pub async fn run() {
    let mut ticker = tokio::time::interval(watchdog_interval());
    loop {
        ticker.tick().await;
        sd_notify("WATCHDOG=1");
    }
}
