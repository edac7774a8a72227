//! Library half of the `rscheck` binary crate: configuration loading,
//! HTTP transport, logging, and process glue, split out from `main.rs` so
//! the HTTP router can be driven directly from integration tests.

pub mod config;
pub mod error;
pub mod http;
pub mod logging;
pub mod watchdog;
