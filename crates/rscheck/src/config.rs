//! YAML configuration loading — spec.md §6's "Configuration file" and
//! SPEC_FULL.md §4.7. Reads the single CLI positional path, parses it into
//! the typed shapes the rest of the binary consumes.

use std::path::Path;
use std::time::Duration;

use indexmap::IndexMap;
use rscheck_core::CheckSpec;
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    logging: RawLogging,
    #[serde(default)]
    http: RawHttp,
    /// `name` comes from the map key, not the check's own YAML body —
    /// `CheckSpec`'s `#[serde(skip)]` name field deserializes as empty
    /// and is filled in below.
    #[serde(default)]
    threads: IndexMap<String, CheckSpec>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum RawLogFormat {
    Text,
    Json,
}

impl Default for RawLogFormat {
    fn default() -> Self {
        RawLogFormat::Text
    }
}

#[derive(Debug, Deserialize, Default)]
struct RawLogging {
    #[serde(default)]
    format: RawLogFormat,
    #[serde(default = "default_log_level")]
    level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Deserialize)]
struct RawHttp {
    #[serde(default = "default_address")]
    address: String,
    #[serde(default = "default_port")]
    port: u16,
    #[serde(default = "default_location")]
    location: String,
    #[serde(default)]
    keep_alive: bool,
    #[serde(default = "default_true")]
    error_message: bool,
    #[serde(default = "default_query_timeout_secs")]
    query_timeout: f64,
    #[serde(default = "default_query_cache_ttl_secs")]
    query_cache_ttl: f64,
    #[serde(default = "default_wait_status_interval_secs")]
    wait_status_interval: f64,
    #[serde(default)]
    wait_status_timeout: f64,
}

fn default_address() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_location() -> String {
    "/getstatus".to_string()
}
fn default_query_timeout_secs() -> f64 {
    1.0
}
fn default_query_cache_ttl_secs() -> f64 {
    30.0
}
fn default_wait_status_interval_secs() -> f64 {
    1.0
}

impl Default for RawHttp {
    fn default() -> Self {
        RawHttp {
            address: default_address(),
            port: default_port(),
            location: default_location(),
            keep_alive: false,
            error_message: true,
            query_timeout: default_query_timeout_secs(),
            query_cache_ttl: default_query_cache_ttl_secs(),
            wait_status_interval: default_wait_status_interval_secs(),
            wait_status_timeout: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    pub level: String,
}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub address: String,
    pub port: u16,
    pub location: String,
    pub keep_alive: bool,
    pub error_message: bool,
    pub query_timeout: Duration,
    pub query_cache_ttl: Duration,
    pub wait_status_interval: Duration,
    pub wait_status_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub checks: Vec<CheckSpec>,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

pub fn load(path: &Path) -> Result<Config, ConfigError> {
    let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let raw: RawConfig = serde_yaml::from_slice(&bytes).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    let checks = raw
        .threads
        .into_iter()
        .map(|(name, mut spec)| {
            spec.name = name;
            spec.validate()?;
            Ok(spec)
        })
        .collect::<Result<Vec<_>, rscheck_core::ConfigError>>()?;

    let http = HttpConfig {
        address: raw.http.address,
        port: raw.http.port,
        location: raw.http.location,
        keep_alive: raw.http.keep_alive,
        error_message: raw.http.error_message,
        query_timeout: Duration::from_secs_f64(raw.http.query_timeout),
        query_cache_ttl: Duration::from_secs_f64(raw.http.query_cache_ttl),
        wait_status_interval: Duration::from_secs_f64(raw.http.wait_status_interval),
        wait_status_timeout: Duration::from_secs_f64(raw.http.wait_status_timeout),
    };

    let logging = LoggingConfig {
        format: match raw.logging.format {
            RawLogFormat::Text => LogFormat::Text,
            RawLogFormat::Json => LogFormat::Json,
        },
        level: raw.logging.level,
    };

    Ok(Config { checks, http, logging })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_minimal_config_with_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"
threads:
  c1:
    class: tcp
    host: 127.0.0.1
    port: 22
"#
        )
        .unwrap();

        let config = load(f.path()).unwrap();
        assert_eq!(config.checks.len(), 1);
        assert_eq!(config.checks[0].name, "c1");
        assert_eq!(config.http.port, 8080);
        assert_eq!(config.http.location, "/getstatus");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn rejects_unknown_class() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"
threads:
  c1:
    class: not_a_real_class
"#
        )
        .unwrap();

        assert!(load(f.path()).is_err());
    }

    #[test]
    fn rejects_non_positive_interval() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"
threads:
  c1:
    class: tcp
    host: 127.0.0.1
    port: 22
    interval: 0
"#
        )
        .unwrap();

        assert!(load(f.path()).is_err());
    }

    #[test]
    fn honors_explicit_http_and_logging_overrides() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            f,
            r#"
logging:
  format: json
  level: debug
http:
  address: 127.0.0.1
  port: 9000
  location: /health
  keep_alive: true
threads: {{}}
"#
        )
        .unwrap();

        let config = load(f.path()).unwrap();
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.http.address, "127.0.0.1");
        assert_eq!(config.http.port, 9000);
        assert_eq!(config.http.location, "/health");
        assert!(config.http.keep_alive);
    }
}
