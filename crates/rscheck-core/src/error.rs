use std::net::AddrParseError;

/// Failure cause for a single probe invocation.
///
/// Never propagates past the [`crate::runner::CheckRunner`] boundary — it is
/// always translated into that check's [`crate::outcome::Outcome`].
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("timed out")]
    Timeout,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("dns error: {0}")]
    Dns(String),

    #[error("netlink error: {0}")]
    Netlink(String),

    #[error("invalid address: {0}")]
    Addr(#[from] AddrParseError),

    #[error("tls error: {0}")]
    Tls(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("response mismatch: expected prefix matching {pattern:?}, got {actual:?}")]
    Mismatch { pattern: String, actual: String },

    #[error("interface {iface}: {cause}")]
    Interface { iface: String, cause: String },

    #[error("sysctl {variable}: read {actual:?}, expected {expected:?}")]
    SysctlMismatch {
        variable: String,
        actual: String,
        expected: String,
    },

    #[error("status file: {0}")]
    StatusFile(String),

    #[error("{0}")]
    Other(String),
}

/// Startup-fatal configuration problems.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("unknown check class {0:?}")]
    UnknownClass(String),

    #[error("duplicate check name {0:?}")]
    DuplicateName(String),

    #[error("check {name:?}: {cause}")]
    InvalidCheck { name: String, cause: String },

    #[error("invalid duration: {0}")]
    InvalidDuration(String),
}

/// Malformed or semantically invalid on-demand query.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("malformed query string")]
    Malformed,

    #[error("invalid check: {0}")]
    InvalidArg(String),

    #[error("virtual_if and virtual_ip must both be present")]
    IncompleteVirtualArgs,
}
