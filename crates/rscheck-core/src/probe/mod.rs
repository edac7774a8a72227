//! Probe variants: DNS, interfaces, default routes, TCP, UDP request,
//! URL, sysctl, status file, and the cache-maintenance sweeper.
//!
//! Each variant implements [`Probe`]. Probes hold only immutable
//! configuration and (for Maintenance) a handle to shared state — never a
//! socket, file handle, or cached response across invocations, per
//! spec.md §4.3.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::error::{ConfigError, ProbeError};
use crate::query_cache::QueryCache;

pub mod dns;
pub mod interfaces;
pub mod maintenance;
pub mod routes;
pub mod status_file;
pub mod sysctl;
pub mod tcp;
pub mod udp;
pub mod url;

pub use sysctl::SysctlCheck;

/// A single health check: `Probe(timeout) -> (message, error)`.
#[async_trait]
pub trait Probe: Send + Sync {
    async fn execute(&self, timeout: Duration) -> Result<ProbeSuccess, ProbeError>;
}

/// Successful probe outcome. `message` is empty for variants that never
/// emit one, or when the check's `status_message` flag is off — that
/// filtering happens in [`crate::runner::CheckRunner`], not here.
pub struct ProbeSuccess {
    pub message: String,
}

impl ProbeSuccess {
    pub fn empty() -> Self {
        ProbeSuccess {
            message: String::new(),
        }
    }

    pub fn with_message(message: impl Into<String>) -> Self {
        ProbeSuccess {
            message: message.into(),
        }
    }
}

/// Tagged union of probe configurations, dispatched by YAML's `class`
/// field — the "registry mapping class name -> constructor" from spec.md
/// §9. Unknown classes fail to deserialize and are a startup error.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum ProbeKind {
    Dns {
        host: String,
        #[serde(default = "default_dns_port")]
        port: u16,
        #[serde(default)]
        tcp: bool,
        qname: String,
        qtype: String,
    },
    DefaultRoutes {},
    Interfaces {
        interfaces: Vec<String>,
    },
    Tcp {
        host: String,
        port: u16,
        #[serde(default)]
        use_ssl: bool,
    },
    UdpRequest {
        host: String,
        port: u16,
        request: String,
        #[serde(default = "default_max_response_size")]
        max_response_size: usize,
        response: String,
    },
    Url {
        url: String,
        response: String,
    },
    Sysctl {
        checks: Vec<RawSysctlCheck>,
    },
    StatusFile {
        status_file: String,
        #[serde(default)]
        status_file_ttl: u64,
        #[serde(default)]
        error_string: String,
        #[serde(default)]
        success_string: String,
    },
    Maintenance {},
}

fn default_dns_port() -> u16 {
    53
}

fn default_max_response_size() -> usize {
    4096
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawSysctlCheck {
    pub variable: String,
    pub expected: String,
}

/// Shared resources a probe may need beyond its own configuration.
/// Only [`ProbeKind::Maintenance`] uses this today.
pub struct ProbeResources {
    pub query_cache: Arc<QueryCache>,
    pub query_cache_ttl: Duration,
}

impl ProbeKind {
    /// Builds the concrete [`Probe`] this configuration describes.
    pub fn build(&self, resources: &ProbeResources) -> Result<Box<dyn Probe>, ConfigError> {
        let invalid = |cause: String| ConfigError::InvalidCheck {
            name: self.class_name().to_string(),
            cause,
        };

        match self {
            ProbeKind::Dns {
                host,
                port,
                tcp,
                qname,
                qtype,
            } => Ok(Box::new(
                dns::DnsProbe::new(host.clone(), *port, *tcp, qname, qtype).map_err(invalid)?,
            )),
            ProbeKind::DefaultRoutes {} => Ok(Box::new(routes::DefaultRoutesProbe::new())),
            ProbeKind::Interfaces { interfaces } => {
                Ok(Box::new(interfaces::InterfacesProbe::new(interfaces.clone())))
            }
            ProbeKind::Tcp { host, port, use_ssl } => {
                Ok(Box::new(tcp::TcpProbe::new(host.clone(), *port, *use_ssl)))
            }
            ProbeKind::UdpRequest {
                host,
                port,
                request,
                max_response_size,
                response,
            } => Ok(Box::new(
                udp::UdpRequestProbe::new(
                    host.clone(),
                    *port,
                    request.clone().into_bytes(),
                    *max_response_size,
                    response,
                )
                .map_err(invalid)?,
            )),
            ProbeKind::Url { url, response } => {
                Ok(Box::new(url::UrlProbe::new(url.clone(), response).map_err(invalid)?))
            }
            ProbeKind::Sysctl { checks } => Ok(Box::new(sysctl::SysctlProbe::new(
                checks
                    .iter()
                    .map(|c| SysctlCheck {
                        variable: c.variable.clone(),
                        expected: c.expected.clone(),
                    })
                    .collect(),
            ))),
            ProbeKind::StatusFile {
                status_file,
                status_file_ttl,
                error_string,
                success_string,
            } => Ok(Box::new(status_file::StatusFileProbe::new(
                status_file.clone(),
                *status_file_ttl,
                error_string.clone(),
                success_string.clone(),
            ))),
            ProbeKind::Maintenance {} => Ok(Box::new(maintenance::MaintenanceProbe::new(
                resources.query_cache.clone(),
                resources.query_cache_ttl,
            ))),
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            ProbeKind::Dns { .. } => "dns",
            ProbeKind::DefaultRoutes {} => "default_routes",
            ProbeKind::Interfaces { .. } => "interfaces",
            ProbeKind::Tcp { .. } => "tcp",
            ProbeKind::UdpRequest { .. } => "udp_request",
            ProbeKind::Url { .. } => "url",
            ProbeKind::Sysctl { .. } => "sysctl",
            ProbeKind::StatusFile { .. } => "status_file",
            ProbeKind::Maintenance {} => "maintenance",
        }
    }
}
