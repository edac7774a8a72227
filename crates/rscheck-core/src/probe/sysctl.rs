use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;

use crate::error::ProbeError;

use super::{Probe, ProbeSuccess};

/// One `(variable, expected)` pair for the Sysctl probe.
#[derive(Debug, Clone)]
pub struct SysctlCheck {
    pub variable: String,
    pub expected: String,
}

/// Reads `/proc/sys/<variable-with-dots-to-slashes>` for each configured
/// variable and string-compares against its expected value, per spec.md
/// §4.3's Sysctl row. A missing file reads as the empty string (see
/// DESIGN.md's Open Question resolution) — never emits a success message.
pub struct SysctlProbe {
    checks: Vec<SysctlCheck>,
}

impl SysctlProbe {
    pub fn new(checks: Vec<SysctlCheck>) -> Self {
        SysctlProbe { checks }
    }
}

/// `net.ipv4.conf.eth0.rp_filter` -> `/proc/sys/net/ipv4/conf/eth0/rp_filter`
pub fn sysctl_path(variable: &str) -> String {
    format!("/proc/sys/{}", variable.replace('.', "/"))
}

pub async fn read_sysctl(variable: &str) -> String {
    tokio::fs::read_to_string(sysctl_path(variable))
        .await
        .map(|s| s.trim_end().to_string())
        .unwrap_or_default()
}

#[async_trait]
impl Probe for SysctlProbe {
    async fn execute(&self, timeout_dur: Duration) -> Result<ProbeSuccess, ProbeError> {
        timeout(timeout_dur, async {
            for check in &self.checks {
                let actual = read_sysctl(&check.variable).await;
                if actual != check.expected {
                    return Err(ProbeError::SysctlMismatch {
                        variable: check.variable.clone(),
                        actual,
                        expected: check.expected.clone(),
                    });
                }
            }
            Ok(ProbeSuccess::empty())
        })
        .await
        .map_err(|_| ProbeError::Timeout)?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_translates_dots_to_slashes() {
        assert_eq!(
            sysctl_path("net.ipv4.conf.eth0.rp_filter"),
            "/proc/sys/net/ipv4/conf/eth0/rp_filter"
        );
    }
}
