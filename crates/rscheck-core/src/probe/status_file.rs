use std::time::{Duration, SystemTime};

use async_trait::async_trait;
use tokio::time::timeout;

use crate::error::ProbeError;

use super::{Probe, ProbeSuccess};

/// Reads an externally-maintained status file, per spec.md §4.3's
/// StatusFile row. Never emits a success message.
pub struct StatusFileProbe {
    path: String,
    ttl: Option<Duration>,
    error_string: String,
    success_string: String,
}

impl StatusFileProbe {
    pub fn new(path: String, ttl_secs: u64, error_string: String, success_string: String) -> Self {
        StatusFileProbe {
            path,
            ttl: if ttl_secs > 0 {
                Some(Duration::from_secs(ttl_secs))
            } else {
                None
            },
            error_string,
            success_string,
        }
    }
}

#[async_trait]
impl Probe for StatusFileProbe {
    async fn execute(&self, timeout_dur: Duration) -> Result<ProbeSuccess, ProbeError> {
        timeout(timeout_dur, async {
            let metadata = tokio::fs::metadata(&self.path)
                .await
                .map_err(|e| ProbeError::StatusFile(format!("stat {}: {e}", self.path)))?;

            if let Some(ttl) = self.ttl {
                let modified = metadata
                    .modified()
                    .map_err(|e| ProbeError::StatusFile(format!("mtime {}: {e}", self.path)))?;
                let age = SystemTime::now()
                    .duration_since(modified)
                    .unwrap_or(Duration::ZERO);
                if age > ttl {
                    return Err(ProbeError::StatusFile(format!(
                        "{} is stale ({:?} old, ttl {:?})",
                        self.path, age, ttl
                    )));
                }
            }

            let contents = tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|e| ProbeError::StatusFile(format!("read {}: {e}", self.path)))?;

            let lines: Vec<&str> = contents.lines().collect();

            if !self.error_string.is_empty() {
                if let Some(line) = lines.iter().find(|line| line.contains(&self.error_string)) {
                    return Err(ProbeError::StatusFile(format!(
                        "error string {:?} found: {line}",
                        self.error_string
                    )));
                }
            }

            if !self.success_string.is_empty()
                && !lines.iter().any(|line| line.contains(&self.success_string))
            {
                return Err(ProbeError::StatusFile(format!(
                    "required success string {:?} not found",
                    self.success_string
                )));
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
    use std::io::Write;

    #[tokio::test]
    async fn passes_when_clean() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "all good").unwrap();
        let probe = StatusFileProbe::new(
            f.path().to_string_lossy().to_string(),
            0,
            String::new(),
            String::new(),
        );
        assert!(probe.execute(Duration::from_secs(1)).await.is_ok());
    }

    #[tokio::test]
    async fn fails_when_error_string_present() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "status: ERROR disk full").unwrap();
        let probe = StatusFileProbe::new(
            f.path().to_string_lossy().to_string(),
            0,
            "ERROR".to_string(),
            String::new(),
        );
        assert!(probe.execute(Duration::from_secs(1)).await.is_err());
    }

    #[tokio::test]
    async fn fails_when_success_string_missing() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "nothing relevant here").unwrap();
        let probe = StatusFileProbe::new(
            f.path().to_string_lossy().to_string(),
            0,
            String::new(),
            "READY".to_string(),
        );
        assert!(probe.execute(Duration::from_secs(1)).await.is_err());
    }

    #[tokio::test]
    async fn fails_on_missing_file() {
        let probe = StatusFileProbe::new(
            "/nonexistent/rscheck-status".to_string(),
            0,
            String::new(),
            String::new(),
        );
        assert!(probe.execute(Duration::from_secs(1)).await.is_err());
    }
}
