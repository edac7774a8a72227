use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;

use crate::error::ProbeError;

use super::{Probe, ProbeSuccess};

/// HTTP GET against an arbitrary URL, matching the (trimmed) body against
/// an anchored-at-start regex, per spec.md §4.3's URL row.
pub struct UrlProbe {
    client: reqwest::Client,
    url: String,
    response: Regex,
}

impl UrlProbe {
    pub fn new(url: String, response_pattern: &str) -> Result<Self, String> {
        let response = Regex::new(response_pattern)
            .map_err(|e| format!("invalid response pattern {response_pattern:?}: {e}"))?;
        Ok(UrlProbe {
            client: reqwest::Client::new(),
            url,
            response,
        })
    }
}

#[async_trait]
impl Probe for UrlProbe {
    async fn execute(&self, timeout_dur: Duration) -> Result<ProbeSuccess, ProbeError> {
        let response = self
            .client
            .get(&self.url)
            .timeout(timeout_dur)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProbeError::Timeout
                } else {
                    ProbeError::Http(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(ProbeError::Http(format!(
                "non-2xx status: {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ProbeError::Http(e.to_string()))?;
        let trimmed = body.trim_end();

        match self.response.find(trimmed) {
            Some(m) if m.start() == 0 => Ok(ProbeSuccess::with_message(trimmed.to_string())),
            _ => Err(ProbeError::Mismatch {
                pattern: self.response.as_str().to_string(),
                actual: trimmed.to_string(),
            }),
        }
    }
}
