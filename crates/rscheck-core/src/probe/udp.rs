use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tokio::net::UdpSocket;
use tokio::time::timeout;

use crate::error::ProbeError;

use super::{Probe, ProbeSuccess};

/// Sends a fixed request datagram and matches the (trimmed) response
/// against an anchored-at-start regex, per spec.md §4.3's UDPRequest row.
pub struct UdpRequestProbe {
    host: String,
    port: u16,
    request: Vec<u8>,
    max_response_size: usize,
    response: Regex,
}

impl UdpRequestProbe {
    pub fn new(
        host: String,
        port: u16,
        request: Vec<u8>,
        max_response_size: usize,
        response_pattern: &str,
    ) -> Result<Self, String> {
        let response = Regex::new(response_pattern)
            .map_err(|e| format!("invalid response pattern {response_pattern:?}: {e}"))?;
        Ok(UdpRequestProbe {
            host,
            port,
            request,
            max_response_size,
            response,
        })
    }
}

#[async_trait]
impl Probe for UdpRequestProbe {
    async fn execute(&self, timeout_dur: Duration) -> Result<ProbeSuccess, ProbeError> {
        let addr = format!("{}:{}", self.host, self.port);

        let received = timeout(timeout_dur, async {
            let socket = UdpSocket::bind("0.0.0.0:0").await?;
            socket.connect(&addr).await?;
            socket.send(&self.request).await?;

            let mut buf = vec![0u8; self.max_response_size];
            let n = socket.recv(&mut buf).await?;
            buf.truncate(n);
            Ok::<_, std::io::Error>(buf)
        })
        .await
        .map_err(|_| ProbeError::Timeout)??;

        let text = String::from_utf8_lossy(&received);
        let trimmed = text.trim_end();

        match self.response.find(trimmed) {
            Some(m) if m.start() == 0 => Ok(ProbeSuccess::with_message(trimmed.to_string())),
            _ => Err(ProbeError::Mismatch {
                pattern: self.response.as_str().to_string(),
                actual: trimmed.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchored_match_requires_start_of_string() {
        let re = Regex::new("^true").unwrap();
        assert_eq!(re.find("trueXYZ").unwrap().start(), 0);
        assert!(re.find("false true").map(|m| m.start() == 0).unwrap_or(false) == false);
    }
}
