use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};
use tokio_rustls::TlsConnector;

use crate::error::ProbeError;

use super::{Probe, ProbeSuccess};

/// TCP connect (optionally followed by a TLS handshake), per spec.md
/// §4.3's TCP row. Never emits a success message.
pub struct TcpProbe {
    host: String,
    port: u16,
    use_ssl: bool,
    tls_config: Arc<ClientConfig>,
}

impl TcpProbe {
    pub fn new(host: String, port: u16, use_ssl: bool) -> Self {
        TcpProbe {
            host,
            port,
            use_ssl,
            tls_config: tls_client_config(),
        }
    }
}

fn tls_client_config() -> Arc<ClientConfig> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    Arc::new(
        ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth(),
    )
}

#[async_trait]
impl Probe for TcpProbe {
    async fn execute(&self, timeout_dur: Duration) -> Result<ProbeSuccess, ProbeError> {
        let addr = format!("{}:{}", self.host, self.port);

        timeout(timeout_dur, self.connect_and_handshake(&addr))
            .await
            .map_err(|_| ProbeError::Timeout)??;

        Ok(ProbeSuccess::empty())
    }
}

impl TcpProbe {
    async fn connect_and_handshake(&self, addr: &str) -> Result<(), ProbeError> {
        let stream = TcpStream::connect(addr).await?;

        if self.use_ssl {
            let connector = TlsConnector::from(self.tls_config.clone());
            let server_name = ServerName::try_from(self.host.clone())
                .map_err(|e| ProbeError::Tls(e.to_string()))?;

            connector
                .connect(server_name, stream)
                .await
                .map_err(|e| ProbeError::Tls(e.to_string()))?;
        }

        Ok(())
    }
}
