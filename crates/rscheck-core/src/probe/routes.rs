use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use netlink_packet_route::route::RouteAttribute;
use rtnetlink::IpVersion;
use tokio::time::timeout;

use crate::error::ProbeError;

use super::{Probe, ProbeSuccess};

/// At least one IPv4 or IPv6 default route must exist in the kernel
/// routing table, per spec.md §4.3's DefaultRoutes row. Success message is
/// the comma-joined gateway IPs.
pub struct DefaultRoutesProbe;

impl DefaultRoutesProbe {
    pub fn new() -> Self {
        DefaultRoutesProbe
    }
}

impl Default for DefaultRoutesProbe {
    fn default() -> Self {
        Self::new()
    }
}

async fn default_gateways(version: IpVersion) -> Result<Vec<IpAddr>, ProbeError> {
    let (connection, handle, _) =
        rtnetlink::new_connection().map_err(|e| ProbeError::Netlink(e.to_string()))?;
    tokio::spawn(connection);

    let mut routes = handle.route().get(version).execute();
    let mut gateways = Vec::new();

    while let Some(route) = routes
        .try_next()
        .await
        .map_err(|e| ProbeError::Netlink(e.to_string()))?
    {
        if route.header.destination_prefix_length != 0 {
            continue;
        }
        for attr in &route.attributes {
            if let RouteAttribute::Gateway(addr) = attr {
                gateways.push(*addr);
            }
        }
    }

    Ok(gateways)
}

#[async_trait]
impl Probe for DefaultRoutesProbe {
    async fn execute(&self, timeout_dur: Duration) -> Result<ProbeSuccess, ProbeError> {
        timeout(timeout_dur, async {
            let mut gateways = default_gateways(IpVersion::V4).await?;
            gateways.extend(default_gateways(IpVersion::V6).await?);

            if gateways.is_empty() {
                return Err(ProbeError::Netlink("no default route".into()));
            }

            let rendered = gateways
                .iter()
                .map(|ip| ip.to_string())
                .collect::<Vec<_>>()
                .join(",");
            Ok(ProbeSuccess::with_message(rendered))
        })
        .await
        .map_err(|_| ProbeError::Timeout)?
    }
}
