use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use futures::TryStreamExt;
use netlink_packet_route::address::AddressAttribute;
use tokio::time::timeout;

use crate::error::ProbeError;

use super::{Probe, ProbeSuccess};

/// For each configured interface name: must exist, be UP and RUNNING, and
/// have at least one address assigned, per spec.md §4.3's Interfaces row.
/// Never emits a success message.
pub struct InterfacesProbe {
    interfaces: Vec<String>,
}

impl InterfacesProbe {
    pub fn new(interfaces: Vec<String>) -> Self {
        InterfacesProbe { interfaces }
    }
}

/// Checks a single interface, returning `Ok(())` or a descriptive cause —
/// shared with the Aggregator's `virtual_if` query evaluation.
pub async fn check_interface(name: &str) -> Result<(), ProbeError> {
    let (connection, handle, _) =
        rtnetlink::new_connection().map_err(|e| ProbeError::Netlink(e.to_string()))?;
    tokio::spawn(connection);

    let link = handle
        .link()
        .get()
        .match_name(name.to_string())
        .execute()
        .try_next()
        .await
        .map_err(|e| ProbeError::Netlink(e.to_string()))?
        .ok_or_else(|| ProbeError::Interface {
            iface: name.to_string(),
            cause: "interface does not exist".into(),
        })?;

    let flags = link.header.flags;
    if flags & libc::IFF_UP as u32 == 0 {
        return Err(ProbeError::Interface {
            iface: name.to_string(),
            cause: "not UP".into(),
        });
    }
    if flags & libc::IFF_RUNNING as u32 == 0 {
        return Err(ProbeError::Interface {
            iface: name.to_string(),
            cause: "not RUNNING".into(),
        });
    }

    let index = link.header.index;
    let mut addresses = handle.address().get().set_link_index_filter(index).execute();
    let has_address = addresses
        .try_next()
        .await
        .map_err(|e| ProbeError::Netlink(e.to_string()))?
        .is_some();

    if !has_address {
        return Err(ProbeError::Interface {
            iface: name.to_string(),
            cause: "no address assigned".into(),
        });
    }

    Ok(())
}

/// Looks up `name`'s link index, then checks whether `ip` is among its
/// assigned addresses — shared with the Aggregator's `virtual_if`/
/// `virtual_ip` query evaluation.
pub async fn interface_has_ip(name: &str, ip: IpAddr) -> Result<bool, ProbeError> {
    let (connection, handle, _) =
        rtnetlink::new_connection().map_err(|e| ProbeError::Netlink(e.to_string()))?;
    tokio::spawn(connection);

    let link = handle
        .link()
        .get()
        .match_name(name.to_string())
        .execute()
        .try_next()
        .await
        .map_err(|e| ProbeError::Netlink(e.to_string()))?
        .ok_or_else(|| ProbeError::Interface {
            iface: name.to_string(),
            cause: "interface does not exist".into(),
        })?;

    let mut addresses = handle
        .address()
        .get()
        .set_link_index_filter(link.header.index)
        .execute();

    while let Some(msg) = addresses
        .try_next()
        .await
        .map_err(|e| ProbeError::Netlink(e.to_string()))?
    {
        for attr in &msg.attributes {
            if let AddressAttribute::Address(addr) = attr {
                if *addr == ip {
                    return Ok(true);
                }
            }
        }
    }

    Ok(false)
}

#[async_trait]
impl Probe for InterfacesProbe {
    async fn execute(&self, timeout_dur: Duration) -> Result<ProbeSuccess, ProbeError> {
        timeout(timeout_dur, async {
            for iface in &self.interfaces {
                check_interface(iface).await?;
            }
            Ok(ProbeSuccess::empty())
        })
        .await
        .map_err(|_| ProbeError::Timeout)?
    }
}
