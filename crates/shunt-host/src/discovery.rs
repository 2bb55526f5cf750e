use std::net::IpAddr;
use std::net::Ipv4Addr;

use shunt_stack::MacAddr;
use thiserror::Error;
use tracing::debug;

/// IPv4 addressing of one host interface, as reported by the OS.
///
/// Loopback addresses are reported as-is; rejecting them is the caller's
/// decision, not this module's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInterface {
    pub name: String,
    pub ipv4: Ipv4Addr,
    pub netmask: Ipv4Addr,
    /// Best-effort; `None` when the OS reports no hardware address.
    pub mac: Option<MacAddr>,
}

impl HostInterface {
    pub fn is_loopback(&self) -> bool {
        self.ipv4.is_loopback()
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscoveryError {
    #[error("no IPv4-configured interface named {0:?}")]
    InterfaceNotFound(String),

    #[error("interface enumeration failed: {0}")]
    QueryFailed(String),
}

/// Flattened view of one enumerated interface, decoupled from the
/// enumeration backend so selection logic stays testable.
#[derive(Debug, Clone)]
struct Candidate {
    name: String,
    ipv4: Option<(Ipv4Addr, Ipv4Addr)>,
    mac: Option<MacAddr>,
    up: bool,
    loopback: bool,
}

/// Query the OS for an interface's IPv4 address, netmask, and MAC address.
///
/// With a name, the interface must carry an IPv4 address to match (entries
/// without one are skipped, mirroring the AF_INET-only enumeration the
/// selection is modeled on). With `None`, probes for the first up,
/// non-loopback, IPv4-configured interface.
pub fn discover(name: Option<&str>) -> Result<HostInterface, DiscoveryError> {
    let interfaces = pnet_datalink::interfaces();
    if interfaces.is_empty() {
        return Err(DiscoveryError::QueryFailed(
            "no interfaces enumerated (insufficient privileges?)".into(),
        ));
    }

    let candidates: Vec<Candidate> = interfaces
        .iter()
        .map(|iface| {
            let ipv4 = iface.ips.iter().find_map(|net| match (net.ip(), net.mask()) {
                (IpAddr::V4(ip), IpAddr::V4(mask)) => Some((ip, mask)),
                _ => None,
            });
            Candidate {
                name: iface.name.clone(),
                ipv4,
                mac: iface.mac.map(|m| MacAddr(m.octets())),
                up: iface.is_up(),
                loopback: iface.is_loopback(),
            }
        })
        .collect();

    select(&candidates, name)
}

fn select(candidates: &[Candidate], name: Option<&str>) -> Result<HostInterface, DiscoveryError> {
    let found = match name {
        Some(name) => candidates
            .iter()
            .find(|c| c.name == name && c.ipv4.is_some())
            .ok_or_else(|| DiscoveryError::InterfaceNotFound(name.to_string()))?,
        None => candidates
            .iter()
            .find(|c| c.up && !c.loopback && c.ipv4.is_some())
            .ok_or_else(|| {
                DiscoveryError::QueryFailed("no usable interface found while probing".into())
            })?,
    };

    // `ipv4` is checked above.
    let (ipv4, netmask) = found.ipv4.expect("candidate filtered on ipv4");
    debug!(name = %found.name, %ipv4, %netmask, "discovered interface");

    Ok(HostInterface {
        name: found.name.clone(),
        ipv4,
        netmask,
        mac: found.mac,
    })
}
