use std::net::Ipv4Addr;

use shunt_host::HostInterface;
use shunt_stack::{InterfaceDescriptor, InterfaceId, LinkOutput, MacAddr, NetStack, ETHERNET_MTU};
use tracing::info;

use crate::context::BridgeError;
use crate::shared::SharedStack;

#[cfg(feature = "multicast")]
use shunt_stack::{McastAction, StackError};

/// Assemble the stack-facing interface object from discovery results.
///
/// Addressing is pinned here, once: the bridge refuses to run without a
/// usable default gateway (missing or `0.0.0.0`) and refuses loopback
/// outright, since a loopback bridge would capture its own transmissions. The
/// descriptor starts link-down; [`confirm_link_up`] flips it after the
/// capture facility is confirmed open.
pub fn build_descriptor(
    host: &HostInterface,
    gateway: Option<Ipv4Addr>,
) -> Result<InterfaceDescriptor, BridgeError> {
    let gateway = gateway.ok_or(BridgeError::GatewayUnavailable)?;
    if gateway.is_unspecified() {
        return Err(BridgeError::GatewayUnavailable);
    }
    if host.is_loopback() {
        return Err(BridgeError::LoopbackInterface(host.name.clone()));
    }

    Ok(InterfaceDescriptor {
        name: host.name.clone(),
        ipv4: host.ipv4,
        netmask: host.netmask,
        gateway,
        mac: host.mac.unwrap_or(MacAddr([0; 6])),
        mtu: ETHERNET_MTU,
        flags: InterfaceDescriptor::default_flags(),
        link_up: false,
    })
}

/// Register the assembled interface with the stack and bring it up
/// administratively (still link-down).
///
/// Also installs the output dispatch and, when built with multicast
/// support, a permissive MAC filter that accepts every join and leave.
pub fn register_with_stack<S: NetStack>(
    stack: &SharedStack<S>,
    descriptor: &InterfaceDescriptor,
    output: Box<dyn LinkOutput>,
) -> Result<InterfaceId, BridgeError> {
    let mut guard = stack.lock();
    let id = guard.register_interface(descriptor, output)?;
    #[cfg(feature = "multicast")]
    guard.install_multicast_filter(id, accept_all_groups)?;
    guard.set_default_interface(id)?;
    guard.set_admin_up(id, true)?;
    guard.set_link_up(id, false)?;

    info!(
        name = %descriptor.name,
        mac = %descriptor.mac,
        ipv4 = %descriptor.ipv4,
        netmask = %descriptor.netmask,
        gateway = %descriptor.gateway,
        "interface registered"
    );
    Ok(id)
}

/// Mark the interface link-up once the capture facility is confirmed open.
pub fn confirm_link_up<S: NetStack>(
    stack: &SharedStack<S>,
    id: InterfaceId,
) -> Result<(), BridgeError> {
    stack.lock().set_link_up(id, true)?;
    Ok(())
}

#[cfg(feature = "multicast")]
fn accept_all_groups(_group: Ipv4Addr, _action: McastAction) -> Result<(), StackError> {
    Ok(())
}
