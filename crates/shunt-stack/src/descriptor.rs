use std::fmt;
use std::net::Ipv4Addr;

use bitflags::bitflags;

/// MTU the bridge always advertises for its Ethernet interface.
pub const ETHERNET_MTU: u16 = 1500;

/// A 6-byte Ethernet hardware address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MacAddr(pub [u8; 6]);

impl MacAddr {
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    /// An all-zero address, used when the OS could not report one.
    pub fn is_unspecified(&self) -> bool {
        self.0 == [0; 6]
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

bitflags! {
    /// Capability flags the bridge sets on the registered interface.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct InterfaceFlags: u8 {
        const BROADCAST = 1 << 0;
        const ETHARP    = 1 << 1;
        const ETHERNET  = 1 << 2;
        const MULTICAST = 1 << 3;
    }
}

/// Addressing and capabilities of the logical interface registered with the
/// stack.
///
/// Assembled once at startup from discovery results; immutable afterwards
/// except for `link_up`, which the bridge toggles to mirror capture-facility
/// availability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    pub name: String,
    pub ipv4: Ipv4Addr,
    pub netmask: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub mac: MacAddr,
    pub mtu: u16,
    pub flags: InterfaceFlags,
    pub link_up: bool,
}

impl InterfaceDescriptor {
    /// Flags every Ethernet interface the bridge registers carries.
    pub fn default_flags() -> InterfaceFlags {
        InterfaceFlags::BROADCAST
            | InterfaceFlags::ETHARP
            | InterfaceFlags::ETHERNET
            | InterfaceFlags::MULTICAST
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_addr_formats_lowercase_hex() {
        let mac = MacAddr([0xde, 0xad, 0xbe, 0xef, 0x00, 0x42]);
        assert_eq!(mac.to_string(), "de:ad:be:ef:00:42");
    }

    #[test]
    fn unspecified_mac_is_detected() {
        assert!(MacAddr::default().is_unspecified());
        assert!(!MacAddr([1, 0, 0, 0, 0, 0]).is_unspecified());
    }

    #[test]
    fn default_flags_cover_all_capabilities() {
        let flags = InterfaceDescriptor::default_flags();
        assert!(flags.contains(InterfaceFlags::BROADCAST));
        assert!(flags.contains(InterfaceFlags::ETHARP));
        assert!(flags.contains(InterfaceFlags::ETHERNET));
        assert!(flags.contains(InterfaceFlags::MULTICAST));
    }
}
