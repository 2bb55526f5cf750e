use std::net::Ipv4Addr;
use std::path::Path;

use tracing::warn;

/// Kernel routing table, one whitespace-delimited row per route:
/// `iface destination gateway flags ...`, addresses hex-encoded little-endian.
pub const ROUTE_TABLE_PATH: &str = "/proc/net/route";

/// Extract the default-route gateway from routing-table text.
///
/// The first row whose destination field is all-zero wins; table order, not
/// metric, decides between multiple default routes. Returns `None` when no
/// default route exists or the winning row's gateway field is absent or
/// unparsable. A literal `0.0.0.0` gateway parses as `Some`; callers that
/// need a reachable next hop reject it themselves.
pub fn parse_default_gateway(table: &str) -> Option<Ipv4Addr> {
    for line in table.lines() {
        let mut fields = line.split_whitespace();
        let Some(_iface) = fields.next() else {
            continue;
        };
        let Some(destination) = fields.next() else {
            continue;
        };
        if destination != "00000000" {
            continue;
        }
        // First matching row decides, even if its gateway is unusable.
        let gateway = fields.next()?;
        let raw = u32::from_str_radix(gateway, 16).ok()?;
        return Some(Ipv4Addr::from(raw.to_le_bytes()));
    }
    None
}

/// Read and parse the routing table at `path`.
pub fn default_gateway_at(path: impl AsRef<Path>) -> Option<Ipv4Addr> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(table) => parse_default_gateway(&table),
        Err(err) => {
            warn!(path = %path.display(), %err, "routing table unreadable");
            None
        }
    }
}

/// Read and parse the host routing table.
pub fn default_gateway() -> Option<Ipv4Addr> {
    default_gateway_at(ROUTE_TABLE_PATH)
}
