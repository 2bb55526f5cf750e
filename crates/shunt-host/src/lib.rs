#![forbid(unsafe_code)]

//! Host OS queries the bridge needs at startup: interface addressing,
//! default-gateway lookup, and firewall port reservations.
//!
//! Everything here runs once during bring-up (plus once more at shutdown for
//! the port guard); nothing in this crate touches the protocol stack.

mod discovery;
mod gateway;
mod portguard;

pub use discovery::{discover, DiscoveryError, HostInterface};
pub use gateway::{default_gateway, default_gateway_at, parse_default_gateway, ROUTE_TABLE_PATH};
pub use portguard::{CommandRunner, FirewallRule, PortRangeGuard, ShellRunner};
