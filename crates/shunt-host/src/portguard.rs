use std::io;
use std::process::Command;

use tracing::{info, warn};

/// Direction a per-port rule takes: block inbound traffic or let it through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirewallRule {
    Drop,
    Accept,
}

impl FirewallRule {
    fn target(self) -> &'static str {
        match self {
            FirewallRule::Drop => "DROP",
            FirewallRule::Accept => "ACCEPT",
        }
    }
}

/// Executes shell-level firewall commands. Split out so tests can record
/// invocations instead of mutating the host.
pub trait CommandRunner {
    fn run(&mut self, program: &str, args: &[String]) -> io::Result<()>;
}

/// Runs commands for real via `std::process::Command`.
///
/// Non-zero exit codes are logged and swallowed; firewall adjustments are
/// best-effort and a missing `ufw` must not abort bring-up.
#[derive(Debug, Default)]
pub struct ShellRunner;

impl CommandRunner for ShellRunner {
    fn run(&mut self, program: &str, args: &[String]) -> io::Result<()> {
        let status = Command::new(program).args(args).status()?;
        if !status.success() {
            warn!(%program, ?args, %status, "firewall command failed");
        }
        Ok(())
    }
}

/// Reserves two contiguous TCP port ranges at the OS packet-filter layer so
/// the kernel's own stack never answers on them.
///
/// `activate` disables the host firewall outright, then layers one inbound
/// drop rule per reserved port. `deactivate` layers accept rules on top;
/// it does *not* delete the drop rules and does *not* re-enable the
/// firewall, so the net post-shutdown state is "firewall disabled, accepts
/// superseding stale drops".
#[derive(Debug, Clone)]
pub struct PortRangeGuard {
    ports: Vec<u16>,
}

impl PortRangeGuard {
    /// Flattened, deterministic reservation order: server ports ascending,
    /// then client ports ascending.
    pub fn new(server_base: u16, server_count: u16, client_base: u16, client_count: u16) -> Self {
        let mut ports = Vec::with_capacity(usize::from(server_count) + usize::from(client_count));
        ports.extend((0..server_count).map(|i| server_base + i));
        ports.extend((0..client_count).map(|i| client_base + i));
        Self { ports }
    }

    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    /// Whether `port` belongs to either reserved range.
    pub fn contains(&self, port: u16) -> bool {
        self.ports.contains(&port)
    }

    /// Disable the firewall and block every reserved port.
    pub fn activate(&self, runner: &mut dyn CommandRunner) -> io::Result<()> {
        runner.run("ufw", &["disable".to_string()])?;
        for &port in &self.ports {
            runner.run("iptables", &rule_args(port, FirewallRule::Drop))?;
        }
        info!(ports = self.ports.len(), "reserved ports blocked");
        Ok(())
    }

    /// Layer accept rules over the reserved ports. Safe to call repeatedly;
    /// no state machine prevents (or detects) double deactivation.
    pub fn deactivate(&self, runner: &mut dyn CommandRunner) -> io::Result<()> {
        for &port in &self.ports {
            runner.run("iptables", &rule_args(port, FirewallRule::Accept))?;
        }
        info!(ports = self.ports.len(), "reserved ports released");
        Ok(())
    }
}

fn rule_args(port: u16, rule: FirewallRule) -> Vec<String> {
    [
        "-A",
        "INPUT",
        "-p",
        "tcp",
        "--destination-port",
        &port.to_string(),
        "-j",
        rule.target(),
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
