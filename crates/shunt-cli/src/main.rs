//! Diagnostic CLI for the capture bridge: report what the bridge would
//! discover on this host, and drive the firewall port guard by hand.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use shunt_capture::lookup_default_device;
use shunt_host::{default_gateway, discover, PortRangeGuard, ShellRunner};

#[derive(Debug, Clone, Args)]
struct PortArgs {
    /// First port of the server range.
    #[arg(long, default_value_t = 5000)]
    server_base: u16,

    /// Number of server ports.
    #[arg(long, default_value_t = 8)]
    server_count: u16,

    /// First port of the client range.
    #[arg(long, default_value_t = 6000)]
    client_base: u16,

    /// Number of client ports.
    #[arg(long, default_value_t = 8)]
    client_count: u16,
}

impl PortArgs {
    fn guard(&self) -> PortRangeGuard {
        PortRangeGuard::new(
            self.server_base,
            self.server_count,
            self.client_base,
            self.client_count,
        )
    }
}

#[derive(Debug, Parser)]
#[command(name = "shunt")]
#[command(about = "Host-side diagnostics for the capture bridge")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Report the interface, gateway, and capture device the bridge would use.
    Info {
        /// Interface to inspect; probes for one when omitted.
        #[arg(long)]
        interface: Option<String>,
    },
    /// Reserve the bridge's TCP port ranges at the firewall (ufw off, drops in).
    Block {
        #[command(flatten)]
        ports: PortArgs,
    },
    /// Layer accept rules over previously reserved ports.
    Unblock {
        #[command(flatten)]
        ports: PortArgs,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Info { interface } => info(interface.as_deref()),
        Commands::Block { ports } => {
            let guard = ports.guard();
            guard
                .activate(&mut ShellRunner)
                .context("blocking reserved ports")?;
            println!("blocked {} ports", guard.ports().len());
            Ok(())
        }
        Commands::Unblock { ports } => {
            let guard = ports.guard();
            guard
                .deactivate(&mut ShellRunner)
                .context("releasing reserved ports")?;
            println!("released {} ports", guard.ports().len());
            Ok(())
        }
    }
}

fn info(interface: Option<&str>) -> Result<()> {
    let host = discover(interface).context("interface discovery")?;
    println!("interface: {}", host.name);
    println!("ipv4:      {}", host.ipv4);
    println!("netmask:   {}", host.netmask);
    match host.mac {
        Some(mac) => println!("mac:       {mac}"),
        None => println!("mac:       (not reported)"),
    }
    match default_gateway() {
        Some(gw) => println!("gateway:   {gw}"),
        None => println!("gateway:   (no default route)"),
    }
    match lookup_default_device() {
        Ok(device) => println!("capture:   {device}"),
        Err(err) => println!("capture:   unavailable ({err})"),
    }
    Ok(())
}
