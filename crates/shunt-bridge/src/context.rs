use std::io;
use std::net::Ipv4Addr;

use shunt_capture::{CaptureConfig, CaptureError, FrameSink, FrameSource, PcapLink};
use shunt_host::{
    default_gateway, discover, CommandRunner, DiscoveryError, HostInterface, PortRangeGuard,
    ShellRunner,
};
use shunt_stack::{InterfaceDescriptor, InterfaceId, NetStack, StackError};
use thiserror::Error;
use tracing::{info, warn};

use crate::capture_loop::{spawn_capture_loop, CaptureLoopConfig, CaptureLoopHandle};
use crate::coalesce::{LinkCoalescer, TxMode};
use crate::netif::{build_descriptor, confirm_link_up, register_with_stack};
use crate::shared::SharedStack;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("interface discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("no usable default gateway")]
    GatewayUnavailable,

    #[error("refusing to bridge loopback interface {0:?}")]
    LoopbackInterface(String),

    #[error("stack rejected bridge setup: {0}")]
    Stack(#[from] StackError),

    #[error("capture facility unavailable: {0}")]
    Capture(#[from] CaptureError),

    #[error("firewall command failed: {0}")]
    Firewall(#[from] io::Error),
}

/// Startup knobs for one bridge instance.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// Host interface to bridge; `None` probes for a usable one.
    pub interface: Option<String>,
    pub server_port_base: u16,
    pub server_port_count: u16,
    pub client_port_base: u16,
    pub client_port_count: u16,
    pub tx_mode: TxMode,
    pub capture: CaptureConfig,
    /// Let the capture loop drive the stack's timers on read timeouts.
    pub drive_timers: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            interface: None,
            server_port_base: 5000,
            server_port_count: 8,
            client_port_base: 6000,
            client_port_count: 8,
            tx_mode: TxMode::default(),
            capture: CaptureConfig::default(),
            drive_timers: true,
        }
    }
}

/// Everything one running bridge owns.
///
/// There is no global state anywhere in the bridge: the descriptor, the
/// port guard, the shared stack cell, and the capture-loop handle all live
/// here, and the caller decides the context's lifetime.
pub struct BridgeContext<S: NetStack> {
    descriptor: InterfaceDescriptor,
    interface: InterfaceId,
    stack: SharedStack<S>,
    guard: PortRangeGuard,
    runner: Box<dyn CommandRunner>,
    capture: CaptureLoopHandle,
}

impl<S: NetStack> std::fmt::Debug for BridgeContext<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeContext")
            .field("descriptor", &self.descriptor)
            .field("interface", &self.interface)
            .finish_non_exhaustive()
    }
}

impl<S: NetStack + 'static> BridgeContext<S> {
    /// Bring the bridge up against the real host: discover addressing, open
    /// the capture device on the discovered interface, reserve the port
    /// ranges, register with the stack, and start pumping frames.
    pub fn start(stack: S, config: BridgeConfig) -> Result<Self, BridgeError> {
        let host = discover(config.interface.as_deref())?;
        let gateway = default_gateway();
        let link = PcapLink::open(&host.name, &config.capture)?;
        let (source, sink) = link.split();
        Self::assemble(stack, host, gateway, source, sink, Box::new(ShellRunner), config)
    }

    /// Wire the bridge from already-obtained parts.
    ///
    /// [`BridgeContext::start`] calls this with the real capture device and
    /// shell runner; tests inject scripted ones. Bring-up order: validate
    /// addressing, reserve ports, register link-down, start the capture
    /// loop, then link-up once the inbound path is live.
    pub fn assemble<F, T>(
        stack: S,
        host: HostInterface,
        gateway: Option<Ipv4Addr>,
        source: F,
        sink: T,
        mut runner: Box<dyn CommandRunner>,
        config: BridgeConfig,
    ) -> Result<Self, BridgeError>
    where
        F: FrameSource + 'static,
        T: FrameSink + 'static,
    {
        let descriptor = build_descriptor(&host, gateway)?;

        let guard = PortRangeGuard::new(
            config.server_port_base,
            config.server_port_count,
            config.client_port_base,
            config.client_port_count,
        );
        guard.activate(runner.as_mut())?;

        let stack = SharedStack::new(stack);
        let output = LinkCoalescer::new(sink, config.tx_mode);
        let interface = register_with_stack(&stack, &descriptor, Box::new(output))?;

        let mut loop_config = CaptureLoopConfig::new(interface);
        loop_config.drive_timers = config.drive_timers;
        let capture = spawn_capture_loop(source, stack.clone(), loop_config);

        confirm_link_up(&stack, interface)?;
        info!(name = %descriptor.name, "bridge up");

        Ok(Self {
            descriptor,
            interface,
            stack,
            guard,
            runner,
            capture,
        })
    }

    pub fn descriptor(&self) -> &InterfaceDescriptor {
        &self.descriptor
    }

    pub fn interface(&self) -> InterfaceId {
        self.interface
    }

    /// Clone of the process-wide stack cell; the only way to reach the
    /// stack from application code.
    pub fn stack(&self) -> SharedStack<S> {
        self.stack.clone()
    }

    pub fn guard(&self) -> &PortRangeGuard {
        &self.guard
    }

    /// False once the capture loop died on a fatal read error.
    pub fn capture_alive(&self) -> bool {
        self.capture.is_alive()
    }

    /// Tear the bridge down: link-down, release the reserved ports.
    ///
    /// The capture thread is left to exit with the process; it only wakes
    /// from its read window, and there is no inbound traffic worth draining
    /// once the link is down.
    pub fn shutdown(mut self) -> Result<(), BridgeError> {
        if let Err(err) = self.stack.lock().set_link_up(self.interface, false) {
            warn!(%err, "could not mark interface link-down at shutdown");
        }
        self.guard.deactivate(self.runner.as_mut())?;
        info!(name = %self.descriptor.name, "bridge down");
        Ok(())
    }
}
