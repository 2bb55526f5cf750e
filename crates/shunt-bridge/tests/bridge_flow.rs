//! End-to-end bring-up, traffic, and teardown against scripted collaborators.

use std::collections::VecDeque;
use std::io;
use std::net::Ipv4Addr;
use std::sync::{mpsc, Arc, Mutex};
use std::time::{Duration, Instant};

use shunt_bridge::{BridgeConfig, BridgeContext, BridgeError, TxMode};
use shunt_capture::{CaptureError, CaptureRead, FrameSink, FrameSource};
use shunt_host::{CommandRunner, HostInterface};
use shunt_stack::{
    FrameBuffer, InterfaceDescriptor, InterfaceId, LinkOutput, MacAddr, NetStack, StackError,
    TxChain,
};

#[derive(Default)]
struct FakeStack {
    inputs: Vec<Vec<u8>>,
    link_history: Vec<bool>,
    admin_up: bool,
    default_set: bool,
    output: Option<Box<dyn LinkOutput>>,
    registered: Option<InterfaceDescriptor>,
}

impl FakeStack {
    /// Drive the registered link-output dispatch, as the stack would when
    /// it has frames to transmit.
    fn transmit(&mut self, chain: &TxChain) -> Result<(), StackError> {
        self.output
            .as_mut()
            .expect("interface registered")
            .link_output(chain)
    }
}

impl NetStack for FakeStack {
    fn register_interface(
        &mut self,
        descriptor: &InterfaceDescriptor,
        output: Box<dyn LinkOutput>,
    ) -> Result<InterfaceId, StackError> {
        self.registered = Some(descriptor.clone());
        self.output = Some(output);
        Ok(InterfaceId(3))
    }

    fn set_default_interface(&mut self, _id: InterfaceId) -> Result<(), StackError> {
        self.default_set = true;
        Ok(())
    }

    fn set_admin_up(&mut self, _id: InterfaceId, up: bool) -> Result<(), StackError> {
        self.admin_up = up;
        Ok(())
    }

    fn set_link_up(&mut self, _id: InterfaceId, up: bool) -> Result<(), StackError> {
        self.link_history.push(up);
        Ok(())
    }

    fn alloc_frame(&mut self, len: usize) -> Option<FrameBuffer> {
        Some(FrameBuffer::zeroed(len))
    }

    fn input_frame(&mut self, _id: InterfaceId, frame: FrameBuffer) -> Result<(), StackError> {
        self.inputs.push(frame.payload().to_vec());
        Ok(())
    }

    fn check_timeouts(&mut self) {}

    #[cfg(feature = "multicast")]
    fn install_multicast_filter(
        &mut self,
        _id: InterfaceId,
        _filter: shunt_stack::McastFilter,
    ) -> Result<(), StackError> {
        Ok(())
    }
}

struct ScriptedSource {
    script: VecDeque<Result<CaptureRead, CaptureError>>,
    /// When set, the first read blocks until the test releases it, so
    /// bring-up state can be asserted before any traffic flows.
    gate: Option<mpsc::Receiver<()>>,
}

impl ScriptedSource {
    fn new(script: Vec<Result<CaptureRead, CaptureError>>) -> Self {
        Self {
            script: script.into(),
            gate: None,
        }
    }

    fn gated(script: Vec<Result<CaptureRead, CaptureError>>, gate: mpsc::Receiver<()>) -> Self {
        Self {
            script: script.into(),
            gate: Some(gate),
        }
    }
}

impl FrameSource for ScriptedSource {
    fn next_frame(&mut self) -> Result<CaptureRead, CaptureError> {
        if let Some(gate) = self.gate.take() {
            let _ = gate.recv();
        }
        self.script
            .pop_front()
            .unwrap_or(Err(CaptureError::Fatal("script exhausted".into())))
    }
}

#[derive(Clone, Default)]
struct RecordingSink {
    sends: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl FrameSink for RecordingSink {
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), CaptureError> {
        self.sends.lock().unwrap().push(frame.to_vec());
        Ok(())
    }
}

#[derive(Clone, Default)]
struct RecordingRunner {
    invocations: Arc<Mutex<Vec<(String, Vec<String>)>>>,
}

impl CommandRunner for RecordingRunner {
    fn run(&mut self, program: &str, args: &[String]) -> io::Result<()> {
        self.invocations
            .lock()
            .unwrap()
            .push((program.to_string(), args.to_vec()));
        Ok(())
    }
}

fn host() -> HostInterface {
    HostInterface {
        name: "eth0".into(),
        ipv4: Ipv4Addr::new(10, 0, 0, 5),
        netmask: Ipv4Addr::new(255, 255, 255, 0),
        mac: Some(MacAddr([2, 0, 0, 0, 0, 1])),
    }
}

fn gateway() -> Option<Ipv4Addr> {
    Some(Ipv4Addr::new(10, 0, 0, 1))
}

fn config() -> BridgeConfig {
    BridgeConfig {
        server_port_base: 5000,
        server_port_count: 3,
        client_port_base: 6000,
        client_port_count: 3,
        ..Default::default()
    }
}

fn wait_for_loop_exit<S: NetStack + 'static>(ctx: &BridgeContext<S>) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while ctx.capture_alive() {
        assert!(Instant::now() < deadline, "capture loop did not terminate");
        std::thread::sleep(Duration::from_millis(5));
    }
}

#[test]
fn bring_up_deliver_and_tear_down() {
    let (release, gate) = mpsc::channel();
    let source = ScriptedSource::gated(
        vec![
            Ok(CaptureRead::TimedOut),
            Ok(CaptureRead::Frame(vec![0x5Au8; 100])),
            Err(CaptureError::Fatal("device removed".into())),
        ],
        gate,
    );
    let sink = RecordingSink::default();
    let runner = RecordingRunner::default();
    let invocations = Arc::clone(&runner.invocations);

    let ctx = BridgeContext::assemble(
        FakeStack::default(),
        host(),
        gateway(),
        source,
        sink.clone(),
        Box::new(runner),
        config(),
    )
    .unwrap();

    // Bring-up: ufw off, then one drop rule per reserved port.
    {
        let calls = invocations.lock().unwrap();
        assert_eq!(calls[0], ("ufw".to_string(), vec!["disable".to_string()]));
        let drops: Vec<&str> = calls[1..]
            .iter()
            .map(|(_, args)| args[5].as_str())
            .collect();
        assert_eq!(drops, ["5000", "5001", "5002", "6000", "6001", "6002"]);
    }

    // Registration state: default route, admin-up, link went down then up.
    let stack = ctx.stack();
    {
        let inner = stack.lock();
        let desc = inner.registered.as_ref().unwrap();
        assert_eq!(desc.mtu, 1500);
        assert_eq!(desc.gateway, Ipv4Addr::new(10, 0, 0, 1));
        assert!(inner.default_set);
        assert!(inner.admin_up);
        assert!(inner.link_history.starts_with(&[false, true]));
    }

    // The script delivers exactly one frame before the fatal read.
    release.send(()).unwrap();
    wait_for_loop_exit(&ctx);
    assert!(!ctx.capture_alive());
    {
        let inner = stack.lock();
        assert_eq!(inner.inputs.len(), 1);
        assert_eq!(inner.inputs[0], vec![0x5Au8; 100]);
        // Fatal exit marked the link down again.
        assert_eq!(inner.link_history.last(), Some(&false));
    }

    // Outbound: the stack drives the registered dispatch, frames reach the
    // capture sink.
    {
        let mut chain = TxChain::new();
        chain.push_frame(&[&[1u8; 8], &[2u8; 4]]);
        stack.lock().transmit(&chain).unwrap();
    }
    let sends = sink.sends.lock().unwrap().clone();
    assert_eq!(sends.len(), 2);
    assert_eq!(sends[0], vec![1u8; 8]);
    assert_eq!(sends[1], vec![2u8; 4]);

    // Teardown: accept rules only, no ufw re-enable.
    let before = invocations.lock().unwrap().len();
    ctx.shutdown().unwrap();
    let calls = invocations.lock().unwrap();
    let teardown = &calls[before..];
    assert_eq!(teardown.len(), 6);
    assert!(teardown.iter().all(|(prog, args)| {
        prog == "iptables" && args.last().map(String::as_str) == Some("ACCEPT")
    }));
}

#[test]
fn whole_frame_mode_sends_one_frame_per_chain_frame() {
    let source = ScriptedSource::new(vec![Err(CaptureError::Fatal("immediate".into()))]);
    let sink = RecordingSink::default();
    let mut cfg = config();
    cfg.tx_mode = TxMode::WholeFrame;

    let ctx = BridgeContext::assemble(
        FakeStack::default(),
        host(),
        gateway(),
        source,
        sink.clone(),
        Box::new(RecordingRunner::default()),
        cfg,
    )
    .unwrap();

    let stack = ctx.stack();
    let mut chain = TxChain::new();
    chain.push_frame(&[&[1u8; 8], &[2u8; 5]]);
    stack.lock().transmit(&chain).unwrap();

    let sends = sink.sends.lock().unwrap().clone();
    assert_eq!(sends.len(), 1);
    assert_eq!(sends[0].len(), 13);
}

#[test]
fn missing_gateway_aborts_before_any_firewall_change() {
    let source = ScriptedSource::new(vec![]);
    let runner = RecordingRunner::default();
    let invocations = Arc::clone(&runner.invocations);

    let err = BridgeContext::assemble(
        FakeStack::default(),
        host(),
        None,
        source,
        RecordingSink::default(),
        Box::new(runner),
        config(),
    )
    .unwrap_err();

    assert!(matches!(err, BridgeError::GatewayUnavailable));
    assert!(invocations.lock().unwrap().is_empty());
}

#[test]
fn loopback_host_interface_aborts_bring_up() {
    let lo = HostInterface {
        name: "lo".into(),
        ipv4: Ipv4Addr::new(127, 0, 0, 1),
        netmask: Ipv4Addr::new(255, 0, 0, 0),
        mac: None,
    };

    let err = BridgeContext::assemble(
        FakeStack::default(),
        lo,
        gateway(),
        ScriptedSource::new(vec![]),
        RecordingSink::default(),
        Box::new(RecordingRunner::default()),
        config(),
    )
    .unwrap_err();

    assert!(matches!(err, BridgeError::LoopbackInterface(name) if name == "lo"));
}
