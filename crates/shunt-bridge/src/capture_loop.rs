use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use shunt_capture::{CaptureError, CaptureRead, FrameSource};
use shunt_stack::{InterfaceId, NetStack};
use tracing::{debug, error, warn};

use crate::shared::SharedStack;

/// Behavior knobs for one capture loop.
#[derive(Debug, Clone, Copy)]
pub struct CaptureLoopConfig {
    /// Interface the inbound frames are delivered to.
    pub interface: InterfaceId,
    /// Drive the stack's due timers on capture timeouts. The loop is the
    /// only steady heartbeat the bridge has, so this is normally on.
    pub drive_timers: bool,
}

impl CaptureLoopConfig {
    pub fn new(interface: InterfaceId) -> Self {
        Self {
            interface,
            drive_timers: true,
        }
    }
}

/// Handle to a running capture loop thread.
///
/// The loop runs for the life of the bridge; the handle exists so callers
/// can observe that it died (fatal capture error) and collect the error
/// instead of silently losing the inbound path.
pub struct CaptureLoopHandle {
    alive: Arc<AtomicBool>,
    join: Option<JoinHandle<CaptureError>>,
}

impl CaptureLoopHandle {
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Wait for the loop to terminate and return the capture error that
    /// killed it. Panics from the loop thread are propagated.
    pub fn join(mut self) -> CaptureError {
        match self.join.take().expect("join called once").join() {
            Ok(err) => err,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

/// Run the inbound pump until the source fails fatally.
///
/// Every iteration blocks on the source with its own finite timeout, then
/// takes the stack lock only for the duration of one stack call. Frames
/// that cannot get a pool buffer are dropped without retry; the protocol
/// layer retransmits. Returns the fatal error after marking the interface
/// link-down.
pub fn run_capture_loop<S, F>(
    mut source: F,
    stack: SharedStack<S>,
    config: CaptureLoopConfig,
) -> CaptureError
where
    S: NetStack,
    F: FrameSource,
{
    loop {
        match source.next_frame() {
            Ok(CaptureRead::TimedOut) => {
                if config.drive_timers {
                    stack.lock().check_timeouts();
                }
            }
            Ok(CaptureRead::Frame(bytes)) => {
                let mut guard = stack.lock();
                match guard.alloc_frame(bytes.len()) {
                    Some(mut frame) => {
                        frame.fill_from(&bytes);
                        if let Err(err) = guard.input_frame(config.interface, frame) {
                            warn!(%err, len = bytes.len(), "stack refused inbound frame");
                        }
                    }
                    None => {
                        debug!(len = bytes.len(), "buffer pool exhausted, frame dropped");
                    }
                }
            }
            Err(err) => {
                error!(%err, "capture read failed, inbound path is down");
                if let Err(link_err) = stack.lock().set_link_up(config.interface, false) {
                    warn!(%link_err, "could not mark interface link-down");
                }
                return err;
            }
        }
    }
}

/// Spawn [`run_capture_loop`] on a dedicated thread.
pub fn spawn_capture_loop<S, F>(
    source: F,
    stack: SharedStack<S>,
    config: CaptureLoopConfig,
) -> CaptureLoopHandle
where
    S: NetStack + 'static,
    F: FrameSource + 'static,
{
    let alive = Arc::new(AtomicBool::new(true));
    let alive_in_loop = Arc::clone(&alive);
    let join = thread::Builder::new()
        .name("capture-loop".into())
        .spawn(move || {
            let err = run_capture_loop(source, stack, config);
            alive_in_loop.store(false, Ordering::Release);
            err
        })
        .expect("spawn capture loop thread");
    CaptureLoopHandle {
        alive,
        join: Some(join),
    }
}
