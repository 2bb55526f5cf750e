use std::sync::Arc;

use parking_lot::Mutex;
use pcap::{Active, Capture, Device};
use tracing::{debug, info};

use crate::{CaptureError, CaptureRead, FrameSink, FrameSource};

const DEFAULT_SNAPLEN: i32 = 65535;

/// Read-window length. The capture handle is shared between the read and
/// send halves, so reads must release the lock periodically rather than
/// block forever.
const DEFAULT_TIMEOUT_MS: i32 = 100;

#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Maximum bytes captured per frame.
    pub snaplen: i32,
    /// Read window in milliseconds.
    pub timeout_ms: i32,
    /// Capture frames not addressed to us (required: the stack answers for
    /// its own MAC, not the host's).
    pub promiscuous: bool,
    /// Deliver frames as they arrive instead of batching.
    pub immediate_mode: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            snaplen: DEFAULT_SNAPLEN,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            promiscuous: true,
            immediate_mode: true,
        }
    }
}

/// Name of the first device libpcap considers suitable for capture.
pub fn lookup_default_device() -> Result<String, CaptureError> {
    let device = Device::lookup()
        .map_err(|e| CaptureError::Lookup(e.to_string()))?
        .ok_or_else(|| CaptureError::Lookup("no capture-capable device".into()))?;
    info!(device = %device.name, "capture device lookup");
    Ok(device.name)
}

/// An open libpcap handle, shareable between one reader and one writer.
///
/// libpcap itself tolerates concurrent read/inject on one handle, but the
/// Rust binding does not expose that; a mutex with a short read window keeps
/// the send path from starving.
pub struct PcapLink {
    capture: Arc<Mutex<Capture<Active>>>,
    device: String,
}

impl PcapLink {
    pub fn open(device: &str, config: &CaptureConfig) -> Result<Self, CaptureError> {
        let capture = Capture::from_device(Device::from(device))
            .map_err(|e| CaptureError::Open {
                device: device.to_string(),
                reason: e.to_string(),
            })?
            .promisc(config.promiscuous)
            .snaplen(config.snaplen)
            .timeout(config.timeout_ms)
            .immediate_mode(config.immediate_mode)
            .open()
            .map_err(|e| CaptureError::Open {
                device: device.to_string(),
                reason: e.to_string(),
            })?;

        info!(%device, "capture open");
        Ok(Self {
            capture: Arc::new(Mutex::new(capture)),
            device: device.to_string(),
        })
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    /// Split into the capture-loop read half and the link-output send half.
    pub fn split(self) -> (PcapSource, PcapSink) {
        let source = PcapSource {
            capture: Arc::clone(&self.capture),
        };
        let sink = PcapSink {
            capture: self.capture,
        };
        (source, sink)
    }
}

pub struct PcapSource {
    capture: Arc<Mutex<Capture<Active>>>,
}

impl FrameSource for PcapSource {
    fn next_frame(&mut self) -> Result<CaptureRead, CaptureError> {
        let mut capture = self.capture.lock();
        match capture.next_packet() {
            Ok(packet) => Ok(CaptureRead::Frame(packet.data.to_vec())),
            Err(pcap::Error::TimeoutExpired) => Ok(CaptureRead::TimedOut),
            Err(err) => Err(CaptureError::Fatal(err.to_string())),
        }
    }
}

pub struct PcapSink {
    capture: Arc<Mutex<Capture<Active>>>,
}

impl FrameSink for PcapSink {
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), CaptureError> {
        debug!(len = frame.len(), "sendpacket");
        self.capture
            .lock()
            .sendpacket(frame)
            .map_err(|e| CaptureError::Send(e.to_string()))
    }
}
