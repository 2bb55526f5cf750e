#![forbid(unsafe_code)]

//! Capture facility seam: how the bridge reads frames off the wire and puts
//! frames back on it.
//!
//! The traits are deliberately narrow (a blocking-ish [`FrameSource`] for
//! the capture loop, a [`FrameSink`] for the link-output path) so the
//! bridge core can be driven by scripted fakes in tests. The only real
//! implementation wraps libpcap.

mod pcap_link;

pub use pcap_link::{lookup_default_device, CaptureConfig, PcapLink, PcapSink, PcapSource};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no default capture device: {0}")]
    Lookup(String),

    #[error("failed to open capture on {device}: {reason}")]
    Open { device: String, reason: String },

    #[error("fatal capture read error: {0}")]
    Fatal(String),

    #[error("frame transmit failed: {0}")]
    Send(String),
}

/// One read from the capture facility.
#[derive(Debug, PartialEq, Eq)]
pub enum CaptureRead {
    /// A complete link-level frame.
    Frame(Vec<u8>),
    /// The read window elapsed without traffic; callers treat this as a
    /// no-op iteration.
    TimedOut,
}

/// Inbound half of the capture facility.
pub trait FrameSource: Send {
    /// Block until a frame arrives, the read window elapses, or the capture
    /// fails fatally. A fatal error ends the capture loop for good.
    fn next_frame(&mut self) -> Result<CaptureRead, CaptureError>;
}

/// Outbound half of the capture facility.
pub trait FrameSink: Send {
    fn send_frame(&mut self, frame: &[u8]) -> Result<(), CaptureError>;
}
