use shunt_capture::FrameSink;
use shunt_stack::{LinkOutput, StackError, TxChain, TxSegment};
use tracing::warn;

/// How outbound buffer chains map onto capture-facility sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TxMode {
    /// Alignment-sensitive streaming behavior: segments whose length is a
    /// multiple of 4 are sent standalone (so one logical frame can become
    /// several sends), and an unaligned mid-frame segment triggers
    /// coalescing of the frame's remainder into one padded send.
    #[default]
    PerSegment,
    /// One send per logical frame, unpadded.
    WholeFrame,
}

/// Link-output entry point the stack invokes to transmit.
///
/// Walks each logical frame of the chain and forwards its bytes to the
/// capture facility per the configured [`TxMode`]. Send failures are logged
/// and absorbed: the stack has no useful recovery for a lost frame, and
/// retransmission happens at the protocol layer.
pub struct LinkCoalescer<T: FrameSink> {
    sink: T,
    mode: TxMode,
}

impl<T: FrameSink> LinkCoalescer<T> {
    pub fn new(sink: T, mode: TxMode) -> Self {
        Self { sink, mode }
    }

    pub fn mode(&self) -> TxMode {
        self.mode
    }

    fn send(&mut self, bytes: &[u8]) {
        if let Err(err) = self.sink.send_frame(bytes) {
            warn!(%err, len = bytes.len(), "link output send failed");
        }
    }

    fn output_frame(&mut self, frame: &[TxSegment]) {
        match self.mode {
            TxMode::WholeFrame => {
                if let [only] = frame {
                    self.send(&only.payload);
                } else {
                    let mut buf = Vec::with_capacity(frame[0].total_len);
                    for seg in frame {
                        buf.extend_from_slice(&seg.payload);
                    }
                    self.send(&buf);
                }
            }
            TxMode::PerSegment => {
                let mut idx = 0;
                while idx < frame.len() {
                    let seg = &frame[idx];
                    if seg.len() % 4 != 0 && idx + 1 < frame.len() {
                        // Unaligned mid-frame segment: fold the rest of the
                        // frame into one contiguous buffer, padded up to the
                        // next 32-bit boundary. Padding bytes stay zero and
                        // are never examined by the receiver; true length
                        // travels in the protocol headers.
                        let mut buf = vec![0u8; round_up4(seg.total_len)];
                        let mut off = 0;
                        for rest in &frame[idx..] {
                            buf[off..off + rest.len()].copy_from_slice(&rest.payload);
                            off += rest.len();
                        }
                        self.send(&buf);
                        break;
                    }
                    self.send(&seg.payload);
                    idx += 1;
                }
            }
        }
    }
}

impl<T: FrameSink> LinkOutput for LinkCoalescer<T> {
    fn link_output(&mut self, chain: &TxChain) -> Result<(), StackError> {
        if let Err(err) = chain.validate() {
            warn!(%err, "malformed outbound chain dropped");
            return Err(StackError::Resource(err.to_string()));
        }
        for frame in chain.frames() {
            self.output_frame(frame);
        }
        Ok(())
    }
}

fn round_up4(len: usize) -> usize {
    (len + 3) & !3
}
