use thiserror::Error;

/// One contiguous piece of a logical outbound frame.
///
/// `total_len` is the number of payload bytes from this segment through the
/// end of its frame, so the first segment of a frame declares the whole frame
/// length and the last segment has `total_len == payload.len()`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxSegment {
    pub payload: Vec<u8>,
    pub total_len: usize,
}

impl TxSegment {
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// A segment ends its frame when it accounts for all remaining bytes.
    pub fn ends_frame(&self) -> bool {
        self.payload.len() == self.total_len
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("segment lengths sum to {actual} but frame declares {declared}")]
    LengthMismatch { declared: usize, actual: usize },

    #[error("chain ends mid-frame ({missing} bytes missing)")]
    Truncated { missing: usize },
}

/// An ordered sequence of outbound buffer segments produced by the stack.
///
/// A chain may hold several independent logical frames back to back; frame
/// boundaries are recovered from the per-segment `total_len` bookkeeping
/// (see [`TxChain::frames`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TxChain {
    segments: Vec<TxSegment>,
}

impl TxChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// A chain holding a single one-segment frame.
    pub fn single(payload: Vec<u8>) -> Self {
        let total_len = payload.len();
        Self {
            segments: vec![TxSegment { payload, total_len }],
        }
    }

    /// Build a chain from raw segments, trusting the caller's `total_len`
    /// bookkeeping. Stack implementations use this; [`TxChain::validate`]
    /// checks the invariant.
    pub fn from_segments(segments: Vec<TxSegment>) -> Self {
        Self { segments }
    }

    /// Append one logical frame split into the given segments, filling in the
    /// descending `total_len` bookkeeping.
    pub fn push_frame(&mut self, segments: &[&[u8]]) {
        let mut remaining: usize = segments.iter().map(|s| s.len()).sum();
        for seg in segments {
            self.segments.push(TxSegment {
                payload: seg.to_vec(),
                total_len: remaining,
            });
            remaining -= seg.len();
        }
    }

    pub fn segments(&self) -> &[TxSegment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Split the chain into its logical frames.
    ///
    /// A frame ends at the first segment whose `total_len` equals its own
    /// length, or at the hard end of the chain; a missing successor counts
    /// as end-of-frame even if bytes are still owed.
    pub fn frames(&self) -> Vec<&[TxSegment]> {
        let mut frames = Vec::new();
        let mut start = 0;
        for (i, seg) in self.segments.iter().enumerate() {
            if seg.ends_frame() || i + 1 == self.segments.len() {
                frames.push(&self.segments[start..=i]);
                start = i + 1;
            }
        }
        frames
    }

    /// Check the declared-length invariant for every frame in the chain.
    pub fn validate(&self) -> Result<(), ChainError> {
        let mut expected: Option<usize> = None;
        for seg in &self.segments {
            let declared = expected.unwrap_or(seg.total_len);
            if declared != seg.total_len {
                return Err(ChainError::LengthMismatch {
                    declared,
                    actual: seg.total_len,
                });
            }
            let after = declared
                .checked_sub(seg.len())
                .ok_or(ChainError::LengthMismatch {
                    declared,
                    actual: seg.len(),
                })?;
            expected = if after == 0 { None } else { Some(after) };
        }
        match expected {
            Some(missing) => Err(ChainError::Truncated { missing }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_segment_chain_is_one_frame() {
        let chain = TxChain::single(vec![1, 2, 3, 4]);
        let frames = chain.frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), 1);
        assert!(chain.validate().is_ok());
    }

    #[test]
    fn push_frame_fills_descending_totals() {
        let mut chain = TxChain::new();
        chain.push_frame(&[&[0u8; 14], &[0u8; 20], &[0u8; 6]]);
        let segs = chain.segments();
        assert_eq!(segs[0].total_len, 40);
        assert_eq!(segs[1].total_len, 26);
        assert_eq!(segs[2].total_len, 6);
        assert!(segs[2].ends_frame());
        assert!(chain.validate().is_ok());
    }

    #[test]
    fn multiple_frames_are_split_at_total_len_boundary() {
        let mut chain = TxChain::new();
        chain.push_frame(&[&[1u8; 8], &[2u8; 4]]);
        chain.push_frame(&[&[3u8; 16]]);
        let frames = chain.frames();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].len(), 2);
        assert_eq!(frames[1].len(), 1);
    }

    #[test]
    fn truncated_chain_fails_validation() {
        let chain = TxChain {
            segments: vec![TxSegment {
                payload: vec![0; 4],
                total_len: 10,
            }],
        };
        assert_eq!(chain.validate(), Err(ChainError::Truncated { missing: 6 }));
    }

    #[test]
    fn overlong_segment_fails_validation() {
        let chain = TxChain {
            segments: vec![TxSegment {
                payload: vec![0; 12],
                total_len: 10,
            }],
        };
        assert!(matches!(
            chain.validate(),
            Err(ChainError::LengthMismatch { .. })
        ));
    }
}
