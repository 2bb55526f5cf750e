use shunt_stack::{EnqueueError, TxQueue};
use thiserror::Error;
use tracing::{debug, trace};

/// Which next-chunk recurrence the sender uses between write attempts.
///
/// `Legacy` recomputes the next chunk as `total - last_chunk` instead of
/// `remaining - last_chunk`; the two agree for the first and second chunk
/// of a send and diverge from the third chunk on. Both variants are kept
/// so the divergence stays pinned by tests. The sender additionally clamps
/// every attempt to the caller's buffer bounds, so `Legacy` oversizing is
/// trimmed rather than reading past the buffer; under the clamp both
/// variants transmit the same byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChunkAccounting {
    /// Historical recurrence: `total_len - last_chunk`.
    Legacy,
    /// Corrected recurrence: `(total_len - prev_offset) - last_chunk`.
    #[default]
    Exact,
}

/// Next chunk size after a successful write of `last_chunk` bytes that
/// started at `prev_offset` into a `total_len`-byte buffer.
pub fn next_chunk_len(
    accounting: ChunkAccounting,
    total_len: usize,
    prev_offset: usize,
    last_chunk: usize,
) -> usize {
    match accounting {
        ChunkAccounting::Legacy => total_len - last_chunk,
        ChunkAccounting::Exact => total_len - prev_offset - last_chunk,
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    /// The 1-byte attempt still failed; the queue is truly wedged.
    #[error("transmit queue out of memory after shrinking to 1 byte ({sent}/{total} bytes sent)")]
    OutOfMemory { sent: usize, total: usize },

    #[error("transmit queue rejected write: {0}")]
    Rejected(String),
}

/// Push `buf` into a connection's transmit queue under backpressure.
///
/// Each round clamps the attempt to the queue's available capacity (and the
/// buffer's remaining bytes), then shrinks on out-of-memory: straight to the
/// 1-byte minimum when capacity is exhausted or the pending-segment budget
/// is full, halving otherwise. A successful enqueue is flushed immediately.
/// If even the 1-byte attempt fails the error is surfaced with the byte
/// count that did go out. Nagle-style coalescing is re-enabled on the
/// connection before every return, regardless of entry state.
pub fn send_buffered<Q: TxQueue + ?Sized>(
    queue: &mut Q,
    buf: &[u8],
    accounting: ChunkAccounting,
) -> Result<usize, SendError> {
    let total = buf.len();
    if total == 0 {
        queue.set_coalescing(true);
        return Ok(0);
    }

    let mut offset = 0usize;
    let mut snd_len = total;

    loop {
        snd_len = snd_len.min(queue.send_capacity()).min(total - offset);
        if snd_len == 0 {
            // Zero capacity: attempt the minimum unit and let the queue
            // refuse it, which ends in the surfaced out-of-memory below.
            snd_len = 1;
        }

        loop {
            match queue.enqueue(&buf[offset..offset + snd_len]) {
                Ok(()) => {
                    queue.flush();
                    trace!(offset, len = snd_len, "chunk enqueued");
                    break;
                }
                Err(EnqueueError::OutOfMemory) => {
                    if snd_len <= 1 {
                        debug!(sent = offset, total, "transmit queue wedged at 1 byte");
                        queue.set_coalescing(true);
                        return Err(SendError::OutOfMemory {
                            sent: offset,
                            total,
                        });
                    }
                    if queue.send_capacity() == 0
                        || queue.pending_segments() >= queue.max_pending_segments()
                    {
                        snd_len = 1;
                    } else {
                        snd_len /= 2;
                    }
                }
                Err(EnqueueError::Rejected(reason)) => {
                    queue.set_coalescing(true);
                    return Err(SendError::Rejected(reason));
                }
            }
        }

        let prev_offset = offset;
        offset += snd_len;
        if offset >= total {
            break;
        }
        snd_len = next_chunk_len(accounting, total, prev_offset, snd_len);
        if snd_len == 0 {
            break;
        }
    }

    queue.set_coalescing(true);
    Ok(offset)
}
