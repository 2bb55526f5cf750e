/// Single-owner handle to a buffer from the stack's pool.
///
/// The capture loop allocates one of these per inbound frame, copies the
/// captured bytes in, and *moves* it into [`crate::NetStack::input_frame`].
/// After the move the capture side cannot touch the buffer again; the stack
/// alone is responsible for its release. Ownership transfer is the whole
/// point of this type; it is deliberately neither `Clone` nor `Copy`.
#[derive(Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    data: Box<[u8]>,
}

impl FrameBuffer {
    /// Allocate a zeroed buffer. Stack implementations use this to back
    /// their pool allocations.
    pub fn zeroed(len: usize) -> Self {
        Self {
            data: vec![0; len].into_boxed_slice(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn payload(&self) -> &[u8] {
        &self.data
    }

    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Copy `src` into the front of the buffer.
    ///
    /// Panics if `src` is longer than the buffer; allocation is always sized
    /// to the captured frame, so a mismatch is a caller bug.
    pub fn fill_from(&mut self, src: &[u8]) {
        self.data[..src.len()].copy_from_slice(src);
    }

    pub fn into_bytes(self) -> Box<[u8]> {
        self.data
    }
}
