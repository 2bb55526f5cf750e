#[cfg(feature = "multicast")]
use std::net::Ipv4Addr;

use crate::{EnqueueError, FrameBuffer, InterfaceDescriptor, StackError, TxChain};

/// Handle to a logical interface registered with the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterfaceId(pub u32);

/// Multicast group membership change reported through the MAC filter.
#[cfg(feature = "multicast")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McastAction {
    Join,
    Leave,
}

/// MAC filter installed on an interface; the bridge installs a permissive
/// one that accepts every join/leave unconditionally.
#[cfg(feature = "multicast")]
pub type McastFilter = fn(Ipv4Addr, McastAction) -> Result<(), StackError>;

/// Wire-output entry point the stack calls when it has frames to transmit.
///
/// Implemented by the bridge's link-output coalescer; registered once via
/// [`NetStack::register_interface`].
pub trait LinkOutput: Send {
    fn link_output(&mut self, chain: &TxChain) -> Result<(), StackError>;
}

/// Registration, buffer-pool, input, and timer surface of the external stack.
///
/// Implementations are *not* assumed internally thread-safe: the stack
/// expects a single logical thread of control, and every call into it must
/// go through one process-wide lock (see `shunt-bridge`'s `SharedStack`).
pub trait NetStack: Send {
    /// Register a new logical interface and install its output dispatch.
    fn register_interface(
        &mut self,
        descriptor: &InterfaceDescriptor,
        output: Box<dyn LinkOutput>,
    ) -> Result<InterfaceId, StackError>;

    /// Make the interface the stack's default route target.
    fn set_default_interface(&mut self, id: InterfaceId) -> Result<(), StackError>;

    /// Toggle administrative up/down.
    fn set_admin_up(&mut self, id: InterfaceId, up: bool) -> Result<(), StackError>;

    /// Toggle link (carrier) state.
    fn set_link_up(&mut self, id: InterfaceId, up: bool) -> Result<(), StackError>;

    /// Allocate a pool buffer for one inbound frame. `None` means the pool is
    /// exhausted; the caller drops the frame.
    fn alloc_frame(&mut self, len: usize) -> Option<FrameBuffer>;

    /// Hand an inbound frame to the stack. Ownership moves with the call;
    /// the stack alone releases the buffer.
    fn input_frame(&mut self, id: InterfaceId, frame: FrameBuffer) -> Result<(), StackError>;

    /// Drive the stack's due timers (retransmits, ARP aging, ...).
    fn check_timeouts(&mut self);

    #[cfg(feature = "multicast")]
    fn install_multicast_filter(
        &mut self,
        id: InterfaceId,
        filter: McastFilter,
    ) -> Result<(), StackError>;
}

/// Flow-controlled transmit queue of one stack connection.
pub trait TxQueue {
    /// Bytes of send-buffer capacity currently available.
    fn send_capacity(&self) -> usize;

    /// Segments already queued but not yet acknowledged.
    fn pending_segments(&self) -> usize;

    /// Hard limit on queued segments.
    fn max_pending_segments(&self) -> usize;

    /// Copy `bytes` into the queue without transmitting yet.
    fn enqueue(&mut self, bytes: &[u8]) -> Result<(), EnqueueError>;

    /// Push queued data onto the wire now.
    fn flush(&mut self);

    /// Enable or disable Nagle-style small-write coalescing.
    fn set_coalescing(&mut self, enabled: bool);
}
