#![forbid(unsafe_code)]

//! Seam types and traits between the host bridge and the embedded TCP/IP stack.
//!
//! The protocol stack itself (connection state machines, ARP/IP/TCP logic, its
//! buffer pool) is an external collaborator. This crate pins down the *shape*
//! of that collaboration: how an interface is registered, how captured frames
//! are handed over (a move, enforced by [`FrameBuffer`]), how the stack's
//! outbound buffer chains look on the wire-output side, and how application
//! bytes enter the flow-controlled transmit queue.
//!
//! This crate is intentionally minimal and dependency-light so both the real
//! bridge and test doubles can implement it.

mod chain;
mod descriptor;
mod error;
mod frame;
mod traits;

pub use chain::{ChainError, TxChain, TxSegment};
pub use descriptor::{InterfaceDescriptor, InterfaceFlags, MacAddr, ETHERNET_MTU};
pub use error::{EnqueueError, StackError};
pub use frame::FrameBuffer;
pub use traits::{InterfaceId, LinkOutput, NetStack, TxQueue};

#[cfg(feature = "multicast")]
pub use traits::{McastAction, McastFilter};
