#![forbid(unsafe_code)]

//! The bridge core: glue between a host capture device and an embedded
//! TCP/IP stack that knows nothing about OS sockets.
//!
//! Responsibilities, in dependency order:
//! 1. assemble discovered addressing into the stack's interface object and
//!    register it (`netif`),
//! 2. pump inbound frames from the capture facility into the stack on a
//!    dedicated thread (`capture_loop`),
//! 3. convert the stack's outbound buffer chains into frames the capture
//!    facility accepts (`coalesce`),
//! 4. push application bytes into the stack's flow-controlled transmit
//!    queue (`sender`).
//!
//! Hard invariant: the stack is not internally thread-safe. Every call into
//! it (capture delivery, timer ticks, application sends) goes through one
//! process-wide [`SharedStack`] lock. No component holds a raw stack
//! reference across threads.

mod capture_loop;
mod coalesce;
mod context;
mod netif;
mod sender;
mod shared;

pub use capture_loop::{run_capture_loop, spawn_capture_loop, CaptureLoopConfig, CaptureLoopHandle};
pub use coalesce::{LinkCoalescer, TxMode};
pub use context::{BridgeConfig, BridgeContext, BridgeError};
pub use netif::{build_descriptor, confirm_link_up, register_with_stack};
pub use sender::{next_chunk_len, send_buffered, ChunkAccounting, SendError};
pub use shared::SharedStack;
