use thiserror::Error;

/// Errors the external stack reports back through the seam.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StackError {
    #[error("interface registration rejected: {0}")]
    Registration(String),

    #[error("no such interface handle")]
    UnknownInterface,

    #[error("stack resource exhausted: {0}")]
    Resource(String),
}

/// Outcome of pushing bytes into the stack's transmit queue.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EnqueueError {
    /// Transmit buffer or segment budget exhausted; the sender shrinks and
    /// retries on this one.
    #[error("transmit queue out of memory")]
    OutOfMemory,

    #[error("transmit queue rejected write: {0}")]
    Rejected(String),
}
