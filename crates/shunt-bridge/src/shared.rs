use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use shunt_stack::NetStack;

/// Process-wide guard around the protocol stack.
///
/// The stack expects a single logical thread of control; this wrapper is the
/// only sanctioned way to reach it. The capture loop, timer driving, and
/// application-side senders all clone one `SharedStack` and take the lock
/// per operation, never across a blocking wait.
pub struct SharedStack<S: NetStack> {
    inner: Arc<Mutex<S>>,
}

impl<S: NetStack> SharedStack<S> {
    pub fn new(stack: S) -> Self {
        Self {
            inner: Arc::new(Mutex::new(stack)),
        }
    }

    pub fn lock(&self) -> MutexGuard<'_, S> {
        self.inner.lock()
    }
}

impl<S: NetStack> Clone for SharedStack<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}
