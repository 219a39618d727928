//! [`ReadinessGate`] – one-shot startup latch.
//!
//! A consumer thread calls [`ReadinessGate::signal_ready`] once it has
//! finished its own initialisation; the orchestrator blocks in
//! [`ReadinessGate::wait_until_ready`] until that happens.  The latch is
//! monotonic: once set it never resets, and every later waiter returns
//! immediately.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//! use vigil_kernel::ReadinessGate;
//!
//! let gate = Arc::new(ReadinessGate::new());
//! let child = Arc::clone(&gate);
//! thread::spawn(move || child.signal_ready());
//!
//! gate.wait_until_ready();
//! assert!(gate.is_ready());
//! ```

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// A monotonic `false → true` latch guarded by a mutex and condition variable.
#[derive(Debug, Default)]
pub struct ReadinessGate {
    ready: Mutex<bool>,
    cond: Condvar,
}

impl ReadinessGate {
    /// Create a gate in the not-ready state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the gate ready and wake every waiter.
    ///
    /// Idempotent: a second call leaves the state unchanged.
    pub fn signal_ready(&self) {
        let mut ready = self.lock();
        if !*ready {
            *ready = true;
        }
        self.cond.notify_all();
    }

    /// Block until the gate has been signalled.
    ///
    /// Returns immediately if it already was.  There is no timeout: a gate
    /// that is never signalled blocks the caller forever.
    pub fn wait_until_ready(&self) {
        let mut ready = self.lock();
        // Re-check after every wake; a wake-up alone proves nothing.
        while !*ready {
            ready = self.cond.wait(ready).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Non-blocking probe of the latch.
    pub fn is_ready(&self) -> bool {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.ready.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
