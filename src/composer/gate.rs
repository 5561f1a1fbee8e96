//! Composition gate - serializes calls to the composition service.
//!
//! The composer handles concurrent requests from one session badly, so
//! every generation passes through a single-permit gate. Waiters are
//! served strictly in arrival order (tokio's semaphore is fair), and the
//! permit travels inside a [`GatePass`]: dropping the pass releases the
//! gate, so it is freed on every exit path, including errors and panics,
//! and only a holder can ever release it.
//!
//! Each scheduler owns its own gate; independent sessions never contend.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Returned by [`CompositionGate::acquire`] once the gate has been closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("composition gate is closed")]
pub struct GateClosed;

/// Single-holder, FIFO gate around the composer.
///
/// Cloning yields another handle to the same gate.
#[derive(Debug, Clone)]
pub struct CompositionGate {
    permits: Arc<Semaphore>,
    waiting: Arc<AtomicUsize>,
}

/// Proof of holding the gate. Dropping it hands the gate to the next waiter.
#[derive(Debug)]
#[must_use = "the gate is released as soon as the pass is dropped"]
pub struct GatePass {
    _permit: OwnedSemaphorePermit,
}

impl GatePass {
    /// Release the gate explicitly (same as dropping the pass).
    pub fn release(self) {}
}

impl Default for CompositionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl CompositionGate {
    /// Create an open, free gate.
    pub fn new() -> Self {
        Self {
            permits: Arc::new(Semaphore::new(1)),
            waiting: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Wait until this caller is the sole holder.
    ///
    /// Fails only if the gate is closed before this caller is served.
    pub async fn acquire(&self) -> Result<GatePass, GateClosed> {
        let _waiting = WaitingGuard::enter(&self.waiting);
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| GateClosed)?;
        Ok(GatePass { _permit: permit })
    }

    /// Whether someone currently holds the gate.
    pub fn is_held(&self) -> bool {
        self.permits.available_permits() == 0
    }

    /// Number of callers suspended in [`acquire`](Self::acquire).
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::Acquire)
    }

    /// Refuse all queued and future acquisitions.
    ///
    /// A current holder keeps its pass until it finishes.
    pub fn close(&self) {
        self.permits.close();
    }

    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }
}

/// Counts a caller as waiting for as long as its `acquire` future lives.
struct WaitingGuard<'a>(&'a AtomicUsize);

impl<'a> WaitingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::AcqRel);
        Self(counter)
    }
}

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}
