//! The cooperative-cancellation context threaded through every suspension
//! point (model calls, tool execution, channel receives, graph nodes).
//!
//! The core does not assume a particular transport's cancellation primitive;
//! it only needs "has the caller asked us to stop" and "wake me when they
//! do". [`RunContext`] wraps that in a cheaply-cloneable handle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
}

/// A cloneable cancellation handle passed through `Process`, `Execute`, and
/// `Generate` calls.
#[derive(Debug, Clone, Default)]
pub struct RunContext {
    inner: Arc<Inner>,
}

impl RunContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent; wakes every `cancelled()` waiter.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolves once `cancel()` has been called; resolves immediately if it
    /// already has been.
    pub async fn cancelled(&self) {
        if self.is_cancelled() {
            return;
        }
        self.inner.notify.notified().await;
    }
}
