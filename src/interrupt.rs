//! One-shot cancellation token, triggered at most once, observed by any stage that
//! installs a handler.
//!
//! Handlers are invoked in LIFO order — the most recently installed handler (usually
//! the innermost/most-downstream stage) runs first, so a handler can assume anything
//! installed after it has already torn down. Installing a handler after the interrupt
//! has already fired invokes it inline, synchronously, before `install` returns.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type Handler = Box<dyn FnOnce() + Send>;

struct Inner {
    triggered: AtomicBool,
    handlers: Mutex<Vec<Handler>>,
}

/// A cancellation token shared by every stage in one pipeline invocation.
#[derive(Clone)]
pub struct Interrupt {
    inner: Arc<Inner>,
}

impl Default for Interrupt {
    fn default() -> Self {
        Self::new()
    }
}

impl Interrupt {
    pub fn new() -> Self {
        Interrupt {
            inner: Arc::new(Inner {
                triggered: AtomicBool::new(false),
                handlers: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::Acquire)
    }

    /// Install a handler to run when this interrupt fires. If it has already fired,
    /// the handler runs immediately (inline, on the caller's stack) and `false` is
    /// returned; otherwise the handler is queued and `true` is returned.
    pub fn install(&self, handler: impl FnOnce() + Send + 'static) -> bool {
        if self.inner.triggered.load(Ordering::Acquire) {
            handler();
            return false;
        }
        let mut handlers = self.inner.handlers.lock();
        if self.inner.triggered.load(Ordering::Acquire) {
            drop(handlers);
            handler();
            return false;
        }
        handlers.push(Box::new(handler));
        true
    }

    /// Fire the interrupt. Idempotent: only the first call invokes handlers.
    /// Handlers run with no lock held, in LIFO (most-recently-installed-first) order.
    #[tracing::instrument(skip(self))]
    pub fn trigger(&self) {
        if self.inner.triggered.swap(true, Ordering::AcqRel) {
            return;
        }
        let handlers = std::mem::take(&mut *self.inner.handlers.lock());
        for handler in handlers.into_iter().rev() {
            handler();
        }
    }
}
