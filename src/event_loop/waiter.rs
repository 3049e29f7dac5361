//! Lock-free intrusive MPSC stack used as the event loop's cross-thread submission
//! queue: any thread may push a [`Waiter`], only the loop thread ever pops.
//!
//! A Treiber stack rather than a queue — cheap CAS-on-head push, no tail pointer to
//! keep consistent. Ordering is restored on the consumer side: the loop drains the
//! whole stack in one pop-all and reverses it so callbacks run in submission order
//! within one "check phase," matching the distilled spec's requirement that a single
//! drain behaves FIFO even though the underlying structure is LIFO.

use std::ptr;
use std::sync::atomic::{AtomicPtr, Ordering};

pub(crate) struct WaiterNode {
    callback: Option<Box<dyn FnOnce() + Send>>,
    next: *mut WaiterNode,
}

/// Lock-free MPSC injector: `push` from any thread, `drain` from the loop thread only.
pub(crate) struct Injector {
    head: AtomicPtr<WaiterNode>,
}

impl Injector {
    pub(crate) fn new() -> Self {
        Injector {
            head: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Push a callback onto the stack. Safe to call from any thread concurrently.
    pub(crate) fn push(&self, callback: Box<dyn FnOnce() + Send>) {
        let node = Box::into_raw(Box::new(WaiterNode {
            callback: Some(callback),
            next: ptr::null_mut(),
        }));
        let mut head = self.head.load(Ordering::Acquire);
        loop {
            // SAFETY: `node` was just allocated by us and not yet published; writing
            // its `next` field before the CAS publishes it is exclusive to this call.
            unsafe {
                (*node).next = head;
            }
            match self.head.compare_exchange_weak(
                head,
                node,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(observed) => head = observed,
            }
        }
    }

    /// Pop the entire stack and return its callbacks in submission (FIFO) order.
    /// Must only be called from the single consumer thread.
    pub(crate) fn drain(&self) -> Vec<Box<dyn FnOnce() + Send>> {
        let mut head = self.head.swap(ptr::null_mut(), Ordering::AcqRel);
        let mut callbacks = Vec::new();
        while !head.is_null() {
            // SAFETY: nodes were allocated via `Box::into_raw` in `push` and this is
            // the sole consumer thread; each node is visited exactly once and freed
            // here.
            let mut node = unsafe { Box::from_raw(head) };
            head = node.next;
            if let Some(cb) = node.callback.take() {
                callbacks.push(cb);
            }
        }
        callbacks.reverse();
        callbacks
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire).is_null()
    }
}

impl Drop for Injector {
    fn drop(&mut self) {
        // Free any nodes nobody drained.
        let _ = self.drain();
    }
}

// The stack is only ever exposed behind `Arc<Injector>`; `push` may race from many
// threads, `drain` is restricted to the loop thread by convention (enforced by
// `EventLoopHandle` never exposing it directly).
unsafe impl Send for Injector {}
unsafe impl Sync for Injector {}
