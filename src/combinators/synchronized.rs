//! `Synchronized`: a FIFO mutex used as a scheduling context. Awaiting
//! [`Synchronized::lock`] resolves in the order lock attempts arrive, not in
//! whatever order the executor happens to poll them — the same guarantee the
//! distilled spec's `Synchronized` combinator makes by construction.

use parking_lot::Mutex as SyncMutex;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};

struct Inner {
    locked: AtomicBool,
    next_ticket: AtomicU64,
    serving: AtomicU64,
    waiters: SyncMutex<VecDeque<(u64, Waker)>>,
}

/// A mutex whose waiters are released in arrival order.
#[derive(Clone)]
pub struct Synchronized {
    inner: Arc<Inner>,
}

impl Default for Synchronized {
    fn default() -> Self {
        Self::new()
    }
}

impl Synchronized {
    pub fn new() -> Self {
        Synchronized {
            inner: Arc::new(Inner {
                locked: AtomicBool::new(false),
                next_ticket: AtomicU64::new(0),
                serving: AtomicU64::new(0),
                waiters: SyncMutex::new(VecDeque::new()),
            }),
        }
    }

    /// Acquire the lock, queueing behind any earlier-arrived waiter.
    pub fn lock(&self) -> Lock<'_> {
        Lock {
            sync: self,
            ticket: None,
        }
    }

    fn release(&self) {
        self.inner.serving.fetch_add(1, Ordering::AcqRel);
        let now_serving = self.inner.serving.load(Ordering::Acquire);
        let mut waiters = self.inner.waiters.lock();
        if let Some(pos) = waiters.iter().position(|(t, _)| *t == now_serving) {
            let (_, waker) = waiters.remove(pos).unwrap();
            drop(waiters);
            waker.wake();
        } else {
            self.inner.locked.store(false, Ordering::Release);
        }
    }
}

pub struct Lock<'a> {
    sync: &'a Synchronized,
    ticket: Option<u64>,
}

impl<'a> Future for Lock<'a> {
    type Output = Guard<'a>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let ticket = *self.ticket.get_or_insert_with(|| self.sync.inner.next_ticket.fetch_add(1, Ordering::AcqRel));
        let serving = self.sync.inner.serving.load(Ordering::Acquire);
        if ticket == serving
            && self
                .sync
                .inner
                .locked
                .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
        {
            return Poll::Ready(Guard { sync: self.sync });
        }
        let mut waiters = self.sync.inner.waiters.lock();
        waiters.retain(|(t, _)| *t != ticket);
        waiters.push_back((ticket, cx.waker().clone()));
        Poll::Pending
    }
}

pub struct Guard<'a> {
    sync: &'a Synchronized,
}

impl<'a> Drop for Guard<'a> {
    fn drop(&mut self) {
        self.sync.release();
    }
}
