//! [`Timer`]: a future resolving once the owning [`EventLoop`](super::EventLoop)'s
//! [`Clock`](super::Clock) reaches a deadline. Registers itself with the loop's
//! shared timer heap on first poll and deregisters on drop if cancelled early.

use super::clock::{Clock, TimerEntry, TimerId};
use super::Shared;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll, Waker};
use std::time::Duration;

pub(crate) struct TimerState {
    pub(crate) heap: super::clock::TimerHeap,
    wakers: HashMap<TimerId, Waker>,
    fired: std::collections::HashSet<TimerId>,
    next_id: AtomicU64,
}

impl TimerState {
    pub(crate) fn new() -> Self {
        TimerState {
            heap: super::clock::TimerHeap::new(),
            wakers: HashMap::new(),
            fired: std::collections::HashSet::new(),
            next_id: AtomicU64::new(0),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub(crate) fn peek_deadline(&self) -> Option<std::time::Instant> {
        self.heap.peek().map(|Reverse(e)| e.deadline)
    }

    /// Pop every timer whose deadline has passed and wake its future.
    pub(crate) fn fire_due(&mut self, now: std::time::Instant) {
        while let Some(Reverse(entry)) = self.heap.peek() {
            if entry.deadline > now {
                break;
            }
            let Reverse(entry) = self.heap.pop().unwrap();
            self.fired.insert(entry.id);
            if let Some(waker) = self.wakers.remove(&entry.id) {
                waker.wake();
            }
        }
    }
}

/// A future that resolves once `delay` has elapsed on the owning loop's [`Clock`].
pub struct Timer {
    clock: Arc<Clock>,
    shared: Arc<Shared>,
    delay: Duration,
    id: Option<TimerId>,
}

impl Timer {
    pub(crate) fn new(clock: Arc<Clock>, shared: Arc<Shared>, delay: Duration) -> Self {
        Timer {
            clock,
            shared,
            delay,
            id: None,
        }
    }
}

impl Future for Timer {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let this = self.get_mut();
        let mut state = this.shared.timers.lock().unwrap();
        if let Some(id) = this.id {
            if state.fired.remove(&id) {
                return Poll::Ready(());
            }
            state.wakers.insert(id, cx.waker().clone());
            return Poll::Pending;
        }
        let id = state.next_id.fetch_add(1, Ordering::Relaxed);
        let deadline = this.clock.now() + this.delay;
        if this.clock.is_paused() {
            this.clock.register_pending(id, this.delay);
        }
        state.heap.push(Reverse(TimerEntry { deadline, id }));
        state.wakers.insert(id, cx.waker().clone());
        this.id = Some(id);
        Poll::Pending
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        if let Some(id) = self.id {
            let mut state = self.shared.timers.lock().unwrap();
            state.heap.retain(|Reverse(e)| e.id != id);
            state.wakers.remove(&id);
            state.fired.remove(&id);
            self.clock.unregister_pending(id);
        }
    }
}
