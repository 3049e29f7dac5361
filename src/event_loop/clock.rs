//! Virtual clock with pause/advance/resume, so tests can drive [`Timer`](crate::event_loop::Timer)s
//! deterministically instead of racing real wall-clock time.

use parking_lot::Mutex;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

pub(crate) type TimerId = u64;

struct PendingTimer {
    id: TimerId,
    remaining: Duration,
}

struct State {
    paused_at: Option<Instant>,
    advanced: Duration,
    /// Timers still pending while paused, so `resume` can re-arm them for their
    /// remaining delay rather than firing them all at once.
    pending: Vec<PendingTimer>,
    /// The event loop thread, if currently parked waiting on this clock (only
    /// meaningful while paused — a running real-time clock never needs waking by
    /// `advance`, since `park_timeout` already accounts for real elapsed time).
    parked: Option<std::thread::Thread>,
}

/// A clock that is either tracking real time, or paused and only advancing when
/// [`Clock::advance`] is called explicitly.
pub struct Clock {
    state: Mutex<State>,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    pub fn new() -> Self {
        Clock {
            state: Mutex::new(State {
                paused_at: None,
                advanced: Duration::ZERO,
                pending: Vec::new(),
                parked: None,
            }),
        }
    }

    pub fn now(&self) -> Instant {
        let state = self.state.lock();
        match state.paused_at {
            Some(at) => at + state.advanced,
            None => Instant::now(),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.state.lock().paused_at.is_some()
    }

    /// Freeze the clock at its current instant. Subsequent `now()` calls return this
    /// instant plus however much `advance` has moved it.
    pub fn pause(&self) {
        let mut state = self.state.lock();
        if state.paused_at.is_none() {
            state.paused_at = Some(Instant::now());
            state.advanced = Duration::ZERO;
        }
    }

    /// Move the paused clock forward by `delta`. Returns the ids of timers whose
    /// remaining delay is now due; callers are responsible for firing them. Wakes
    /// the event loop thread if it is parked waiting on this clock, since
    /// `park_timeout` cannot account for virtual-time advancement on its own.
    pub fn advance(&self, delta: Duration) -> Vec<TimerId> {
        let mut state = self.state.lock();
        state.advanced += delta;
        let advanced = state.advanced;
        let mut due = Vec::new();
        state.pending.retain(|t| {
            if t.remaining <= advanced {
                due.push(t.id);
                false
            } else {
                true
            }
        });
        if let Some(thread) = state.parked.take() {
            thread.unpark();
        }
        due
    }

    /// Record the event loop thread as parked so a later `advance`/`resume` can wake
    /// it. No-op when the clock is not paused (real-time parking uses
    /// `park_timeout`, which needs no external wake).
    pub(crate) fn register_parked(&self, thread: std::thread::Thread) {
        let mut state = self.state.lock();
        if state.paused_at.is_some() {
            state.parked = Some(thread);
        }
    }

    /// Unfreeze the clock. Every timer still pending is re-armed against real time
    /// for its remaining delay.
    pub fn resume(&self) -> Vec<(TimerId, Duration)> {
        let mut state = self.state.lock();
        let advanced = state.advanced;
        let rearmed = state
            .pending
            .drain(..)
            .map(|t| (t.id, t.remaining.saturating_sub(advanced)))
            .collect();
        state.paused_at = None;
        state.advanced = Duration::ZERO;
        if let Some(thread) = state.parked.take() {
            thread.unpark();
        }
        rearmed
    }

    pub(crate) fn register_pending(&self, id: TimerId, remaining: Duration) {
        self.state.lock().pending.push(PendingTimer { id, remaining });
    }

    pub(crate) fn unregister_pending(&self, id: TimerId) {
        self.state.lock().pending.retain(|t| t.id != id);
    }
}

#[derive(PartialEq, Eq)]
pub(crate) struct TimerEntry {
    pub(crate) deadline: Instant,
    pub(crate) id: TimerId,
}

impl Ord for TimerEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.deadline.cmp(&other.deadline).then(self.id.cmp(&other.id))
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

pub(crate) type TimerHeap = BinaryHeap<Reverse<TimerEntry>>;
