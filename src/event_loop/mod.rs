//! A single-threaded event loop: timers, one-shot POSIX signal polling, and a
//! lock-free cross-thread submission queue, driving a run-to-completion model
//! inspired by libuv's run/check-phase loop but hand-rolled for this crate's narrow
//! needs (timers, signals, cross-thread wake — no generic socket multiplexer, since
//! sockets are out of scope; see `SPEC_FULL.md` §4.5).

mod clock;
mod timer;
mod waiter;

pub use clock::Clock;
pub use timer::Timer;

use crate::context::{Context, Scheduler};
use crate::error::EventLoopError;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context as TaskContext, Poll};
use std::time::Duration;
use timer::TimerState;
use waiter::Injector;

/// Construction-time knobs for an [`EventLoop`]. The only ambient configuration this
/// crate carries — there is no on-disk config format since the engine has no
/// persisted state.
#[derive(Debug, Clone)]
pub struct EventLoopConfig {
    /// Interval at which `run_forever` logs a diagnostic (pending timers, queue
    /// depth) when tracing is enabled at debug level.
    pub diagnostic_interval: Duration,
}

impl Default for EventLoopConfig {
    fn default() -> Self {
        EventLoopConfig {
            diagnostic_interval: Duration::from_secs(30),
        }
    }
}

pub struct EventLoopBuilder {
    config: EventLoopConfig,
}

impl EventLoopBuilder {
    pub fn diagnostic_interval(mut self, interval: Duration) -> Self {
        self.config.diagnostic_interval = interval;
        self
    }

    pub fn build(self) -> EventLoop {
        EventLoop::with_config(self.config)
    }
}

pub(crate) struct Shared {
    injector: Injector,
    destructed: AtomicBool,
    parked_thread: Mutex<Option<std::thread::Thread>>,
    wake_requested: AtomicBool,
    loop_thread: Mutex<Option<std::thread::ThreadId>>,
    timers: Mutex<TimerState>,
}

/// A cheap, `Clone + Send + Sync` handle used to submit work to an [`EventLoop`] from
/// any thread. The loop itself is not `Sync` — only this handle crosses threads.
#[derive(Clone)]
pub struct EventLoopHandle {
    shared: Arc<Shared>,
}

impl EventLoopHandle {
    /// Queue `callback` to run on the loop thread and wake it if parked.
    ///
    /// # Panics
    /// Panics if the owning [`EventLoop`] has already been dropped — submitting to a
    /// destructed loop is a programming error, not a recoverable condition.
    pub fn submit(&self, callback: impl FnOnce() + Send + 'static) {
        if self.shared.destructed.load(Ordering::Acquire) {
            panic!("{}", EventLoopError::Destructed);
        }
        self.shared.injector.push(Box::new(callback));
        self.shared.wake_requested.store(true, Ordering::Release);
        if let Some(thread) = self.shared.parked_thread.lock().unwrap().as_ref() {
            thread.unpark();
        }
    }
}

impl Scheduler for EventLoopHandle {
    fn submit(&self, context: Context, callback: Box<dyn FnOnce() + Send>) {
        EventLoopHandle::submit(self, move || {
            let _guard = context.enter();
            callback();
        });
    }

    fn continuable(&self, _context: &Context) -> bool {
        self.shared
            .loop_thread
            .lock()
            .unwrap()
            .map(|id| id == std::thread::current().id())
            .unwrap_or(false)
    }
}

/// The loop itself. Not `Sync`: it must stay on the thread that calls
/// `run`/`run_forever`/`run_until`. Cross-thread submission goes through
/// [`EventLoop::handle`].
pub struct EventLoop {
    shared: Arc<Shared>,
    clock: Arc<Clock>,
    ready: VecDeque<Box<dyn FnOnce() + Send>>,
    #[allow(dead_code)]
    config: EventLoopConfig,
    signals: Vec<(i32, Arc<AtomicBool>)>,
}

impl EventLoop {
    pub fn new() -> Self {
        Self::with_config(EventLoopConfig::default())
    }

    pub fn builder() -> EventLoopBuilder {
        EventLoopBuilder {
            config: EventLoopConfig::default(),
        }
    }

    fn with_config(config: EventLoopConfig) -> Self {
        EventLoop {
            shared: Arc::new(Shared {
                injector: Injector::new(),
                destructed: AtomicBool::new(false),
                parked_thread: Mutex::new(None),
                wake_requested: AtomicBool::new(false),
                loop_thread: Mutex::new(Some(std::thread::current().id())),
                timers: Mutex::new(TimerState::new()),
            }),
            clock: Arc::new(Clock::new()),
            ready: VecDeque::new(),
            config,
            signals: Vec::new(),
        }
    }

    pub fn handle(&self) -> EventLoopHandle {
        EventLoopHandle {
            shared: self.shared.clone(),
        }
    }

    pub fn clock(&self) -> Arc<Clock> {
        self.clock.clone()
    }

    /// A [`Timer`] future that resolves after `delay` has elapsed on this loop's
    /// clock. Safe to construct and poll from any thread; it only touches the
    /// loop's shared timer state under lock.
    pub fn timer(&self, delay: Duration) -> Timer {
        Timer::new(self.clock.clone(), self.shared.clone(), delay)
    }

    /// Register a one-shot flag for `signal` (e.g. `libc::SIGINT`), polled once per
    /// loop iteration's check phase rather than delivered as a true async signal
    /// handler, matching libuv's check-handle semantics without linking libuv.
    pub fn register_signal(&mut self, signal: i32) -> Result<(), EventLoopError> {
        let flag = Arc::new(AtomicBool::new(false));
        signal_hook::flag::register(signal, flag.clone())?;
        self.signals.push((signal, flag));
        Ok(())
    }

    fn drain_injector(&mut self) {
        for cb in self.shared.injector.drain() {
            self.ready.push_back(cb);
        }
    }

    fn fire_due_timers(&self) {
        let now = self.clock.now();
        self.shared.timers.lock().unwrap().fire_due(now);
    }

    fn check_signals(&self) -> Vec<i32> {
        self.signals
            .iter()
            .filter_map(|(sig, flag)| {
                if flag.swap(false, Ordering::AcqRel) {
                    Some(*sig)
                } else {
                    None
                }
            })
            .collect()
    }

    fn next_timer_deadline(&self) -> Option<std::time::Instant> {
        self.shared.timers.lock().unwrap().peek_deadline()
    }

    fn timers_empty(&self) -> bool {
        self.shared.timers.lock().unwrap().is_empty()
    }

    fn has_work(&self) -> bool {
        !self.ready.is_empty() || !self.timers_empty() || !self.shared.injector.is_empty()
    }

    /// Run one iteration's worth of queued work (injector drain, due timers, signal
    /// check) and return. Does not block.
    #[tracing::instrument(skip(self))]
    pub fn run_once(&mut self) {
        self.drain_injector();
        for signal in self.check_signals() {
            tracing::debug!(signal, "signal observed during check phase");
        }
        self.fire_due_timers();
        while let Some(cb) = self.ready.pop_front() {
            cb();
        }
    }

    /// Drain all currently-queued and due work, then return — does not park waiting
    /// for more.
    #[tracing::instrument(skip(self))]
    pub fn run(&mut self) {
        loop {
            self.run_once();
            if !self.has_work() {
                break;
            }
        }
    }

    fn park_until_work(&self) {
        if self.clock.is_paused() {
            // Virtual time only moves when something calls `Clock::advance`, which
            // wakes us directly; real-time `park_timeout` against a deadline that
            // never arrives on its own would just stall the test.
            self.clock.register_parked(std::thread::current());
            if !self.has_work() {
                std::thread::park();
            }
            return;
        }
        if let Some(deadline) = self.next_timer_deadline() {
            let now = self.clock.now();
            if deadline > now {
                std::thread::park_timeout(deadline - now);
            }
        } else if !self.has_work() {
            std::thread::park();
        }
    }

    /// Run until `stop` has been triggered, parking the thread between iterations
    /// when there is no ready work and no timer due yet.
    #[tracing::instrument(skip(self, stop))]
    pub fn run_forever(&mut self, stop: &crate::interrupt::Interrupt) {
        *self.shared.parked_thread.lock().unwrap() = Some(std::thread::current());
        while !stop.is_triggered() {
            self.run_once();
            if stop.is_triggered() {
                break;
            }
            self.park_until_work();
        }
        *self.shared.parked_thread.lock().unwrap() = None;
    }

    /// Drive the loop until `future` resolves, returning its output.
    #[tracing::instrument(skip(self, future))]
    pub fn run_until<F: Future>(&mut self, future: F) -> F::Output {
        *self.shared.parked_thread.lock().unwrap() = Some(std::thread::current());
        let waker = futures::task::waker(Arc::new(LoopWake {
            shared: self.shared.clone(),
        }));
        let mut task_cx = TaskContext::from_waker(&waker);
        let mut future = Box::pin(future);
        let output = loop {
            self.run_once();
            self.shared.wake_requested.store(false, Ordering::Release);
            if let Poll::Ready(out) = Pin::as_mut(&mut future).poll(&mut task_cx) {
                break out;
            }
            if !self.shared.wake_requested.load(Ordering::Acquire) {
                self.park_until_work();
            }
        };
        *self.shared.parked_thread.lock().unwrap() = None;
        output
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EventLoop {
    fn drop(&mut self) {
        self.shared.destructed.store(true, Ordering::Release);
    }
}

struct LoopWake {
    shared: Arc<Shared>,
}

impl futures::task::ArcWake for LoopWake {
    fn wake_by_ref(arc_self: &Arc<Self>) {
        arc_self.shared.wake_requested.store(true, Ordering::Release);
        if let Some(thread) = arc_self.shared.parked_thread.lock().unwrap().as_ref() {
            thread.unpark();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn run_drains_queued_work_and_returns() {
        let mut loop_ = EventLoop::new();
        let handle = loop_.handle();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        handle.submit(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        loop_.run();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    #[should_panic(expected = "destructed")]
    fn submit_after_destruct_panics() {
        let handle = {
            let loop_ = EventLoop::new();
            loop_.handle()
        };
        handle.submit(|| {});
    }

    #[test]
    fn run_until_resolves_ready_future() {
        let mut loop_ = EventLoop::new();
        let out = loop_.run_until(async { 1 + 1 });
        assert_eq!(out, 2);
    }

    #[test]
    fn timer_resolves_after_delay_on_virtual_clock() {
        let mut loop_ = EventLoop::new();
        loop_.clock().pause();
        let clock = loop_.clock();
        let timer = loop_.timer(Duration::from_secs(5));
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            clock.advance(Duration::from_secs(5));
        });
        loop_.run_until(timer);
    }

    #[test]
    fn cross_thread_submit_wakes_parked_loop() {
        let mut loop_ = EventLoop::new();
        let handle = loop_.handle();
        let done = Arc::new(AtomicBool::new(false));
        let d = done.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            handle.submit(move || d.store(true, Ordering::SeqCst));
        });
        let interrupt = crate::interrupt::Interrupt::new();
        let done_check = done.clone();
        let interrupt_clone = interrupt.clone();
        std::thread::spawn(move || {
            while !done_check.load(Ordering::SeqCst) {
                std::thread::sleep(Duration::from_millis(5));
            }
            interrupt_clone.trigger();
        });
        loop_.run_forever(&interrupt);
        assert!(done.load(Ordering::SeqCst));
    }
}
