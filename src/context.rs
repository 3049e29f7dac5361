//! Scheduling contexts and the [`Scheduler`] abstraction.
//!
//! A [`Context`] names where a continuation wants to run — the event loop thread, a
//! synchronized region's waiter queue, or (the default) wherever the caller happens to
//! be. [`Context::current`] reads a thread-local slot, the same pattern the graph
//! engine this crate grew out of used for exposing an ambient execution context to
//! node bodies without threading it through every call.

use crate::error::{Error, ErrorSet};
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::oneshot;

/// Identifies a scheduling context. Two contexts compare equal iff they were produced
/// by the same [`Scheduler`] and carry the same opaque id.
#[derive(Clone)]
pub struct Context {
    scheduler: Arc<dyn Scheduler>,
    id: u64,
}

impl Context {
    pub fn new(scheduler: Arc<dyn Scheduler>, id: u64) -> Self {
        Context { scheduler, id }
    }

    pub fn scheduler(&self) -> &Arc<dyn Scheduler> {
        &self.scheduler
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// The ambient context for the calling thread: whatever was last installed via
    /// [`Context::enter`], or a process-wide default [`InlineScheduler`] context if
    /// nothing has been installed.
    pub fn current() -> Context {
        CURRENT.with(|c| {
            c.borrow()
                .clone()
                .unwrap_or_else(|| Context::new(Arc::new(InlineScheduler), 0))
        })
    }

    /// Install `self` as the ambient context for the calling thread until the
    /// returned guard is dropped, at which point the previous context (if any) is
    /// restored. The direct replacement for a manual switch/unswitch pair.
    pub fn enter(self) -> ContextGuard {
        let previous = CURRENT.with(|c| c.borrow_mut().replace(self));
        ContextGuard { previous }
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context").field("id", &self.id).finish()
    }
}

impl PartialEq for Context {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Arc::ptr_eq(&self.scheduler, &other.scheduler)
    }
}

thread_local! {
    static CURRENT: RefCell<Option<Context>> = const { RefCell::new(None) };
}

/// Restores the previously-ambient [`Context`] on drop.
pub struct ContextGuard {
    previous: Option<Context>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        CURRENT.with(|c| {
            *c.borrow_mut() = self.previous.take();
        });
    }
}

/// Something that can run a callback "on" a [`Context`] — inline, on an event loop
/// thread, or behind a synchronization primitive.
pub trait Scheduler: Send + Sync {
    /// Arrange for `callback` to run with `context` ambient. May run `callback`
    /// inline before returning, or may defer it.
    fn submit(&self, context: Context, callback: Box<dyn FnOnce() + Send>);

    /// Whether the calling thread could continue running `context`'s work directly,
    /// without a `submit` round-trip. Combinators like `RescheduleAfter` use this to
    /// avoid a pointless hop when already on the right context.
    fn continuable(&self, context: &Context) -> bool;
}

/// The default scheduler: every submission runs synchronously, inline, on the
/// calling thread. Any context is trivially continuable.
pub struct InlineScheduler;

impl Scheduler for InlineScheduler {
    fn submit(&self, context: Context, callback: Box<dyn FnOnce() + Send>) {
        let _guard = context.enter();
        callback();
    }

    fn continuable(&self, _context: &Context) -> bool {
        true
    }
}

/// Runs `expr` and, if the context that was ambient when polling began can no
/// longer continue directly on the thread `expr` finished on, hops the result
/// back to that captured context via its scheduler. This is how an I/O
/// completion delivered on the event loop thread returns to the user's
/// originating context.
pub async fn reschedule_after<T, S, F>(expr: F) -> Result<T, Error<S>>
where
    T: Send + 'static,
    S: ErrorSet,
    F: Future<Output = Result<T, Error<S>>> + Send + 'static,
{
    let captured = Context::current();
    let result = expr.await;
    if captured.scheduler().continuable(&captured) {
        return result;
    }

    let (tx, rx) = oneshot::channel();
    captured.scheduler().submit(
        captured.clone(),
        Box::new(move || {
            let _ = tx.send(result);
        }),
    );
    rx.await
        .expect("scheduler dropped reschedule_after callback without delivering")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_current_context_is_inline() {
        let ctx = Context::current();
        assert!(ctx.scheduler().continuable(&ctx));
    }

    #[test]
    fn enter_restores_previous_on_drop() {
        let outer = Context::current();
        {
            let inner = Context::new(Arc::new(InlineScheduler), 7);
            let _guard = inner.clone().enter();
            assert_eq!(Context::current(), inner);
        }
        assert_eq!(Context::current(), outer);
    }

    #[test]
    fn inline_scheduler_submits_synchronously() {
        use std::sync::atomic::{AtomicBool, Ordering};

        let ctx = Context::new(Arc::new(InlineScheduler), 1);
        let ran = Arc::new(AtomicBool::new(false));
        let r = ran.clone();
        ctx.scheduler()
            .submit(ctx.clone(), Box::new(move || r.store(true, Ordering::SeqCst)));
        assert!(ran.load(Ordering::SeqCst));
    }

    /// A scheduler that is never continuable: every `reschedule_after` call must
    /// bounce through `submit`. Submission runs the callback on a spawned thread,
    /// mirroring how an event loop thread hands work back across a `submit` hop.
    struct NeverContinuable;

    impl Scheduler for NeverContinuable {
        fn submit(&self, context: Context, callback: Box<dyn FnOnce() + Send>) {
            std::thread::spawn(move || {
                let _guard = context.enter();
                callback();
            });
        }

        fn continuable(&self, _context: &Context) -> bool {
            false
        }
    }

    #[tokio::test]
    async fn reschedule_after_hops_back_through_submit_when_not_continuable() {
        use crate::error::EmptySet;

        let ctx = Context::new(Arc::new(NeverContinuable), 1);
        let _guard = ctx.enter();

        let result = reschedule_after::<i32, EmptySet, _>(async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn reschedule_after_skips_submit_when_continuable() {
        use crate::error::EmptySet;

        let result = reschedule_after::<i32, EmptySet, _>(async { Ok(7) }).await;
        assert_eq!(result.unwrap(), 7);
    }
}
