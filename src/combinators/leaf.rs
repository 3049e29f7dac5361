//! Leaf combinators: `Just` (always succeeds), `Raise` (always fails with a
//! statically-declared variant), and `Eventual` — the one place this crate exposes
//! the push-based [`Sink`] contract, for callers wrapping callback-style APIs that
//! cannot be expressed as an `async fn` body.

use crate::error::{Error, ErrorSet, Member};
use crate::interrupt::Interrupt;
use crate::protocol::{Signal, Sink};
use std::future::Future;
use tokio::sync::oneshot;

/// A future that resolves to `Ok(value)` immediately.
pub async fn just<T>(value: T) -> Result<T, Error<crate::error::EmptySet>> {
    Ok(value)
}

/// A future that resolves to `Err` carrying `error`, statically checked against the
/// declared error set `S`.
pub async fn raise<T, E, S, Index>(error: E) -> Result<T, Error<S>>
where
    E: crate::error::StageError,
    S: ErrorSet + Member<E, Index>,
{
    Err(Error::raised(error))
}

/// The downstream handle an [`Eventual`] callback delivers its terminal signal to.
pub struct EventualSink<T, S: ErrorSet> {
    tx: oneshot::Sender<Result<T, Error<S>>>,
}

impl<T, S: ErrorSet> Sink<T> for EventualSink<T, S> {
    type Error = S;

    fn accept(self, signal: Signal<T, S>) {
        let result = match signal {
            Signal::Start(value) => Ok(value),
            Signal::Fail(error) => Err(error),
            Signal::Stop => Err(Error::stopped()),
        };
        // A dropped receiver means the awaiting future was itself cancelled; there
        // is nobody left to observe the result, which is fine.
        let _ = self.tx.send(result);
    }
}

/// Build a leaf stage from a raw callback. `start` receives an [`EventualSink`] to
/// deliver exactly one terminal signal through, and an [`Interrupt`] it should
/// install a handler on before doing any work, so cancellation can reach it even
/// before it has produced anything.
pub fn eventual<T, S, F>(interrupt: Interrupt, start: F) -> impl Future<Output = Result<T, Error<S>>>
where
    T: Send + 'static,
    S: ErrorSet,
    F: FnOnce(EventualSink<T, S>, Interrupt) + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    let sink = EventualSink { tx };
    start(sink, interrupt);
    async move {
        match rx.await {
            Ok(result) => result,
            Err(_) => Err(Error::stopped()),
        }
    }
}
