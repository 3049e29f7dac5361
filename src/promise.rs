//! Termination: bridging a pipeline's terminal future to a one-shot handle that can
//! be awaited from outside the pipeline's own context, and driving it to completion
//! on an [`EventLoop`](crate::event_loop::EventLoop).
//!
//! This is the other edge (besides `Eventual`) where the protocol becomes concrete:
//! `promisify` wraps the pipeline's `Result<T, Error<S>>` future in a
//! `tokio::sync::oneshot` channel so it can be handed to code that doesn't itself
//! want to poll a future — mirroring how a promise's `then`/terminal callback is the
//! only place the distilled protocol's `Start`/`Fail`/`Stop` messages become visible
//! to a caller outside the pipeline.

use crate::error::{Error, ErrorSet};
use std::future::Future;
use tokio::sync::oneshot;

/// A terminated pipeline's result, delivered through a one-shot channel. Dropping
/// the sending side (the pipeline future was itself cancelled) resolves the
/// promise to [`Error::stopped`].
pub struct Promise<T, S: ErrorSet> {
    rx: oneshot::Receiver<Result<T, Error<S>>>,
}

impl<T, S: ErrorSet> Future for Promise<T, S> {
    type Output = Result<T, Error<S>>;

    fn poll(
        mut self: std::pin::Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Self::Output> {
        match std::pin::Pin::new(&mut self.rx).poll(cx) {
            std::task::Poll::Ready(Ok(result)) => std::task::Poll::Ready(result),
            std::task::Poll::Ready(Err(_)) => std::task::Poll::Ready(Err(Error::stopped())),
            std::task::Poll::Pending => std::task::Poll::Pending,
        }
    }
}

/// Spawn `pipeline` onto the current Tokio runtime and return a [`Promise`] that
/// resolves once it does. The pipeline keeps running to completion even if the
/// returned promise is dropped before it resolves.
pub fn promisify<T, S, F>(pipeline: F) -> Promise<T, S>
where
    T: Send + 'static,
    S: ErrorSet,
    F: Future<Output = Result<T, Error<S>>> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let result = pipeline.await;
        let _ = tx.send(result);
    });
    Promise { rx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combinators::{just, raise};
    use crate::error::{Cons, EmptySet};

    #[derive(Debug, thiserror::Error)]
    #[error("pipeline rejected: {0}")]
    struct Rejected(String);

    #[tokio::test]
    async fn promisify_resolves_success() {
        let promise = promisify(just(42));
        assert_eq!(promise.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn promisify_resolves_failure_with_message() {
        let promise = promisify::<i32, Cons<Rejected, EmptySet>, _>(raise(Rejected(
            "bad input".to_string(),
        )));
        let error = promise.await.unwrap_err();
        let rejected = error.downcast_ref::<Rejected>().unwrap();
        assert_eq!(rejected.0, "bad input");
    }

    #[tokio::test]
    async fn promisify_resolves_stopped_if_pipeline_dropped() {
        let (tx, rx) = oneshot::channel::<Result<i32, Error<EmptySet>>>();
        drop(tx);
        let promise = Promise { rx };
        let error = promise.await.unwrap_err();
        assert!(error.is_stopped());
    }
}
