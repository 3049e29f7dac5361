//! Type-erased pipeline handle, used where a combinator must hold a heterogeneous
//! collection of built pipelines (e.g. one per `Concurrent` fan-out item) and static
//! monomorphization would blow up either compile time or the type signature.

use crate::error::{Error, ErrorSet};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A boxed, type-erased value-mode pipeline. The one sanctioned heap allocation
/// point for the otherwise allocation-light combinator chain — used only where
/// erasure is structurally required, not as a general-purpose convenience.
pub struct Task<T, S: ErrorSet> {
    inner: Pin<Box<dyn Future<Output = Result<T, Error<S>>> + Send>>,
}

impl<T, S: ErrorSet> Task<T, S> {
    pub fn new(future: impl Future<Output = Result<T, Error<S>>> + Send + 'static) -> Self {
        Task {
            inner: Box::pin(future),
        }
    }
}

impl<T, S: ErrorSet> Future for Task<T, S> {
    type Output = Result<T, Error<S>>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}
