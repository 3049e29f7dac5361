//! `Concurrent`/`ConcurrentOrdered`: fan out over an upstream stream, running one
//! fiber per item. The first failure — from the upstream or from any fiber — fires
//! the shared [`Interrupt`], which every fiber observed and every not-yet-started
//! fiber will observe before doing any work; remaining fibers are drained (not
//! polled further for new output) before the stream ends.
//!
//! `Concurrent` re-merges completions in whatever order they finish
//! ([`futures::stream::FuturesUnordered`]); `ConcurrentOrdered` re-merges in the
//! order items arrived from upstream ([`futures::stream::FuturesOrdered`]).

use crate::error::{Error, ErrorSet};
use crate::interrupt::Interrupt;
use async_stream::stream;
use futures::stream::{FuturesOrdered, FuturesUnordered};
use futures::{Stream, StreamExt};
use std::future::Future;
use std::pin::Pin;

type BoxedFiber<U, S> = Pin<Box<dyn Future<Output = Result<U, Error<S>>> + Send>>;

/// Fan out over `upstream`, running `f(item, fiber_interrupt)` concurrently per
/// item and yielding results as fibers complete (not necessarily in arrival order).
pub fn concurrent<T, U, S, F, Fut>(
    upstream: impl Stream<Item = Result<T, Error<S>>> + Send + 'static,
    interrupt: Interrupt,
    f: F,
) -> impl Stream<Item = Result<U, Error<S>>>
where
    T: Send + 'static,
    U: Send + 'static,
    S: ErrorSet,
    F: Fn(T, Interrupt) -> Fut + Send + 'static,
    Fut: Future<Output = Result<U, Error<S>>> + Send + 'static,
{
    stream! {
        futures::pin_mut!(upstream);
        let mut fibers: FuturesUnordered<BoxedFiber<U, S>> = FuturesUnordered::new();
        let mut upstream_done = false;
        let mut errored = false;

        loop {
            if fibers.is_empty() && upstream_done {
                break;
            }
            futures::select_biased! {
                item = upstream.next() => {
                    match item {
                        Some(Ok(value)) if !interrupt.is_triggered() => {
                            fibers.push(Box::pin(f(value, interrupt.clone())));
                        }
                        Some(Ok(_)) => {}
                        Some(Err(error)) => {
                            upstream_done = true;
                            if !errored {
                                errored = true;
                                interrupt.trigger();
                                yield Err(error);
                            }
                        }
                        None => upstream_done = true,
                    }
                }
                result = fibers.select_next_some() => {
                    match result {
                        Ok(value) if !errored => yield Ok(value),
                        Ok(_) => {}
                        Err(error) => {
                            if !errored {
                                errored = true;
                                interrupt.trigger();
                                yield Err(error);
                            }
                        }
                    }
                }
                complete => break,
            }
        }
    }
}

/// Like [`concurrent`], but results are re-merged in the order items arrived from
/// upstream rather than completion order.
pub fn concurrent_ordered<T, U, S, F, Fut>(
    upstream: impl Stream<Item = Result<T, Error<S>>> + Send + 'static,
    interrupt: Interrupt,
    f: F,
) -> impl Stream<Item = Result<U, Error<S>>>
where
    T: Send + 'static,
    U: Send + 'static,
    S: ErrorSet,
    F: Fn(T, Interrupt) -> Fut + Send + 'static,
    Fut: Future<Output = Result<U, Error<S>>> + Send + 'static,
{
    stream! {
        futures::pin_mut!(upstream);
        let mut fibers: FuturesOrdered<BoxedFiber<U, S>> = FuturesOrdered::new();
        let mut upstream_done = false;
        let mut errored = false;

        loop {
            if fibers.is_empty() && upstream_done {
                break;
            }
            futures::select_biased! {
                item = upstream.next() => {
                    match item {
                        Some(Ok(value)) if !interrupt.is_triggered() => {
                            fibers.push_back(Box::pin(f(value, interrupt.clone())));
                        }
                        Some(Ok(_)) => {}
                        Some(Err(error)) => {
                            upstream_done = true;
                            if !errored {
                                errored = true;
                                interrupt.trigger();
                                yield Err(error);
                            }
                        }
                        None => upstream_done = true,
                    }
                }
                result = fibers.select_next_some() => {
                    match result {
                        Ok(value) if !errored => yield Ok(value),
                        Ok(_) => {}
                        Err(error) => {
                            if !errored {
                                errored = true;
                                interrupt.trigger();
                                yield Err(error);
                            }
                        }
                    }
                }
                complete => break,
            }
        }
    }
}
