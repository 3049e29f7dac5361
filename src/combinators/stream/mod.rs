//! Stream-mode combinators: sources (`Iterate`, `Range`), transforms (`Map`,
//! `FlatMap`), a sink (`Collect`), and `Loop`. Each is realized as a
//! [`futures::Stream`], per the crate's Mode encoding (`SPEC_FULL.md` §3) — the
//! begin/body/ended messages of the distilled protocol are `poll_next` returning
//! `Some`/`Some`/`None`.

mod collect;

pub use collect::{collect, OrderedContainer};

use crate::error::{Error, ErrorSet};
use async_stream::stream;
use futures::{Stream, StreamExt};

/// A stream yielding every item of `items`, each wrapped `Ok`.
pub fn iterate<T, S, I>(items: I) -> impl Stream<Item = Result<T, Error<S>>>
where
    I: IntoIterator<Item = T>,
    S: ErrorSet,
{
    stream! {
        for item in items {
            yield Ok(item);
        }
    }
}

/// A stream yielding `from, from+step, …` while `|current - from| < |to - from|`.
/// Empty when `to == from`, when `step == 0`, or when `step` points away from `to`
/// (its sign disagrees with `to - from`'s).
pub fn range<S>(from: i64, to: i64, step: i64) -> impl Stream<Item = Result<i64, Error<S>>>
where
    S: ErrorSet,
{
    stream! {
        let span = to - from;
        if step != 0 && span != 0 && step.signum() == span.signum() {
            let mut current = from;
            while (current - from).abs() < span.abs() {
                yield Ok(current);
                current += step;
            }
        }
    }
}

/// Applies `f` to every successful item; a failure passes through unchanged and
/// ends the stream (the upstream `Fail` message ends the sequence, it does not
/// resume after).
pub fn map<T, U, S>(
    upstream: impl Stream<Item = Result<T, Error<S>>>,
    f: impl Fn(T) -> U,
) -> impl Stream<Item = Result<U, Error<S>>>
where
    S: ErrorSet,
{
    stream! {
        futures::pin_mut!(upstream);
        while let Some(item) = upstream.next().await {
            match item {
                Ok(value) => yield Ok(f(value)),
                Err(error) => {
                    yield Err(error);
                    return;
                }
            }
        }
    }
}

/// Applies `f` to every successful item, flattening the resulting sub-stream into
/// the output. A failure from the upstream or from any sub-stream ends the whole
/// stream.
pub fn flat_map<T, U, S, SubStream>(
    upstream: impl Stream<Item = Result<T, Error<S>>>,
    f: impl Fn(T) -> SubStream,
) -> impl Stream<Item = Result<U, Error<S>>>
where
    S: ErrorSet,
    SubStream: Stream<Item = Result<U, Error<S>>>,
{
    stream! {
        futures::pin_mut!(upstream);
        while let Some(item) = upstream.next().await {
            match item {
                Ok(value) => {
                    let sub = f(value);
                    futures::pin_mut!(sub);
                    while let Some(inner) = sub.next().await {
                        match inner {
                            Ok(v) => yield Ok(v),
                            Err(error) => {
                                yield Err(error);
                                return;
                            }
                        }
                    }
                }
                Err(error) => {
                    yield Err(error);
                    return;
                }
            }
        }
    }
}

/// Drains `upstream` to completion, requesting and discarding each element, and
/// resolves to `()` on `Ended`. A failure anywhere in `upstream` ends the drain
/// immediately and propagates.
pub async fn loop_drain<T, S>(upstream: impl Stream<Item = Result<T, Error<S>>>) -> Result<(), Error<S>>
where
    S: ErrorSet,
{
    futures::pin_mut!(upstream);
    while let Some(item) = upstream.next().await {
        item?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmptySet;
    use futures::StreamExt;

    #[tokio::test]
    async fn iterate_yields_every_item_in_order() {
        let out: Vec<_> = iterate::<_, EmptySet, _>(vec![1, 2, 3]).collect().await;
        let out: Vec<i32> = out.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(out, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn range_is_ascending_and_exclusive_of_end() {
        let out: Vec<_> = range::<EmptySet>(0, 3, 1).collect().await;
        let out: Vec<i64> = out.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(out, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn range_descends_on_negative_step() {
        let out: Vec<_> = range::<EmptySet>(5, 0, -2).collect().await;
        let out: Vec<i64> = out.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(out, vec![5, 3, 1]);
    }

    #[tokio::test]
    async fn range_empty_when_from_equals_to() {
        let out: Vec<_> = range::<EmptySet>(3, 3, 1).collect().await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn range_empty_when_step_is_zero() {
        let out: Vec<_> = range::<EmptySet>(0, 5, 0).collect().await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn range_empty_when_step_points_away_from_to() {
        let out: Vec<_> = range::<EmptySet>(0, 5, -1).collect().await;
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn map_transforms_each_item() {
        let upstream = iterate::<_, EmptySet, _>(vec![1, 2, 3]);
        let out: Vec<_> = map(upstream, |v| v * 10).collect().await;
        let out: Vec<i32> = out.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(out, vec![10, 20, 30]);
    }

    #[tokio::test]
    async fn flat_map_flattens_substreams() {
        let upstream = iterate::<_, EmptySet, _>(vec![1, 2]);
        let out: Vec<_> = flat_map(upstream, |v| iterate::<_, EmptySet, _>(vec![v, v * 100])).collect().await;
        let out: Vec<i32> = out.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(out, vec![1, 100, 2, 200]);
    }

    #[tokio::test]
    async fn loop_drain_resolves_unit_after_exhausting_stream() {
        let upstream = iterate::<_, EmptySet, _>(vec![1, 2, 3]);
        let result = loop_drain(upstream).await;
        assert_eq!(result.unwrap(), ());
    }

    #[tokio::test]
    async fn loop_drain_propagates_first_error() {
        use crate::error::Cons;

        #[derive(Debug, thiserror::Error)]
        #[error("boom")]
        struct Boom;

        let upstream = stream! {
            yield Ok::<i32, Error<Cons<Boom, EmptySet>>>(1);
            yield Err(Error::raised(Boom));
            yield Ok(2);
        };
        let result = loop_drain(upstream).await;
        assert!(result.unwrap_err().downcast_ref::<Boom>().is_some());
    }
}
