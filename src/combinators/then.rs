//! `Then`: sequential bind for value-mode pipelines. `A.then(f)` runs `A`, and on
//! success hands its value to `f`, which produces the next stage; a failure from `A`
//! propagates without invoking `f`.

use crate::error::{Error, ErrorSet};
use std::future::Future;

/// Runs `upstream`; on `Ok(value)` runs `f(value)` and awaits its result; on
/// `Err(error)` propagates the error without calling `f`.
pub async fn then<T, U, S, F, Fut>(upstream: impl Future<Output = Result<T, Error<S>>>, f: F) -> Result<U, Error<S>>
where
    S: ErrorSet,
    F: FnOnce(T) -> Fut,
    Fut: Future<Output = Result<U, Error<S>>>,
{
    match upstream.await {
        Ok(value) => f(value).await,
        Err(error) => Err(error),
    }
}
