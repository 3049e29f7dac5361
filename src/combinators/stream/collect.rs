//! `Collect`: drains a stream into a container. Restricted, via a sealed marker
//! trait, to containers whose iteration order is well-defined — an unordered
//! container (`HashSet`, `HashMap`) would silently discard the stream's ordering
//! guarantee, so it is rejected at compile time rather than accepted and surprising
//! someone later (distilled spec Open Question, resolved in `DESIGN.md`).

use crate::error::{Error, ErrorSet};
use futures::{Stream, StreamExt};
use std::collections::{BTreeSet, VecDeque};

mod sealed {
    pub trait Sealed {}
}

/// Marker for containers `Collect` is allowed to target: anything whose iteration
/// order is determined by insertion or a total order on the element, never by hash
/// bucket layout.
pub trait OrderedContainer: sealed::Sealed + Extend<Self::Item> + Default {
    type Item;
}

impl<T> sealed::Sealed for Vec<T> {}
impl<T> OrderedContainer for Vec<T> {
    type Item = T;
}

impl<T> sealed::Sealed for VecDeque<T> {}
impl<T> OrderedContainer for VecDeque<T> {
    type Item = T;
}

impl<T: Ord> sealed::Sealed for BTreeSet<T> {}
impl<T: Ord> OrderedContainer for BTreeSet<T> {
    type Item = T;
}

/// Drains `upstream` into `C`, stopping at the first `Err`.
pub async fn collect<C, S>(upstream: impl Stream<Item = Result<C::Item, Error<S>>>) -> Result<C, Error<S>>
where
    C: OrderedContainer,
    S: ErrorSet,
{
    futures::pin_mut!(upstream);
    let mut out = C::default();
    while let Some(item) = upstream.next().await {
        out.extend(std::iter::once(item?));
    }
    Ok(out)
}
