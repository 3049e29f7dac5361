//! Error model: a type-erased runtime failure carried alongside a compile-time
//! set of the error variants a pipeline has committed to raising.
//!
//! A pipeline's error set is a zero-sized cons-list (`EmptySet`, `Cons<Head, Tail>`).
//! `Raise<E>` inserts `E`; `Catch<E>` requires `E` to already be a [`Member`] and
//! removes it. The runtime payload is always the same [`Failure`] regardless of the
//! phantom set; widening into a wider/narrower set is a free reinterpretation, never
//! a conversion, since the set only exists to make the borrow checker reject
//! combinators that try to `Catch` an error they were never told about.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;

/// Anything a stage can raise: `std::error::Error` plus the auto-traits needed to
/// cross thread boundaries inside the event loop.
///
/// `as_any` is the object-safe escape hatch `downcast_ref` needs: `Any` is not a
/// supertrait of `Error`, so a `&dyn Error` alone cannot be downcast — this method
/// hands back a view that can.
pub trait StageError: std::error::Error + Send + Sync + 'static {
    fn as_any(&self) -> &dyn Any;
}

impl<T> StageError for T
where
    T: std::error::Error + Send + Sync + 'static,
{
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// The distinguished "stopped" condition. Not a [`StageError`] variant a pipeline
/// raises itself — it is the sentinel delivered when an [`crate::interrupt::Interrupt`]
/// fires, and it is never a member of any pipeline's declared error set.
#[derive(Debug, Clone, Copy, Default)]
pub struct Stopped;

impl fmt::Display for Stopped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("stopped")
    }
}

impl std::error::Error for Stopped {}

/// Type-erased runtime failure payload.
pub(crate) enum Failure {
    Raised(Box<dyn StageError>),
    Stopped,
}

impl Failure {
    fn raised<E: StageError>(e: E) -> Self {
        Failure::Raised(Box::new(e))
    }
}

impl fmt::Debug for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Failure::Raised(e) => write!(f, "Raised({e})"),
            Failure::Stopped => f.write_str("Stopped"),
        }
    }
}

/// Marker for the empty error set. A pipeline whose error set is `EmptySet` cannot
/// construct an [`Error<EmptySet>`] carrying a raised variant — only [`Error::stopped`]
/// is callable, so `Fail` is statically unreachable for such a pipeline.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptySet;

/// Marker for an error set with `Head` as a member and `Tail` the rest.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cons<Head, Tail>(PhantomData<(Head, Tail)>);

/// Sealed marker trait implemented by `EmptySet` and every `Cons<H, T>` where `T: ErrorSet`.
pub trait ErrorSet: Send + Sync + 'static {}
impl ErrorSet for EmptySet {}
impl<H: StageError, T: ErrorSet> ErrorSet for Cons<H, T> {}

/// Position marker: `E` is the head of the list.
pub struct Here;
/// Position marker: `E` is somewhere in `Tail`, at `Index`.
pub struct There<Index>(PhantomData<Index>);

/// `E` is a member of `Self` at compile-time-resolved `Index`.
pub trait Member<E, Index>: ErrorSet {}

impl<E: StageError, T: ErrorSet> Member<E, Here> for Cons<E, T> {}
impl<E, H, T, I> Member<E, There<I>> for Cons<H, T>
where
    T: Member<E, I>,
{
}

/// Adds `E` to the set, yielding `Cons<E, Self>`. Used by `Raise<E>`.
pub trait Insert<E> {
    type Output: ErrorSet;
}

impl<E: StageError, S: ErrorSet> Insert<E> for S {
    type Output = Cons<E, S>;
}

/// Removes `E` (found at `Index`) from the set. Used by `Catch<E>`.
pub trait Remove<E, Index> {
    type Output: ErrorSet;
}

impl<E: StageError, T: ErrorSet> Remove<E, Here> for Cons<E, T> {
    type Output = T;
}

impl<E, H: StageError, T, I> Remove<E, There<I>> for Cons<H, T>
where
    T: Remove<E, I>,
{
    type Output = Cons<H, <T as Remove<E, I>>::Output>;
}

/// A failure carried downstream, tagged at compile time with the error set its
/// producer declared. Construction of a raised variant requires `S: Member<E, _>`;
/// [`Error::stopped`] is always callable regardless of `S`.
pub struct Error<S: ErrorSet> {
    inner: Failure,
    _set: PhantomData<S>,
}

impl<S: ErrorSet> Error<S> {
    pub fn raised<E, Index>(e: E) -> Self
    where
        E: StageError,
        S: Member<E, Index>,
    {
        Error {
            inner: Failure::raised(e),
            _set: PhantomData,
        }
    }

    pub fn stopped() -> Self {
        Error {
            inner: Failure::Stopped,
            _set: PhantomData,
        }
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.inner, Failure::Stopped)
    }

    /// Downcast to a concrete raised variant. Available regardless of `S` since the
    /// runtime payload carries no set information — only construction is gated.
    pub fn downcast_ref<E: StageError>(&self) -> Option<&E> {
        match &self.inner {
            Failure::Raised(e) => e.as_any().downcast_ref::<E>(),
            Failure::Stopped => None,
        }
    }

    /// Reinterpret this failure under a different (usually wider) error set. The
    /// underlying payload is untouched; only the phantom tag changes. Crate-internal:
    /// only a stage forwarding a failure it did not itself construct should call this.
    pub(crate) fn widen<S2: ErrorSet>(self) -> Error<S2> {
        Error {
            inner: self.inner,
            _set: PhantomData,
        }
    }
}

impl<S: ErrorSet> fmt::Debug for Error<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error").field("inner", &self.inner).finish()
    }
}

impl<S: ErrorSet> fmt::Display for Error<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Failure::Raised(e) => write!(f, "{e}"),
            Failure::Stopped => f.write_str("stopped"),
        }
    }
}

impl<S: ErrorSet> std::error::Error for Error<S> {}

/// Errors raised while constructing a pipeline (type-level checks live at the
/// trait-bound level and never reach this type; this covers the handful of
/// fallible build-time operations, e.g. an empty `Concurrent` fan-out width).
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid combinator configuration: {0}")]
    InvalidConfiguration(String),
}

/// Errors surfaced by the event loop itself, as opposed to pipeline failures flowing
/// through it.
#[derive(Debug, thiserror::Error)]
pub enum EventLoopError {
    #[error("submit() called after the event loop was torn down")]
    Destructed,
    #[error("signal registration failed: {0}")]
    Signal(#[from] std::io::Error),
}
