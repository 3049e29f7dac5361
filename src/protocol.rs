//! The five-message continuation contract (start/fail/stop for a single value; plus
//! the begin/body/ended shape for streams, which this crate realizes via
//! [`futures::Stream`] rather than a bespoke push trait — see `Signal` doc below).
//!
//! [`Sink`] is the low-level primitive [`crate::combinators::eventual::Eventual`] and the
//! promise bridge are built on. Every other combinator composes ordinary `Future`s and
//! `Stream`s and only touches `Sink` at those two edges, per the crate's design notes on
//! keeping this protocol out of the everyday public surface.

use crate::error::{Error, ErrorSet};

/// Exactly one of these is ever delivered to a [`Sink`]. Taking `self` by value in
/// [`Sink::accept`] is what makes "exactly one terminal message" a property the type
/// system enforces rather than a documented convention: once a `Sink` has accepted a
/// signal, it has been consumed and cannot accept another.
pub enum Signal<V, E: ErrorSet> {
    Start(V),
    Fail(Error<E>),
    Stop,
}

/// The downstream contract a value-producing stage fulfills.
///
/// Implementors consume `self` in every method, so calling any of them twice is a
/// compile error, not a runtime assertion.
pub trait Sink<V>: Sized {
    type Error: ErrorSet;

    fn accept(self, signal: Signal<V, Self::Error>);

    fn start(self, value: V) {
        self.accept(Signal::Start(value))
    }

    fn fail(self, error: Error<Self::Error>) {
        self.accept(Signal::Fail(error))
    }

    fn stop(self) {
        self.accept(Signal::Stop)
    }
}
