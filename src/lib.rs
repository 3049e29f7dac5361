//! # stagecraft — a type-safe continuation-passing execution engine
//!
//! `stagecraft` builds asynchronous pipelines out of small, composable stages —
//! leaves (`Just`, `Raise`, `Eventual`), transforms (`Then`, `Map`, `FlatMap`),
//! fan-out (`Concurrent`, `ConcurrentOrdered`), and a single-threaded [`event_loop`]
//! that drives them to completion.
//!
//! ## Core Concepts
//!
//! ### Modes: single value vs. stream
//!
//! A stage produces either exactly one terminal value or a sequence of them. This
//! crate realizes that split with ordinary Rust types rather than a parallel
//! protocol: single-value stages are [`std::future::Future`]s yielding
//! `Result<T, error::Error<S>>`; stream stages are [`futures::Stream`]s yielding
//! `Result<T, error::Error<S>>` per item. See [`combinators`] for both families.
//!
//! ### Declared error sets
//!
//! Every pipeline carries, at the type level, the set of errors it has committed to
//! raising ([`error::ErrorSet`]). `Raise<E>` inserts into the set; `Catch<E>`
//! requires `E` already be a member and removes it. See [`error`].
//!
//! ### Cancellation
//!
//! [`interrupt::Interrupt`] is a one-shot, thread-safe cancellation token shared by
//! every stage in one pipeline invocation — installing a handler after it has
//! already fired runs the handler immediately.
//!
//! ### Scheduling
//!
//! [`context::Context`] names where a continuation wants to run; [`context::Scheduler`]
//! is the abstraction a stage submits work through. [`event_loop::EventLoop`] is the
//! scheduler this crate ships: a single-threaded, run-to-completion loop with timers,
//! one-shot POSIX signal polling, and a lock-free cross-thread submission queue.
//!
//! ### Termination
//!
//! [`promise::promisify`] bridges a pipeline's terminal future to a handle a caller
//! outside the pipeline can await.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stagecraft::combinators::{iterate, map, collect};
//! use stagecraft::error::EmptySet;
//!
//! async fn run() {
//!     let pipeline = iterate::<_, EmptySet, _>(vec![1, 2, 3]);
//!     let doubled = map(pipeline, |v| v * 2);
//!     let values: Vec<i32> = collect(doubled).await.unwrap();
//!     assert_eq!(values, vec![2, 4, 6]);
//! }
//! ```

pub mod combinators;
pub mod context;
pub mod error;
pub mod event_loop;
pub mod interrupt;
pub mod promise;
pub mod protocol;
pub mod task;

pub use context::{reschedule_after, Context, ContextGuard, InlineScheduler, Scheduler};
pub use error::{BuildError, Error, ErrorSet};
pub use event_loop::{Clock, EventLoop, EventLoopBuilder, EventLoopConfig, EventLoopHandle, Timer};
pub use interrupt::Interrupt;
pub use promise::{promisify, Promise};
pub use protocol::{Signal, Sink};
pub use task::Task;
