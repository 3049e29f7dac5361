//! Core combinators: value-mode (`Just`, `Raise`, `Eventual`, `Then`) built on
//! [`std::future::Future`], stream-mode (`Iterate`, `Range`, `Map`, `FlatMap`,
//! `Collect`, `Loop`, `Concurrent`) built on [`futures::Stream`] — the idiomatic
//! Rust rendition of the single-value/stream `Mode` split (see `SPEC_FULL.md` §3).

pub mod concurrent;
pub mod leaf;
pub mod stream;
pub mod synchronized;
pub mod then;

pub use concurrent::{concurrent, concurrent_ordered};
pub use leaf::{eventual, just, raise, EventualSink};
pub use stream::{collect, flat_map, iterate, loop_drain, map, range};
pub use synchronized::Synchronized;
pub use then::then;
