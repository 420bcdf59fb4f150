//! # Concord - Serialized Counters with Concurrent Fan-Out
//!
//! A small concurrency core: a counter whose updates never interleave, and a
//! dispatcher that runs many increment/decrement requests against it at once
//! and joins them all before reporting.
//!
//! ## Quick Start
//!
//! ```rust
//! use concord::{ActorCounter, Operation, SerializedCounter, TaskDispatcher};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> concord::Result<()> {
//! let counter = Arc::new(ActorCounter::spawn(0)?);
//! let dispatcher = TaskDispatcher::new(Arc::clone(&counter));
//!
//! let batch = dispatcher
//!     .dispatch_all(&[Operation::Increment, Operation::Increment, Operation::Decrement])
//!     .await?;
//!
//! assert_eq!(batch.len(), 3);
//! assert_eq!(counter.get().await?, 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! TaskDispatcher ── spawn N tasks ──► SerializedCounter ──► value
//!       ▲                                (actor | lock)
//!       └──────── join all, collect records in completion order
//! ```
//!
//! ### Main Components
//!
//! - [`SerializedCounter`] - async counter interface; every call gets the value
//!   from its own position in a single total order
//! - [`ActorCounter`] - value owned by one tokio task, fed through a mailbox
//! - [`LockedCounter`] - value behind a `parking_lot` mutex, also usable from
//!   plain threads
//! - [`TaskDispatcher`] - fan-out / fan-in over tokio tasks, with optional
//!   in-flight limits, cancellation and streaming
//! - [`dispatch_blocking`] - the same over a Rayon thread pool
//!
//! ## Ordering
//!
//! Only the aggregate is deterministic. For a batch with `i` increments and
//! `d` decrements starting at `v0`, the final value is always `v0 + i - d`,
//! but the order of records in a [`DispatchBatch`] depends on scheduling.
//!
//! ## Error Handling
//!
//! A dispatch either returns a complete batch or an [`Error`]. A
//! [`Error::LaunchFailure`] means nothing ran; it is never confused with an
//! empty batch.
//!
//! ## Logging
//!
//! Diagnostics are emitted through `tracing`. The library never installs a
//! subscriber.

/// Version of the Concord crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod counter;
pub mod dispatch;
pub mod error;

// Re-export main types
pub use config::{CounterConfig, DispatchConfig};
pub use counter::{ActorCounter, LockedCounter, Operation, SerializedCounter};
pub use dispatch::{
    dispatch_blocking, DispatchBatch, DispatchStats, DispatchStream, TaskDispatcher, TaskRecord,
};
pub use error::{Error, ErrorSeverity, Result};
