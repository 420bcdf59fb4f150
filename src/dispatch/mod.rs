//! Concurrent dispatch of counter operations
//!
//! Provides fan-out / fan-in over a shared [`SerializedCounter`](crate::SerializedCounter):
//! async tasks via [`TaskDispatcher`], streamed records via [`DispatchStream`],
//! and OS-thread parallelism via [`dispatch_blocking`].

mod batch;
mod blocking;
mod dispatcher;
mod stream;

pub use batch::{DispatchBatch, DispatchStats, TaskRecord};
pub use blocking::dispatch_blocking;
pub use dispatcher::TaskDispatcher;
pub use stream::DispatchStream;
