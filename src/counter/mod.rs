//! Serialized counters
//!
//! A counter holds a single `i64` and guarantees that concurrent
//! read-modify-write operations never interleave. Two backends are provided:
//!
//! - [`ActorCounter`] - the value is owned by one tokio task; callers send it
//!   commands through a mailbox and await a reply. The mailbox order is the
//!   total order over all operations.
//! - [`LockedCounter`] - the value sits behind a `parking_lot::Mutex`; lock
//!   acquisition order is the total order.
//!
//! Neither backend exposes the stored integer directly. Every mutation goes
//! through [`SerializedCounter::increment`] or [`SerializedCounter::decrement`],
//! and each returns the value produced by that call's own position in the order.

mod actor;
mod locked;

pub use actor::ActorCounter;
pub use locked::LockedCounter;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single mutating request against a counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Add one
    Increment,
    /// Subtract one
    Decrement,
}

impl Operation {
    /// Signed change this operation applies
    pub fn delta(self) -> i64 {
        match self {
            Operation::Increment => 1,
            Operation::Decrement => -1,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Increment => write!(f, "increment"),
            Operation::Decrement => write!(f, "decrement"),
        }
    }
}

/// A counter whose mutations are applied one at a time
///
/// For `k` concurrent calls the final value is
/// `initial + (#increments - #decrements)`; no update is lost or applied twice.
#[async_trait]
pub trait SerializedCounter: Send + Sync {
    /// Add one and return the new value
    async fn increment(&self) -> Result<i64>;

    /// Subtract one and return the new value
    async fn decrement(&self) -> Result<i64>;

    /// Read the current value without mutating it
    async fn get(&self) -> Result<i64>;

    /// Apply `op` and return the value immediately after it took effect
    async fn apply(&self, op: Operation) -> Result<i64> {
        match op {
            Operation::Increment => self.increment().await,
            Operation::Decrement => self.decrement().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_delta() {
        assert_eq!(Operation::Increment.delta(), 1);
        assert_eq!(Operation::Decrement.delta(), -1);
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Increment.to_string(), "increment");
        assert_eq!(Operation::Decrement.to_string(), "decrement");
    }

    #[tokio::test]
    async fn test_apply_routes_to_operation() {
        let counter = LockedCounter::new(10);
        assert_eq!(counter.apply(Operation::Increment).await.unwrap(), 11);
        assert_eq!(counter.apply(Operation::Decrement).await.unwrap(), 10);
        assert_eq!(counter.apply(Operation::Decrement).await.unwrap(), 9);
    }
}
