//! Lock-guarded counter backend

use super::{Operation, SerializedCounter};
use crate::error::Result;
use async_trait::async_trait;
use parking_lot::Mutex;

/// Counter whose value is guarded by a `parking_lot::Mutex`
///
/// The lock is held only for the arithmetic, never across an `.await`, so the
/// async methods complete without suspending.
#[derive(Debug, Default)]
pub struct LockedCounter {
    value: Mutex<i64>,
}

impl LockedCounter {
    /// Create a counter starting at `initial`
    pub fn new(initial: i64) -> Self {
        Self {
            value: Mutex::new(initial),
        }
    }

    /// Add one and return the new value
    pub fn increment_blocking(&self) -> i64 {
        self.apply_blocking(Operation::Increment)
    }

    /// Subtract one and return the new value
    pub fn decrement_blocking(&self) -> i64 {
        self.apply_blocking(Operation::Decrement)
    }

    /// Read the current value
    pub fn get_blocking(&self) -> i64 {
        *self.value.lock()
    }

    /// Apply `op` and return the value immediately after it took effect
    pub fn apply_blocking(&self, op: Operation) -> i64 {
        self.apply_with(op, |_| ())
    }

    /// Apply `op`, then run `observe` with the new value while still holding the lock
    ///
    /// Anything `observe` records is ordered exactly as the mutations were.
    pub(crate) fn apply_with<F>(&self, op: Operation, observe: F) -> i64
    where
        F: FnOnce(i64),
    {
        let mut guard = self.value.lock();
        *guard = guard.wrapping_add(op.delta());
        let value = *guard;
        observe(value);
        value
    }
}

#[async_trait]
impl SerializedCounter for LockedCounter {
    async fn increment(&self) -> Result<i64> {
        Ok(self.increment_blocking())
    }

    async fn decrement(&self) -> Result<i64> {
        Ok(self.decrement_blocking())
    }

    async fn get(&self) -> Result<i64> {
        Ok(self.get_blocking())
    }
}
