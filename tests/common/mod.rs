//! Shared helpers for integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use concord::{Operation, SerializedCounter, TaskRecord};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// True if some total order of `records`, applied from `initial`, reproduces
/// every record's reported result.
///
/// Each record is a step on the integer line: an increment reporting `r` moved
/// `r - 1 -> r`, a decrement reporting `r` moved `r + 1 -> r`. A valid order is
/// a walk from `initial` that uses every step exactly once.
pub fn consistent_with_total_order(initial: i64, records: &[TaskRecord]) -> bool {
    if records.is_empty() {
        return true;
    }

    let mut balance: HashMap<i64, i64> = HashMap::new();
    let mut segments: Vec<i64> = Vec::with_capacity(records.len());
    for record in records {
        let from = record.result - record.operation.delta();
        *balance.entry(from).or_insert(0) += 1;
        *balance.entry(record.result).or_insert(0) -= 1;
        segments.push(from.min(record.result));
    }

    let final_value = initial + records.iter().map(|r| r.operation.delta()).sum::<i64>();
    for (&node, &net) in &balance {
        let expected = match (node == initial, node == final_value) {
            (true, true) => 0,
            (true, false) => 1,
            (false, true) => -1,
            (false, false) => 0,
        };
        if net != expected {
            return false;
        }
    }
    if initial != final_value && !balance.contains_key(&initial) {
        return false;
    }

    // Every unit segment between the lowest and highest step must be used,
    // otherwise the steps fall into disconnected pieces
    segments.sort_unstable();
    segments.dedup();
    let contiguous = segments.windows(2).all(|w| w[1] == w[0] + 1);
    let touches_start = segments.contains(&initial) || segments.contains(&(initial - 1));
    contiguous && touches_start
}

pub fn record(id: u64, operation: Operation, result: i64) -> TaskRecord {
    TaskRecord {
        id,
        operation,
        result,
    }
}

/// Alternating decrement/increment list shaped like the tour demo's five tasks
pub fn alternating(n: usize) -> Vec<Operation> {
    (1..=n)
        .map(|i| {
            if i % 2 == 0 {
                Operation::Increment
            } else {
                Operation::Decrement
            }
        })
        .collect()
}

pub fn multi_thread_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(4)
        .enable_all()
        .build()
        .expect("failed to build test runtime")
}

/// Counter whose increments sleep for `stall` and whose decrements panic
///
/// `stalled` counts increments that reached their sleep; `dropped` counts those
/// whose future was dropped before finishing, which is what an abort does.
pub struct FaultyCounter {
    stall: Duration,
    pub applied: AtomicUsize,
    pub stalled: AtomicUsize,
    pub dropped: Arc<AtomicUsize>,
}

impl FaultyCounter {
    pub fn new(stall: Duration) -> Self {
        Self {
            stall,
            applied: AtomicUsize::new(0),
            stalled: AtomicUsize::new(0),
            dropped: Arc::new(AtomicUsize::new(0)),
        }
    }
}

struct DropCount(Arc<AtomicUsize>);

impl Drop for DropCount {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SerializedCounter for FaultyCounter {
    async fn increment(&self) -> concord::Result<i64> {
        let guard = DropCount(Arc::clone(&self.dropped));
        self.stalled.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.stall).await;
        std::mem::forget(guard);
        Ok(self.applied.fetch_add(1, Ordering::SeqCst) as i64 + 1)
    }

    async fn decrement(&self) -> concord::Result<i64> {
        panic!("decrement rejected");
    }

    async fn get(&self) -> concord::Result<i64> {
        Ok(self.applied.load(Ordering::SeqCst) as i64)
    }
}
