//! Results of a dispatch

use crate::counter::Operation;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

/// Outcome of one launched task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRecord {
    /// Position of the operation in the submitted sequence
    pub id: u64,
    /// Operation the task applied
    pub operation: Operation,
    /// Counter value immediately after the operation took effect
    pub result: i64,
}

/// Aggregate counts for a dispatch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchStats {
    /// Tasks spawned
    pub launched: usize,
    /// Tasks that applied their operation
    pub completed: usize,
    /// Tasks that observed cancellation before touching the counter
    pub cancelled: usize,
    /// Completed increments
    pub increments: usize,
    /// Completed decrements
    pub decrements: usize,
    /// Wall time from first launch to final join
    pub elapsed: Duration,
}

/// Records of one dispatch, in completion order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchBatch {
    /// Identifier used to correlate log lines for this dispatch
    pub batch_id: Uuid,
    records: Vec<TaskRecord>,
    stats: DispatchStats,
}

impl DispatchBatch {
    /// An empty batch
    pub fn empty() -> Self {
        Self::new(Uuid::new_v4())
    }

    pub(crate) fn new(batch_id: Uuid) -> Self {
        Self {
            batch_id,
            records: Vec::new(),
            stats: DispatchStats::default(),
        }
    }

    pub(crate) fn with_capacity(batch_id: Uuid, capacity: usize) -> Self {
        Self {
            batch_id,
            records: Vec::with_capacity(capacity),
            stats: DispatchStats::default(),
        }
    }

    pub(crate) fn push(&mut self, record: TaskRecord) {
        match record.operation {
            Operation::Increment => self.stats.increments += 1,
            Operation::Decrement => self.stats.decrements += 1,
        }
        self.stats.completed += 1;
        self.records.push(record);
    }

    pub(crate) fn stats_mut(&mut self) -> &mut DispatchStats {
        &mut self.stats
    }

    /// Post-operation values in the order tasks completed
    pub fn results(&self) -> Vec<i64> {
        self.records.iter().map(|r| r.result).collect()
    }

    /// Task records in the order tasks completed
    pub fn records(&self) -> &[TaskRecord] {
        &self.records
    }

    /// Consume the batch, keeping only its records
    pub fn into_records(self) -> Vec<TaskRecord> {
        self.records
    }

    /// Dispatch statistics
    pub fn stats(&self) -> &DispatchStats {
        &self.stats
    }

    /// Number of completed tasks
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no task completed
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Net change the completed tasks applied to the counter
    pub fn net_delta(&self) -> i64 {
        self.records.iter().map(|r| r.operation.delta()).sum()
    }
}
