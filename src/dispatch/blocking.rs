//! Thread-parallel dispatch
//!
//! Uses a Rayon pool so operations run on real OS threads instead of tokio
//! tasks. Only the lock-guarded backend is usable here, since it needs no
//! runtime to make progress.

use super::batch::{DispatchBatch, TaskRecord};
use crate::config::DispatchConfig;
use crate::counter::{LockedCounter, Operation};
use crate::error::{Error, Result};
use parking_lot::Mutex;
use rayon::prelude::*;
use std::time::Instant;
use uuid::Uuid;

/// Apply every operation on a Rayon pool and wait for all of them
///
/// The pool has `min(config.max_parallelism, ops.len())` threads. Each record
/// is captured inside the counter's critical section, so the returned order is
/// exactly the order in which the operations took effect.
///
/// # Errors
/// [`Error::LaunchFailure`] if the batch exceeds `config.max_tasks` or the
/// pool cannot be built; the counter is untouched in both cases.
///
/// # Example
/// ```
/// use concord::{dispatch_blocking, DispatchConfig, LockedCounter, Operation};
///
/// let counter = LockedCounter::new(0);
/// let batch = dispatch_blocking(&counter, &[Operation::Increment; 4], &DispatchConfig::default())?;
/// assert_eq!(batch.results(), vec![1, 2, 3, 4]);
/// # Ok::<(), concord::Error>(())
/// ```
pub fn dispatch_blocking(
    counter: &LockedCounter,
    ops: &[Operation],
    config: &DispatchConfig,
) -> Result<DispatchBatch> {
    // Empty array fast path
    if ops.is_empty() {
        return Ok(DispatchBatch::empty());
    }

    if ops.len() > config.max_tasks {
        return Err(Error::launch(format!(
            "{} tasks requested, limit is {}",
            ops.len(),
            config.max_tasks
        )));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.max_parallelism.max(1).min(ops.len()))
        .build()
        .map_err(|e| Error::launch(format!("failed to create thread pool: {}", e)))?;

    let batch_id = Uuid::new_v4();
    tracing::debug!(%batch_id, tasks = ops.len(), threads = pool.current_num_threads(), "blocking dispatch started");

    let started = Instant::now();
    let records = Mutex::new(Vec::with_capacity(ops.len()));

    pool.install(|| {
        ops.par_iter().enumerate().for_each(|(index, &operation)| {
            counter.apply_with(operation, |result| {
                records.lock().push(TaskRecord {
                    id: index as u64,
                    operation,
                    result,
                });
            });
        });
    });

    let mut batch = DispatchBatch::with_capacity(batch_id, ops.len());
    for record in records.into_inner() {
        batch.push(record);
    }

    let stats = batch.stats_mut();
    stats.launched = ops.len();
    stats.elapsed = started.elapsed();

    tracing::debug!(%batch_id, completed = batch.len(), "blocking dispatch finished");
    Ok(batch)
}
