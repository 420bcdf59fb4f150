//! Async fan-out / fan-in over a shared counter
//!
//! Every requested operation becomes one task in a tokio [`JoinSet`]. The set
//! is drained with `join_next`, so records arrive in completion order and the
//! first failure is seen as soon as it happens, whatever its position.

use super::batch::{DispatchBatch, TaskRecord};
use crate::config::DispatchConfig;
use crate::counter::{Operation, SerializedCounter};
use crate::error::{Error, Result};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Semaphore};
use tokio::task::{self, JoinSet};
use uuid::Uuid;

/// How a single task ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TaskOutcome {
    /// Operation applied
    Completed(TaskRecord),
    /// Cancellation observed before the counter was touched
    Cancelled,
}

/// Tasks of one dispatch; dropping this aborts whatever is still running
pub(crate) struct LaunchedTasks {
    pub(crate) batch_id: Uuid,
    pub(crate) started: Instant,
    tasks: JoinSet<Result<TaskOutcome>>,
    positions: HashMap<task::Id, u64>,
}

impl LaunchedTasks {
    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    fn position(&self, task: task::Id) -> u64 {
        // Every spawned task is registered in `launch`
        self.positions.get(&task).copied().unwrap_or(u64::MAX)
    }

    /// Wait for every task, handing each record to `on_record` as it completes
    ///
    /// The first failure aborts the tasks still running and is returned
    /// immediately. On success, returns how many tasks were cancelled before
    /// running.
    pub(crate) async fn join_all<F>(&mut self, mut on_record: F) -> Result<usize>
    where
        F: FnMut(TaskRecord),
    {
        let mut cancelled = 0;
        while let Some(joined) = self.tasks.join_next_with_id().await {
            let err = match joined {
                Ok((_, Ok(TaskOutcome::Completed(record)))) => {
                    on_record(record);
                    continue;
                }
                Ok((_, Ok(TaskOutcome::Cancelled))) => {
                    cancelled += 1;
                    continue;
                }
                Ok((task_id, Err(e))) => {
                    let id = self.position(task_id);
                    tracing::warn!(batch_id = %self.batch_id, task = id, error = %e, "task failed");
                    e
                }
                Err(join_err) => {
                    let id = self.position(join_err.id());
                    let reason = if join_err.is_panic() {
                        "panicked".to_string()
                    } else {
                        join_err.to_string()
                    };
                    tracing::warn!(batch_id = %self.batch_id, task = id, %reason, "task did not finish");
                    Error::TaskFailed { id, reason }
                }
            };

            let aborted = self.tasks.len();
            self.tasks.abort_all();
            if aborted > 0 {
                tracing::debug!(batch_id = %self.batch_id, aborted, "remaining tasks aborted");
            }
            return Err(err);
        }
        Ok(cancelled)
    }
}

/// Runs batches of operations concurrently against one shared counter
///
/// ```
/// use concord::{LockedCounter, Operation, SerializedCounter, TaskDispatcher};
/// use std::sync::Arc;
///
/// # #[tokio::main]
/// # async fn main() -> concord::Result<()> {
/// let dispatcher = TaskDispatcher::new(Arc::new(LockedCounter::new(0)));
/// let batch = dispatcher
///     .dispatch_all(&[Operation::Increment, Operation::Increment, Operation::Decrement])
///     .await?;
///
/// assert_eq!(batch.len(), 3);
/// assert_eq!(dispatcher.counter().get().await?, 1);
/// # Ok(())
/// # }
/// ```
pub struct TaskDispatcher<C: ?Sized> {
    counter: Arc<C>,
    config: DispatchConfig,
}

impl<C: ?Sized> Clone for TaskDispatcher<C> {
    fn clone(&self) -> Self {
        Self {
            counter: Arc::clone(&self.counter),
            config: self.config.clone(),
        }
    }
}

impl<C> TaskDispatcher<C>
where
    C: SerializedCounter + ?Sized + 'static,
{
    /// Dispatcher with the default configuration
    pub fn new(counter: Arc<C>) -> Self {
        Self::with_config(counter, DispatchConfig::default())
    }

    /// Dispatcher with an explicit configuration
    pub fn with_config(counter: Arc<C>, config: DispatchConfig) -> Self {
        Self { counter, config }
    }

    /// The shared counter
    pub fn counter(&self) -> &Arc<C> {
        &self.counter
    }

    /// Active configuration
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Apply every operation concurrently and wait for all of them
    ///
    /// One task is launched per operation and each applies its operation
    /// exactly once. The returned batch holds one record per operation in
    /// completion order. An empty slice returns an empty batch without
    /// touching the counter.
    ///
    /// # Errors
    /// - [`Error::LaunchFailure`] if no tokio runtime is available or the
    ///   batch exceeds `max_tasks`; nothing was launched.
    /// - [`Error::TaskFailed`] / [`Error::CounterClosed`] if a launched task
    ///   did not finish; the first such failure aborts the remaining tasks
    ///   at once and no batch is returned.
    pub async fn dispatch_all(&self, ops: &[Operation]) -> Result<DispatchBatch> {
        self.run(ops, None).await
    }

    /// Like [`dispatch_all`](Self::dispatch_all), but tasks that see `true` on
    /// `cancel` before reaching the counter skip their operation
    ///
    /// A task that has already started its operation always finishes it.
    /// Skipped tasks are counted in [`DispatchStats::cancelled`](super::DispatchStats)
    /// and have no record.
    pub async fn dispatch_all_cancellable(
        &self,
        ops: &[Operation],
        cancel: watch::Receiver<bool>,
    ) -> Result<DispatchBatch> {
        self.run(ops, Some(cancel)).await
    }

    async fn run(
        &self,
        ops: &[Operation],
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<DispatchBatch> {
        if ops.is_empty() {
            return Ok(DispatchBatch::empty());
        }

        let mut launched = self.launch(ops, cancel)?;
        let mut batch = DispatchBatch::with_capacity(launched.batch_id, ops.len());
        let cancelled = launched.join_all(|record| batch.push(record)).await?;

        let stats = batch.stats_mut();
        stats.launched = ops.len();
        stats.cancelled = cancelled;
        stats.elapsed = launched.started.elapsed();

        tracing::debug!(
            batch_id = %batch.batch_id,
            completed = batch.stats().completed,
            cancelled,
            elapsed_us = batch.stats().elapsed.as_micros() as u64,
            "dispatch finished"
        );
        Ok(batch)
    }

    /// Spawn one task per operation into a fresh [`JoinSet`]
    ///
    /// All checks happen before the first spawn, so a launch failure leaves the
    /// counter untouched.
    pub(crate) fn launch(
        &self,
        ops: &[Operation],
        cancel: Option<watch::Receiver<bool>>,
    ) -> Result<LaunchedTasks> {
        if ops.len() > self.config.max_tasks {
            let err = Error::launch(format!(
                "{} tasks requested, limit is {}",
                ops.len(),
                self.config.max_tasks
            ));
            tracing::warn!(error = %err, "dispatch rejected");
            return Err(err);
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            let err = Error::launch(format!("no tokio runtime: {}", e));
            tracing::warn!(error = %err, "dispatch rejected");
            err
        })?;

        let limiter = match self.config.max_in_flight {
            0 => None,
            n => Some(Arc::new(Semaphore::new(n))),
        };

        let batch_id = Uuid::new_v4();
        tracing::debug!(%batch_id, tasks = ops.len(), max_in_flight = self.config.max_in_flight, "dispatch started");

        let started = Instant::now();
        let mut tasks = JoinSet::new();
        let mut positions = HashMap::with_capacity(ops.len());
        for (index, &op) in ops.iter().enumerate() {
            let id = index as u64;
            let task = run_task(
                id,
                op,
                Arc::clone(&self.counter),
                limiter.clone(),
                cancel.clone(),
            );
            let handle = tasks.spawn_on(task, &runtime);
            positions.insert(handle.id(), id);
        }

        Ok(LaunchedTasks {
            batch_id,
            started,
            tasks,
            positions,
        })
    }
}

/// Body of a single dispatched task
async fn run_task<C>(
    id: u64,
    operation: Operation,
    counter: Arc<C>,
    limiter: Option<Arc<Semaphore>>,
    cancel: Option<watch::Receiver<bool>>,
) -> Result<TaskOutcome>
where
    C: SerializedCounter + ?Sized,
{
    let _permit = match limiter {
        Some(limiter) => Some(
            limiter
                .acquire_owned()
                .await
                .map_err(|_| Error::launch("in-flight limiter closed"))?,
        ),
        None => None,
    };

    if let Some(cancel) = &cancel {
        if *cancel.borrow() {
            tracing::trace!(task = id, %operation, "task cancelled before start");
            return Ok(TaskOutcome::Cancelled);
        }
    }

    let result = counter.apply(operation).await?;
    tracing::trace!(task = id, %operation, result, "task completed");

    Ok(TaskOutcome::Completed(TaskRecord {
        id,
        operation,
        result,
    }))
}
