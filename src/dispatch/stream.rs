//! Completion-order streaming of task records
//!
//! [`TaskDispatcher::dispatch_stream`] launches the same tasks as
//! `dispatch_all` but hands records to the caller as each task finishes,
//! instead of after the join.

use super::batch::TaskRecord;
use super::dispatcher::TaskDispatcher;
use crate::counter::{Operation, SerializedCounter};
use crate::error::{Error, Result};
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Receiver side of a streaming dispatch
///
/// Yields one record per completed task, then ends. If any task failed, the
/// final item is that error.
#[derive(Debug)]
pub struct DispatchStream {
    batch_id: Uuid,
    records: mpsc::UnboundedReceiver<TaskRecord>,
    outcome: Option<oneshot::Receiver<Result<usize>>>,
}

impl DispatchStream {
    fn finished(batch_id: Uuid) -> Self {
        let (records_tx, records) = mpsc::unbounded_channel();
        drop(records_tx);
        let (tx, rx) = oneshot::channel();
        let _ = tx.send(Ok(0));
        Self {
            batch_id,
            records,
            outcome: Some(rx),
        }
    }

    /// Identifier of the underlying dispatch
    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    /// Next completed record, or the dispatch error, or `None` when done
    pub async fn next(&mut self) -> Option<Result<TaskRecord>> {
        if let Some(record) = self.records.recv().await {
            return Some(Ok(record));
        }

        let outcome = self.outcome.take()?;
        match outcome.await {
            Ok(Ok(_)) => None,
            Ok(Err(e)) => Some(Err(e)),
            Err(_) => Some(Err(Error::DispatchInterrupted {
                reason: "dispatch supervisor stopped before reporting".to_string(),
            })),
        }
    }

    /// Drain the stream into a vector, failing on the first error
    pub async fn collect(mut self) -> Result<Vec<TaskRecord>> {
        let mut out = Vec::new();
        while let Some(item) = self.next().await {
            out.push(item?);
        }
        Ok(out)
    }
}

impl<C> TaskDispatcher<C>
where
    C: SerializedCounter + ?Sized + 'static,
{
    /// Launch every operation and stream records as tasks complete
    ///
    /// Must be called inside a tokio runtime. Launch checks are the same as
    /// [`dispatch_all`](Self::dispatch_all) and fail before anything runs.
    pub fn dispatch_stream(&self, ops: &[Operation]) -> Result<DispatchStream> {
        if ops.is_empty() {
            return Ok(DispatchStream::finished(Uuid::new_v4()));
        }

        let mut launched = self.launch(ops, None)?;
        let batch_id = launched.batch_id;
        let (records_tx, records) = mpsc::unbounded_channel();
        let (outcome_tx, outcome_rx) = oneshot::channel();

        tokio::spawn(async move {
            let tasks = launched.len();
            // Receiver only goes away when the stream itself was dropped
            let outcome = launched
                .join_all(|record| {
                    let _ = records_tx.send(record);
                })
                .await;
            drop(records_tx);
            tracing::debug!(%batch_id, tasks, ok = outcome.is_ok(), "streamed dispatch joined");
            let _ = outcome_tx.send(outcome);
        });

        Ok(DispatchStream {
            batch_id,
            records,
            outcome: Some(outcome_rx),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counter::{ActorCounter, LockedCounter};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_empty_stream_ends_immediately() {
        let dispatcher = TaskDispatcher::new(Arc::new(LockedCounter::new(0)));
        let mut stream = dispatcher.dispatch_stream(&[]).unwrap();
        assert!(stream.next().await.is_none());
        assert!(stream.next().await.is_none());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stream_yields_every_record() {
        let dispatcher = TaskDispatcher::new(Arc::new(ActorCounter::spawn(0).unwrap()));
        let ops = [Operation::Increment; 20];

        let records = dispatcher.dispatch_stream(&ops).unwrap().collect().await.unwrap();

        let mut results: Vec<i64> = records.iter().map(|r| r.result).collect();
        results.sort_unstable();
        assert_eq!(results, (1..=20).collect::<Vec<i64>>());
        assert_eq!(dispatcher.counter().get().await.unwrap(), 20);
    }

    #[tokio::test]
    async fn test_lost_supervisor_is_not_a_task_failure() {
        let (records_tx, records) = mpsc::unbounded_channel();
        drop(records_tx);
        let (outcome_tx, outcome_rx) = oneshot::channel::<Result<usize>>();
        drop(outcome_tx);

        let mut stream = DispatchStream {
            batch_id: Uuid::new_v4(),
            records,
            outcome: Some(outcome_rx),
        };

        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, Error::DispatchInterrupted { .. }));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_stream_over_limit_rejected() {
        let config = crate::DispatchConfig {
            max_tasks: 1,
            ..Default::default()
        };
        let dispatcher = TaskDispatcher::with_config(Arc::new(LockedCounter::new(0)), config);
        let err = dispatcher
            .dispatch_stream(&[Operation::Decrement, Operation::Decrement])
            .unwrap_err();
        assert!(err.is_launch_failure());
    }
}
