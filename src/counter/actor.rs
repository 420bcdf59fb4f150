//! Mailbox-serialized counter backend
//!
//! The value lives inside a single owner task. Handles push commands into a
//! bounded `mpsc` mailbox and wait on a `oneshot` reply, so the owner applies
//! commands strictly in mailbox order. Once a command is in the mailbox it is
//! applied even if the caller stops waiting for the reply.

use super::{Operation, SerializedCounter};
use crate::config::CounterConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};

/// Commands accepted by the owner task
#[derive(Debug)]
enum CounterCommand {
    /// Apply an operation and reply with the new value
    Apply {
        op: Operation,
        reply_to: oneshot::Sender<i64>,
    },
    /// Reply with the current value
    Get { reply_to: oneshot::Sender<i64> },
}

/// Handle to a counter owned by a dedicated tokio task
///
/// Cloning the handle is cheap; all clones talk to the same owner. The owner
/// task exits when the last handle is dropped.
#[derive(Debug, Clone)]
pub struct ActorCounter {
    mailbox: mpsc::Sender<CounterCommand>,
}

impl ActorCounter {
    /// Spawn an owner task with the given starting value
    ///
    /// Must be called from within a tokio runtime; otherwise returns
    /// [`Error::LaunchFailure`].
    pub fn spawn(initial: i64) -> Result<Self> {
        Self::spawn_with(CounterConfig {
            initial,
            ..Default::default()
        })
    }

    /// Spawn an owner task from a full [`CounterConfig`]
    pub fn spawn_with(config: CounterConfig) -> Result<Self> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| Error::launch(format!("counter owner task: {}", e)))?;

        let (tx, rx) = mpsc::channel(config.mailbox_capacity.max(1));
        runtime.spawn(run_owner(rx, config.initial));

        tracing::debug!(
            initial = config.initial,
            mailbox_capacity = config.mailbox_capacity,
            "counter owner task started"
        );
        Ok(Self { mailbox: tx })
    }

    /// True once the owner task has stopped accepting commands
    pub fn is_closed(&self) -> bool {
        self.mailbox.is_closed()
    }

    async fn request<F>(&self, command: F) -> Result<i64>
    where
        F: FnOnce(oneshot::Sender<i64>) -> CounterCommand,
    {
        let (tx, rx) = oneshot::channel();
        self.mailbox
            .send(command(tx))
            .await
            .map_err(|_| Error::CounterClosed)?;
        rx.await.map_err(|_| Error::CounterClosed)
    }
}

/// Owner loop: the only code that ever touches `value`
async fn run_owner(mut mailbox: mpsc::Receiver<CounterCommand>, initial: i64) {
    let mut value = initial;
    let mut processed: u64 = 0;

    while let Some(command) = mailbox.recv().await {
        match command {
            CounterCommand::Apply { op, reply_to } => {
                value = value.wrapping_add(op.delta());
                processed += 1;
                // Caller may have stopped waiting; the effect stands regardless
                let _ = reply_to.send(value);
            }
            CounterCommand::Get { reply_to } => {
                let _ = reply_to.send(value);
            }
        }
    }

    tracing::debug!(final_value = value, processed, "counter owner task stopped");
}

#[async_trait]
impl SerializedCounter for ActorCounter {
    async fn increment(&self) -> Result<i64> {
        self.apply(Operation::Increment).await
    }

    async fn decrement(&self) -> Result<i64> {
        self.apply(Operation::Decrement).await
    }

    async fn get(&self) -> Result<i64> {
        self.request(|reply_to| CounterCommand::Get { reply_to })
            .await
    }

    async fn apply(&self, op: Operation) -> Result<i64> {
        self.request(|reply_to| CounterCommand::Apply { op, reply_to })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_spawn_outside_runtime_fails() {
        let err = ActorCounter::spawn(0).unwrap_err();
        assert!(err.is_launch_failure());
    }

    #[tokio::test]
    async fn test_sequential_operations() {
        let counter = ActorCounter::spawn(0).unwrap();
        assert_eq!(counter.increment().await.unwrap(), 1);
        assert_eq!(counter.increment().await.unwrap(), 2);
        assert_eq!(counter.decrement().await.unwrap(), 1);
        assert_eq!(counter.get().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_initial_value_and_tiny_mailbox() {
        let counter = ActorCounter::spawn_with(CounterConfig {
            initial: 41,
            mailbox_capacity: 0,
        })
        .unwrap();
        assert_eq!(counter.increment().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_get_is_stable_without_mutation() {
        let counter = ActorCounter::spawn(7).unwrap();
        for _ in 0..10 {
            assert_eq!(counter.get().await.unwrap(), 7);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_handles_share_one_value() {
        let counter = Arc::new(ActorCounter::spawn(0).unwrap());
        let mut tasks = Vec::new();
        for _ in 0..100 {
            let counter = Arc::clone(&counter);
            tasks.push(tokio::spawn(async move { counter.increment().await }));
        }

        let mut seen = Vec::new();
        for task in tasks {
            seen.push(task.await.unwrap().unwrap());
        }
        seen.sort_unstable();

        assert_eq!(seen, (1..=100).collect::<Vec<i64>>());
        assert_eq!(counter.get().await.unwrap(), 100);
    }

    #[test]
    fn test_closed_after_runtime_shutdown() {
        let first = tokio::runtime::Runtime::new().unwrap();
        let counter = first.block_on(async { ActorCounter::spawn(0) }).unwrap();
        drop(first);

        let second = tokio::runtime::Runtime::new().unwrap();
        let result = second.block_on(counter.increment());
        assert_eq!(result, Err(Error::CounterClosed));
        assert!(counter.is_closed());
    }
}
