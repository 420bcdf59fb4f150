//! Guided tour of the Concord counter service
//!
//! Run with: cargo run --example counter_tour
//! Set RUST_LOG=concord=debug to see dispatch diagnostics.

use concord::{
    dispatch_blocking, ActorCounter, DispatchConfig, LockedCounter, Operation, SerializedCounter,
    TaskDispatcher,
};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("═══════════════════════════════════════");
    println!("  Concord {} - Counter Tour", concord::VERSION);
    println!("═══════════════════════════════════════\n");

    let config = DispatchConfig::from_env()?;
    let counter = Arc::new(ActorCounter::spawn(0)?);
    let dispatcher = TaskDispatcher::with_config(Arc::clone(&counter), config.clone());

    // Example 1: three concurrent increments
    println!("Example 1: Shared counter actor");
    println!("─────────────────────────────────────");
    let (a, b, c) = tokio::join!(counter.increment(), counter.increment(), counter.increment());
    println!("Increment results: [{}, {}, {}]", a?, b?, c?);
    println!("Final counter value: {}\n", counter.get().await?);

    // Example 2: five tasks, even ids increment, odd ids decrement
    println!("Example 2: Actor isolation across tasks");
    println!("─────────────────────────────────────");
    let ops: Vec<Operation> = (1..=5)
        .map(|i| {
            if i % 2 == 0 {
                Operation::Increment
            } else {
                Operation::Decrement
            }
        })
        .collect();
    let batch = dispatcher.dispatch_all(&ops).await?;
    for record in batch.records() {
        println!(
            "Task {} {}ed counter to {}",
            record.id + 1,
            record.operation,
            record.result
        );
    }
    println!(
        "Final counter value after all tasks: {}\n",
        counter.get().await?
    );

    // Example 3: records streamed as tasks finish
    println!("Example 3: Streaming completions");
    println!("─────────────────────────────────────");
    let mut stream = dispatcher.dispatch_stream(&[Operation::Increment; 5])?;
    while let Some(record) = stream.next().await {
        let record = record?;
        println!("Completed task {} -> {}", record.id, record.result);
    }
    println!("Counter now: {}\n", counter.get().await?);

    // Example 4: thread-pool dispatch over a locked counter
    println!("Example 4: Thread-pool dispatch");
    println!("─────────────────────────────────────");
    let locked = LockedCounter::new(0);
    let ops = vec![Operation::Increment; 1000];
    let batch = tokio::task::block_in_place(|| dispatch_blocking(&locked, &ops, &config))?;
    println!("{}", serde_json::to_string_pretty(batch.stats())?);
    println!("Locked counter: {}\n", locked.get_blocking());

    println!("✅ All counter examples completed!");
    Ok(())
}
