//! Ten outer threads each spawn an inner thread that sleeps for a
//! staggered delay, then everything is driven to completion.
//!
//! Run with `RUST_LOG=debug cargo run --example nested_spawn` to see the
//! scheduler's decisions.

use strand::Scheduler;
use strand::scheduler::Handle;

use std::time::{Duration, Instant};

use tracing::info;
use tracing_subscriber::EnvFilter;

async fn inner(handle: Handle<u64, u64>, i: u64) -> anyhow::Result<u64> {
    let (elapsed, i) = handle.wait(Duration::from_millis(i * 50), i).await?;
    info!(thread = i, ?elapsed, "inner thread woke up");

    Ok(i)
}

#[strand::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let scheduler = Scheduler::<u64, u64>::new();
    let handle = scheduler.handle();

    for i in 0..10 {
        let handle = handle.clone();

        scheduler.spawn(
            move |i| {
                let handle = handle.clone();
                async move {
                    let inner_handle = handle.clone();
                    let child = handle.spawn(move |i| inner(inner_handle.clone(), i), i)?;
                    info!(thread = i, %child, "outer thread spawned inner thread");
                    handle.suspend(i).await?;
                    anyhow::Ok(i + 100)
                }
            },
            i,
        );
    }

    let start = Instant::now();
    let results = scheduler.drive().await?;

    info!(elapsed = ?start.elapsed(), ?results, "all threads finished");
    anyhow::Ok(())
}
