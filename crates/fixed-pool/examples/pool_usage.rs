//! Process-wide pool usage example.
//!
//! Demonstrates the single-instance lifecycle, non-blocking checkout,
//! release validation, and waiting for a handle from async code.
//!
//! # Running
//!
//! ```bash
//! RUST_LOG=fixed_pool=trace cargo run --example pool_usage
//! ```

// Allow common patterns in example code
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use fixed_pool::{Connection, Pool, PoolError, get_instance, reset_instance};
use tokio::time::Instant;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("=== Fixed Pool Example ===\n");

    // Example 1: Single instance
    println!("1. Single instance:");
    let pool = get_instance(3)?;
    let same = get_instance(50)?;
    println!("  Same pool returned: {}", Arc::ptr_eq(&pool, &same));
    println!("  Capacity stays at: {}", same.total_connections());
    print_pool_status(&pool);

    // Example 2: Exhaustion
    println!("\n2. Exhaustion:");
    let held: Vec<_> = std::iter::from_fn(|| pool.get_connection()).collect();
    for handle in &held {
        println!("  Checked out {}", handle.resource());
    }
    println!("  Next checkout: {:?}", pool.get_connection().map(|h| h.id()));
    print_pool_status(&pool);

    // Example 3: Release validation
    println!("\n3. Release validation:");
    let mut held = held.into_iter();
    let first = held.next().expect("pool had capacity");
    pool.release_connection(first.clone())?;
    match pool.release_connection(first) {
        Err(err @ PoolError::InvalidRelease { .. }) => println!("  Rejected: {err}"),
        other => println!("  Unexpected: {other:?}"),
    }
    print_pool_status(&pool);

    // Example 4: Waiting for a handle
    println!("\n4. Waiting for a handle (4 tasks, 1 free handle):");
    let start = Instant::now();
    let mut tasks = vec![];
    for i in 0..4 {
        let pool = Arc::clone(&pool);
        tasks.push(tokio::spawn(async move {
            let handle = pool.acquire(Duration::from_secs(2)).await?;
            tokio::time::sleep(Duration::from_millis(50)).await;
            println!("  Task {i} used {}", handle.resource());
            pool.release_connection(handle)?;
            Ok::<_, PoolError>(())
        }));
    }
    for task in tasks {
        task.await??;
    }
    println!("  All tasks finished in {:?}", start.elapsed());

    for handle in held {
        pool.release_connection(handle)?;
    }
    print_pool_status(&pool);

    // Example 5: Reset
    println!("\n5. Reset:");
    reset_instance();
    let fresh = get_instance(5)?;
    println!("  New pool {} replaces {}", fresh.id(), pool.id());
    print_pool_status(&fresh);

    Ok(())
}

fn print_pool_status(pool: &Pool<Connection>) {
    let status = pool.status();
    println!(
        "  Status: {}/{} connections in use ({:.1}% utilization)",
        status.in_use,
        status.total,
        status.utilization()
    );
}
