//! Example: Retrying operations with strategies and conditions
//!
//! This example demonstrates:
//! 1. Retrying a flaky call on a specific error type
//! 2. Polling until a result looks finished
//! 3. Cancelling a retry loop from another task
//! 4. Loading the strategy from the environment
//!
//! Run with:
//! ```bash
//! RUST_LOG=relentless_core=debug cargo run -p relentless-core --example retry_example
//! ```

use relentless_core::prelude::*;
use relentless_core::retry::{AttemptEvent, RetryObserver};
use std::error::Error;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, thiserror::Error)]
#[error("connection reset on attempt {0}")]
struct ConnectionReset(u32);

/// A simulated API that fails the first few times
struct UnreliableApi {
    attempts: AtomicU32,
    fail_count: u32,
}

impl UnreliableApi {
    fn new(fail_count: u32) -> Self {
        Self {
            attempts: AtomicU32::new(0),
            fail_count,
        }
    }

    async fn call(&self) -> Result<String, ConnectionReset> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        if attempt <= self.fail_count {
            println!("  Attempt {attempt}: FAILED (simulating transient error)");
            Err(ConnectionReset(attempt))
        } else {
            println!("  Attempt {attempt}: SUCCESS");
            Ok("API response data".to_string())
        }
    }

    fn total_attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }
}

/// Prints the schedule as the executor reports it.
struct PrintingObserver;

impl RetryObserver for PrintingObserver {
    fn on_attempt(&self, event: &AttemptEvent<'_>) {
        match event.delay {
            Some(delay) => println!(
                "    -> {} after {:?}, waiting {delay:?}",
                event.outcome, event.elapsed
            ),
            None => println!("    -> {} after {:?}", event.outcome, event.elapsed),
        }
    }
}

/// Example 1: Retry a flaky call on one error type
async fn example_error_type() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 1: Exponential Backoff on ConnectionReset ===\n");

    let executor = RetryBuilder::new()
        .exponential(3, Duration::from_millis(100))
        .retry_on_error::<ConnectionReset>()
        .observer(PrintingObserver)
        .build()?;

    let api = UnreliableApi::new(2);
    let start = Instant::now();

    let result = executor.execute(|| api.call()).await?;

    println!("\nResult: {result}");
    println!("Total attempts: {}", api.total_attempts());
    println!("Total time: {:?}", start.elapsed());
    println!("Expected delays: 100ms + 200ms = ~300ms");

    Ok(())
}

/// Example 2: Poll until the job reports completion
async fn example_polling() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 2: Polling With a Pattern Condition ===\n");

    let executor = RetryBuilder::new()
        .fixed(10, Duration::from_millis(20))
        .retry_on_pattern("^(queued|running)$", true)
        .build()?;

    let polls = AtomicU32::new(0);
    let status = executor
        .execute(|| {
            let poll = polls.fetch_add(1, Ordering::SeqCst);
            let status = match poll {
                0 => "queued",
                1 | 2 => "running",
                _ => "succeeded",
            };
            println!("  Poll {}: {status}", poll + 1);
            async move { Ok::<_, std::io::Error>(status) }
        })
        .await?;

    println!("\nFinal status: {status}");
    Ok(())
}

/// Example 3: Cancel a retry loop that would otherwise run for minutes
async fn example_cancellation() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 3: Cancellation ===\n");

    let executor = RetryBuilder::new()
        .fixed(100, Duration::from_secs(1))
        .retry_on_error::<ConnectionReset>()
        .build()?;

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(2500)).await;
        println!("  Cancelling...");
        canceller.cancel();
    });

    let api = UnreliableApi::new(u32::MAX);
    match executor
        .execute_with_cancellation(|| api.call(), &token)
        .await
    {
        Err(err) if err.is_cancelled() => println!("\n{err}"),
        other => println!("\nUnexpected outcome: {other:?}"),
    }

    Ok(())
}

/// Example 4: Strategy from RELENTLESS_* environment variables
async fn example_from_env() -> Result<(), Box<dyn Error>> {
    println!("\n=== Example 4: Strategy From the Environment ===\n");

    let config = RetryConfig::from_env()?;
    println!("Loaded: {config:?}");

    let executor = RetryBuilder::new()
        .config(&config)
        .retry_on_error::<ConnectionReset>()
        .build()?;

    let api = UnreliableApi::new(1);
    let result = executor.execute(|| api.call()).await?;
    println!("\nResult: {result} after {} attempt(s)", api.total_attempts());

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    example_error_type().await?;
    example_polling().await?;
    example_cancellation().await?;
    example_from_env().await?;

    println!("\n=== All examples completed ===");
    Ok(())
}
