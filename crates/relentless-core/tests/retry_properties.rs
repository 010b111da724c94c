//! End-to-end retry behavior
//!
//! Drives full executions through the public API:
//! - Attempt counts for each strategy
//! - Delay schedules observed by a recording observer
//! - Error-, result- and pattern-based conditions
//! - Builder validation and cancellation

use relentless_core::prelude::*;
use relentless_core::retry::{AttemptEvent, AttemptOutcome};
use rstest::rstest;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

#[derive(Debug, thiserror::Error)]
#[error("invalid operation: {0}")]
struct InvalidOperation(u32);

#[derive(Debug, thiserror::Error)]
#[error("argument out of range")]
struct OutOfRange;

/// Observer collecting the delay announced before each retry.
fn delay_recorder() -> (
    Arc<Mutex<Vec<Duration>>>,
    impl Fn(&AttemptEvent<'_>) + Send + Sync + 'static,
) {
    let delays = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&delays);
    let observer = move |event: &AttemptEvent<'_>| {
        if let Some(delay) = event.delay {
            sink.lock().unwrap().push(delay);
        }
    };
    (delays, observer)
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(4)]
#[tokio::test]
async fn test_fixed_count_makes_n_plus_one_attempts(#[case] max_attempts: u32) {
    let executor = RetryBuilder::new()
        .fixed(max_attempts, Duration::ZERO)
        .retry_on_error::<InvalidOperation>()
        .build()
        .unwrap();
    let attempts = AtomicU32::new(0);

    let result = executor
        .execute(|| {
            let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Err::<(), _>(InvalidOperation(n)) }
        })
        .await;

    assert_eq!(attempts.load(Ordering::SeqCst), max_attempts + 1);
    let err = assert_err!(result);
    assert_eq!(err.operation_error().map(|e| e.0), Some(max_attempts + 1));
}

#[tokio::test(start_paused = true)]
async fn test_exponential_delays_grow_geometrically() {
    let (delays, observer) = delay_recorder();
    let executor = RetryBuilder::new()
        .strategy(
            ExponentialBackoff::builder()
                .max_attempts(5)
                .base_delay(Duration::from_millis(100))
                .multiplier(3.0)
                .build(),
        )
        .retry_on_error::<InvalidOperation>()
        .observer(observer)
        .build()
        .unwrap();
    let start = tokio::time::Instant::now();

    let result = executor
        .execute(|| async { Err::<(), _>(InvalidOperation(0)) })
        .await;

    assert_err!(result);
    let expected: Vec<Duration> = [100, 300, 900, 2700, 8100]
        .into_iter()
        .map(Duration::from_millis)
        .collect();
    assert_eq!(*delays.lock().unwrap(), expected);
    assert_eq!(start.elapsed(), expected.iter().sum::<Duration>());
}

#[tokio::test(start_paused = true)]
async fn test_exponential_cap_bounds_every_delay() {
    let (delays, observer) = delay_recorder();
    let executor = RetryBuilder::new()
        .strategy(
            ExponentialBackoff::builder()
                .max_attempts(8)
                .base_delay(Duration::from_millis(50))
                .max_delay(Duration::from_millis(500))
                .jitter(0.5)
                .build(),
        )
        .retry_on_error::<InvalidOperation>()
        .observer(observer)
        .build()
        .unwrap();

    let _ = executor
        .execute(|| async { Err::<(), _>(InvalidOperation(0)) })
        .await;

    let delays = delays.lock().unwrap();
    assert_eq!(delays.len(), 8);
    assert!(delays.iter().all(|d| *d <= Duration::from_millis(500)));
}

#[tokio::test]
async fn test_non_retriable_error_makes_one_attempt() {
    let executor = RetryBuilder::new()
        .fixed(10, Duration::from_secs(1))
        .retry_on_error::<InvalidOperation>()
        .build()
        .unwrap();
    let attempts = AtomicU32::new(0);

    let result = executor
        .execute(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(OutOfRange) }
        })
        .await;

    assert!(matches!(result, Err(RetryError::Operation(OutOfRange))));
    assert_eq!(attempts.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_retry_while_result_below_threshold() {
    let executor = RetryBuilder::new()
        .fixed(10, Duration::ZERO)
        .retry_if_result(|n: &u32| *n < 3)
        .build()
        .unwrap();
    let counter = AtomicU32::new(0);

    let result = executor
        .execute(|| {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok::<_, OutOfRange>(n) }
        })
        .await;

    assert_eq!(assert_ok!(result), 3);
    assert_eq!(counter.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_pattern_retries_error_text_until_success() {
    let executor = RetryBuilder::new()
        .fixed(5, Duration::ZERO)
        .retry_on_pattern("error|exception", true)
        .build()
        .unwrap();
    let responses = Mutex::new(vec![
        "Success",
        "upstream exception",
        "Request failed: error 503",
    ]);
    let attempts = AtomicU32::new(0);

    let result = executor
        .execute(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            let body = responses.lock().unwrap().pop().unwrap_or("Success");
            async move { Ok::<_, OutOfRange>(body.to_string()) }
        })
        .await;

    assert_eq!(assert_ok!(result), "Success");
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_pattern_without_flag_marks_success() {
    let executor = RetryBuilder::new()
        .fixed(5, Duration::ZERO)
        .retry_on_pattern("error|exception", false)
        .build()
        .unwrap();
    let attempts = AtomicU32::new(0);

    // Without the flag the pattern marks good results, so a miss is retried.
    let result = executor
        .execute(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Ok::<_, OutOfRange>("Success") }
        })
        .await;

    assert!(matches!(
        result,
        Err(RetryError::ResultRejected { attempts: 6 })
    ));
    assert_eq!(attempts.load(Ordering::SeqCst), 6);

    let result = executor
        .execute(|| async { Ok::<_, OutOfRange>("error: but expected") })
        .await;
    assert_ok!(result);
}

#[test]
fn test_incomplete_builder_is_a_config_error() {
    let missing_strategy = RetryBuilder::new()
        .retry_on_error::<InvalidOperation>()
        .build();
    let missing_condition = RetryBuilder::new().fixed(3, Duration::ZERO).build();

    assert!(matches!(missing_strategy, Err(ConfigError::MissingStrategy)));
    assert!(matches!(
        missing_condition,
        Err(ConfigError::MissingCondition)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_invalid_operation_recovers_on_fourth_attempt() {
    let outcomes = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&outcomes);
    let executor = RetryBuilder::new()
        .fixed(3, Duration::from_millis(100))
        .retry_on_error::<InvalidOperation>()
        .observer(move |event: &AttemptEvent<'_>| {
            sink.lock().unwrap().push(event.outcome);
        })
        .build()
        .unwrap();
    let attempts = AtomicU32::new(0);
    let start = tokio::time::Instant::now();

    let result = executor
        .execute(|| {
            let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n <= 3 {
                    Err(InvalidOperation(n))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

    assert_eq!(assert_ok!(result), 42);
    assert_eq!(attempts.load(Ordering::SeqCst), 4);
    assert_eq!(start.elapsed(), Duration::from_millis(300));
    assert_eq!(
        *outcomes.lock().unwrap(),
        vec![
            AttemptOutcome::RetriableError,
            AttemptOutcome::RetriableError,
            AttemptOutcome::RetriableError,
            AttemptOutcome::Accepted,
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_timeout_bound_stops_after_budget() {
    let executor = RetryBuilder::new()
        .timeout(Duration::from_secs(1), Duration::from_millis(300))
        .retry_on_error::<InvalidOperation>()
        .build()
        .unwrap();
    let attempts = AtomicU32::new(0);

    let result = executor
        .execute(|| {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(InvalidOperation(0)) }
        })
        .await;

    // Budget checks at 0, 300, 600 and 900ms pass; the one at 1200ms fails.
    assert_err!(result);
    assert_eq!(attempts.load(Ordering::SeqCst), 5);
}

#[tokio::test(start_paused = true)]
async fn test_cancellation_is_distinct_from_exhaustion() {
    let executor = RetryBuilder::new()
        .fixed(100, Duration::from_secs(10))
        .retry_on_error::<InvalidOperation>()
        .build()
        .unwrap();
    let token = CancellationToken::new();
    let attempts = AtomicU32::new(0);

    let child = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(25)).await;
        child.cancel();
    });

    let result = executor
        .execute_with_cancellation(
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(InvalidOperation(0)) }
            },
            &token,
        )
        .await;

    assert!(matches!(result, Err(RetryError::Cancelled { attempts: 3 })));
    assert_eq!(attempts.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_executor_is_shared_across_tasks() {
    let executor = Arc::new(
        RetryBuilder::new()
            .fixed(2, Duration::from_millis(1))
            .retry_if_result(|n: &u32| *n % 2 == 1)
            .build()
            .unwrap(),
    );

    let handles: Vec<_> = (0..4u32)
        .map(|task| {
            let executor = Arc::clone(&executor);
            tokio::spawn(async move {
                let calls = Arc::new(AtomicU32::new(0));
                let result = executor
                    .execute(|| {
                        let calls = Arc::clone(&calls);
                        async move {
                            let call = calls.fetch_add(1, Ordering::SeqCst);
                            Ok::<_, OutOfRange>(task + call)
                        }
                    })
                    .await;
                (result.ok(), calls.load(Ordering::SeqCst))
            })
        })
        .collect();

    for (task, handle) in handles.into_iter().enumerate() {
        let (value, calls) = handle.await.unwrap();
        let expected_calls = if task % 2 == 0 { 1 } else { 2 };
        assert_eq!(calls, expected_calls, "task {task}");
        assert_eq!(value.map(|v| v % 2), Some(0));
    }
}

#[tokio::test]
async fn test_action_retries_on_error_only() {
    let executor = RetryBuilder::new()
        .fixed(3, Duration::ZERO)
        .retry_on_error::<InvalidOperation>()
        .build()
        .unwrap();
    let writes = AtomicU32::new(0);

    let result = executor
        .execute_action(|| {
            let n = writes.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 2 {
                    Err(InvalidOperation(n))
                } else {
                    Ok(n as usize)
                }
            }
        })
        .await;

    assert_ok!(result);
    assert_eq!(writes.load(Ordering::SeqCst), 2);
}

#[test]
fn test_blocking_execution_from_config() {
    let config: RetryConfig = toml::from_str(
        r#"
        kind = "fixed"
        max_attempts = 4
        delay_ms = 1
        "#,
    )
    .unwrap();
    let executor = RetryBuilder::new()
        .config(&config)
        .retry_on_error::<InvalidOperation>()
        .build()
        .unwrap();
    let mut attempts = 0;

    let result = executor.execute_blocking(|| {
        attempts += 1;
        if attempts < 4 {
            Err(InvalidOperation(attempts))
        } else {
            Ok("done")
        }
    });

    assert_eq!(assert_ok!(result), "done");
    assert_eq!(attempts, 4);
}
