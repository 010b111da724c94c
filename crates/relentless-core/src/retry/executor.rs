//! The retry control loop.

use super::builder::{RetryBuilder, Unconditioned};
use super::condition::{Outcome, RetryCondition};
use super::context::{AttemptFailure, RetryContext};
use super::observer::{AttemptEvent, AttemptOutcome, RetryObserver, trace_attempt};
use super::strategy::RetryStrategy;
use crate::error::{RetryError, RetryResult};
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

/// Failure held between the condition check and the strategy check.
enum Pending<E> {
    Error(E),
    Rejected,
}

/// Drives an operation against one strategy and one condition.
///
/// Built with [`RetryBuilder`]. The executor holds no per-call state: every
/// call creates a fresh [`RetryContext`], so one instance can be shared (for
/// example behind an `Arc`) by concurrent callers.
///
/// # Control flow
///
/// For each attempt:
///
/// 1. The operation is invoked.
/// 2. A value is shown to the condition. If accepted it is returned;
///    otherwise the attempt counts as rejected.
/// 3. An error is shown to the condition. If it is not retriable it is
///    returned immediately as [`RetryError::Operation`], without consulting
///    the strategy.
/// 4. The strategy decides whether to go again. If not, the last failure is
///    returned: the operation's error, or [`RetryError::ResultRejected`].
/// 5. The strategy's delay is awaited (cancellable), and the attempt counter
///    advances.
///
/// # Examples
///
/// ```rust
/// use relentless_core::retry::RetryBuilder;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let executor = RetryBuilder::new()
///     .fixed(3, Duration::from_millis(10))
///     .retry_on_error::<std::io::Error>()
///     .build()?;
///
/// let value = executor
///     .execute(|| async { Ok::<_, std::io::Error>(42) })
///     .await?;
/// assert_eq!(value, 42);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RetryExecutor<C> {
    strategy: Arc<dyn RetryStrategy>,
    condition: C,
    observer: Arc<dyn RetryObserver>,
}

impl RetryExecutor<Unconditioned> {
    /// Start configuring an executor.
    pub fn builder() -> RetryBuilder {
        RetryBuilder::new()
    }
}

impl<C> RetryExecutor<C> {
    pub(crate) fn new(
        strategy: Arc<dyn RetryStrategy>,
        condition: C,
        observer: Arc<dyn RetryObserver>,
    ) -> Self {
        Self {
            strategy,
            condition,
            observer,
        }
    }

    /// The stop/backoff strategy.
    pub fn strategy(&self) -> &dyn RetryStrategy {
        self.strategy.as_ref()
    }

    /// The accept/reject condition.
    pub fn condition(&self) -> &C {
        &self.condition
    }

    /// Run `operation` until it produces an accepted value or the executor
    /// gives up.
    pub async fn execute<T, E, F, Fut>(&self, operation: F) -> RetryResult<T, E>
    where
        C: RetryCondition<T, E>,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run(operation, None).await
    }

    /// Like [`execute`](Self::execute), but `token` can abort the wait between
    /// attempts with [`RetryError::Cancelled`].
    ///
    /// Cancellation is only observed between attempts; an operation that
    /// should stop mid-flight must watch the token itself.
    pub async fn execute_with_cancellation<T, E, F, Fut>(
        &self,
        operation: F,
        token: &CancellationToken,
    ) -> RetryResult<T, E>
    where
        C: RetryCondition<T, E>,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.run(operation, Some(token)).await
    }

    /// Run a side-effect operation, discarding whatever value it produces.
    ///
    /// The condition sees `()` for successful attempts, so only error-based
    /// conditions (and ones explicitly written for `()`) can trigger retries.
    pub async fn execute_action<R, E, F, Fut>(&self, mut operation: F) -> RetryResult<(), E>
    where
        C: RetryCondition<(), E>,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        self.run(move || discard_value(operation()), None).await
    }

    /// Cancellable form of [`execute_action`](Self::execute_action).
    pub async fn execute_action_with_cancellation<R, E, F, Fut>(
        &self,
        mut operation: F,
        token: &CancellationToken,
    ) -> RetryResult<(), E>
    where
        C: RetryCondition<(), E>,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        self.run(move || discard_value(operation()), Some(token)).await
    }

    /// Run a synchronous operation, blocking the current thread.
    ///
    /// Drives the same loop as [`execute`](Self::execute) on a private
    /// current-thread runtime. Waits between attempts block the thread.
    ///
    /// # Panics
    ///
    /// Panics if called from within an asynchronous runtime; use
    /// [`execute`](Self::execute) there instead.
    pub fn execute_blocking<T, E, F>(&self, mut operation: F) -> RetryResult<T, E>
    where
        C: RetryCondition<T, E>,
        E: fmt::Display,
        F: FnMut() -> Result<T, E>,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(RetryError::<E>::Runtime)?;

        runtime.block_on(self.run(move || std::future::ready(operation()), None))
    }

    /// Blocking form of [`execute_action`](Self::execute_action).
    pub fn execute_action_blocking<R, E, F>(&self, mut operation: F) -> RetryResult<(), E>
    where
        C: RetryCondition<(), E>,
        E: fmt::Display,
        F: FnMut() -> Result<R, E>,
    {
        self.execute_blocking(move || operation().map(|_| ()))
    }

    #[instrument(level = "debug", skip_all, fields(strategy = ?self.strategy))]
    async fn run<T, E, F, Fut>(
        &self,
        mut operation: F,
        cancel: Option<&CancellationToken>,
    ) -> RetryResult<T, E>
    where
        C: RetryCondition<T, E>,
        E: fmt::Display,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut context = RetryContext::new();

        loop {
            let attempt = context.attempt();

            let pending = match operation().await {
                Ok(value) => {
                    if !self.condition.should_retry(Outcome::Success(&value)) {
                        self.report(&context, AttemptOutcome::Accepted, None);
                        return Ok(value);
                    }
                    context.record_failure(AttemptFailure::ResultRejected);
                    Pending::Rejected
                }
                Err(err) => {
                    context.record_failure(AttemptFailure::Error(err.to_string()));
                    if !self.condition.should_retry(Outcome::Failure(&err)) {
                        self.report(&context, AttemptOutcome::NonRetriableError, None);
                        return Err(RetryError::Operation(err));
                    }
                    Pending::Error(err)
                }
            };

            let outcome = match pending {
                Pending::Error(_) => AttemptOutcome::RetriableError,
                Pending::Rejected => AttemptOutcome::Rejected,
            };

            if !self.strategy.should_retry(&context) {
                self.report(&context, outcome, None);
                return Err(match pending {
                    Pending::Error(err) => RetryError::Operation(err),
                    Pending::Rejected => RetryError::ResultRejected { attempts: attempt },
                });
            }

            let delay = self.strategy.delay(&context);
            self.report(&context, outcome, Some(delay));

            if !wait(delay, cancel).await {
                tracing::debug!(attempt, "Retry cancelled while waiting");
                return Err(RetryError::Cancelled { attempts: attempt });
            }

            context.advance();
        }
    }

    fn report(&self, context: &RetryContext, outcome: AttemptOutcome, delay: Option<Duration>) {
        let event = AttemptEvent {
            attempt: context.attempt(),
            outcome,
            retrying: delay.is_some(),
            delay,
            elapsed: context.elapsed(),
            failure: match outcome {
                AttemptOutcome::Accepted => None,
                _ => context.last_failure(),
            },
        };
        trace_attempt(&event);
        self.observer.on_attempt(&event);
    }
}

impl<C: fmt::Debug> fmt::Debug for RetryExecutor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("strategy", &self.strategy)
            .field("condition", &self.condition)
            .finish_non_exhaustive()
    }
}

/// Wait out `delay`. Returns `false` when `cancel` fired first.
async fn wait(delay: Duration, cancel: Option<&CancellationToken>) -> bool {
    match cancel {
        Some(token) if token.is_cancelled() => false,
        Some(token) if !delay.is_zero() => {
            tokio::select! {
                biased;
                () = token.cancelled() => false,
                () = tokio::time::sleep(delay) => true,
            }
        }
        None if !delay.is_zero() => {
            tokio::time::sleep(delay).await;
            true
        }
        _ => true,
    }
}

async fn discard_value<R, E>(fut: impl Future<Output = Result<R, E>>) -> Result<(), E> {
    fut.await.map(|_| ())
}
