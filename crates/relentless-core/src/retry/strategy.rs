//! Stop/backoff strategies.

use super::context::RetryContext;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

/// A policy deciding whether another attempt is allowed and how long to wait
/// before it.
///
/// Strategies are consulted by the executor after a failed or rejected
/// attempt, never after an accepted one. They must be pure functions of the
/// [`RetryContext`] (no internal counters) so that a single instance can be
/// shared by concurrent executions.
///
/// # Examples
///
/// ```rust
/// use relentless_core::retry::{FixedCount, RetryContext, RetryStrategy};
/// use std::time::Duration;
///
/// let strategy = FixedCount::new(2, Duration::from_millis(50));
///
/// assert!(strategy.should_retry(&RetryContext::at_attempt(2)));
/// assert!(!strategy.should_retry(&RetryContext::at_attempt(3)));
/// assert_eq!(strategy.delay(&RetryContext::new()), Duration::from_millis(50));
/// ```
pub trait RetryStrategy: Debug + Send + Sync {
    /// Whether another attempt may be made after the attempt described by
    /// `context` failed or was rejected.
    fn should_retry(&self, context: &RetryContext) -> bool;

    /// How long to wait before the next attempt.
    ///
    /// A zero duration means "retry immediately".
    fn delay(&self, context: &RetryContext) -> Duration;
}

impl<S: RetryStrategy + ?Sized> RetryStrategy for Arc<S> {
    fn should_retry(&self, context: &RetryContext) -> bool {
        (**self).should_retry(context)
    }

    fn delay(&self, context: &RetryContext) -> Duration {
        (**self).delay(context)
    }
}

impl<S: RetryStrategy + ?Sized> RetryStrategy for Box<S> {
    fn should_retry(&self, context: &RetryContext) -> bool {
        (**self).should_retry(context)
    }

    fn delay(&self, context: &RetryContext) -> Duration {
        (**self).delay(context)
    }
}

/// Retry up to `max_attempts` more times with a constant delay.
///
/// `should_retry` holds while `attempt <= max_attempts`, so an operation that
/// always fails is invoked `max_attempts + 1` times in total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedCount {
    max_attempts: u32,
    delay: Duration,
}

impl FixedCount {
    /// Create a fixed-count strategy.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            delay,
        }
    }

    /// Maximum number of retries after the initial attempt.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl RetryStrategy for FixedCount {
    fn should_retry(&self, context: &RetryContext) -> bool {
        debug_assert!(context.attempt() >= 1, "attempt numbers start at 1");
        context.attempt() <= self.max_attempts
    }

    fn delay(&self, _context: &RetryContext) -> Duration {
        self.delay
    }
}

/// Retry for as long as the execution is younger than `budget`.
///
/// The attempt count is unbounded; only elapsed wall-clock time gates
/// retries. The budget is checked before each wait, so the final wait may
/// carry the execution past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutBound {
    budget: Duration,
    delay: Duration,
}

impl TimeoutBound {
    /// Create a time-bounded strategy.
    pub fn new(budget: Duration, delay: Duration) -> Self {
        Self { budget, delay }
    }

    /// Total time allowed for retries.
    pub fn budget(&self) -> Duration {
        self.budget
    }
}

impl RetryStrategy for TimeoutBound {
    fn should_retry(&self, context: &RetryContext) -> bool {
        debug_assert!(context.attempt() >= 1, "attempt numbers start at 1");
        context.elapsed() < self.budget
    }

    fn delay(&self, _context: &RetryContext) -> Duration {
        self.delay
    }
}
