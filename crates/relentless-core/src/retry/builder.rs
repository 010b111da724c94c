//! Fluent assembly of [`RetryExecutor`]s.

use super::condition::{ErrorTypeCondition, PatternCondition, ResultPredicate};
use super::executor::RetryExecutor;
use super::exponential::ExponentialBackoff;
use super::observer::{NoopObserver, RetryObserver};
use super::strategy::{FixedCount, RetryStrategy, TimeoutBound};
use crate::config::RetryConfig;
use crate::error::ConfigError;
use std::error::Error;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Placeholder condition type of a builder that has not been given one.
///
/// Uninhabited: a builder in this state always fails to build with
/// [`ConfigError::MissingCondition`].
#[derive(Debug, Clone, Copy)]
pub enum Unconditioned {}

/// Builder for [`RetryExecutor`].
///
/// Takes exactly one strategy and one condition; setting either again
/// replaces the previous choice. Nothing is validated until
/// [`build`](Self::build), which reports the first problem found.
///
/// # Examples
///
/// ```rust
/// use relentless_core::retry::RetryBuilder;
/// use std::time::Duration;
///
/// let executor = RetryBuilder::new()
///     .exponential(5, Duration::from_millis(200))
///     .retry_on_pattern("^(pending|queued)$", true)
///     .build()?;
/// # let _ = executor;
/// # Ok::<(), relentless_core::ConfigError>(())
/// ```
pub struct RetryBuilder<C = Unconditioned> {
    strategy: Option<Arc<dyn RetryStrategy>>,
    condition: Option<C>,
    observer: Option<Arc<dyn RetryObserver>>,
    error: Option<ConfigError>,
}

impl RetryBuilder<Unconditioned> {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self {
            strategy: None,
            condition: None,
            observer: None,
            error: None,
        }
    }
}

impl Default for RetryBuilder<Unconditioned> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> RetryBuilder<C> {
    /// Use `strategy` to decide when to stop and how long to wait.
    pub fn strategy<S: RetryStrategy + 'static>(mut self, strategy: S) -> Self {
        self.strategy = Some(Arc::new(strategy));
        self
    }

    /// Retry up to `max_attempts` more times, waiting `delay` in between.
    pub fn fixed(self, max_attempts: u32, delay: Duration) -> Self {
        self.strategy(FixedCount::new(max_attempts, delay))
    }

    /// Retry up to `max_attempts` more times, doubling the wait from
    /// `base_delay`.
    ///
    /// Use [`strategy`](Self::strategy) with [`ExponentialBackoff::builder`]
    /// to change the multiplier, cap, or jitter.
    pub fn exponential(self, max_attempts: u32, base_delay: Duration) -> Self {
        self.strategy(ExponentialBackoff::new(max_attempts, base_delay))
    }

    /// Retry while less than `budget` has elapsed, waiting `delay` in between.
    pub fn timeout(self, budget: Duration, delay: Duration) -> Self {
        self.strategy(TimeoutBound::new(budget, delay))
    }

    /// Use the strategy described by `config`.
    pub fn config(mut self, config: &RetryConfig) -> Self {
        match config.into_strategy() {
            Ok(strategy) => self.strategy = Some(strategy),
            Err(err) => self.fail(err),
        }
        self
    }

    /// Report every attempt to `observer`.
    pub fn observer<O: RetryObserver + 'static>(mut self, observer: O) -> Self {
        self.observer = Some(Arc::new(observer));
        self
    }

    /// Use `condition` to decide which outcomes are retried.
    pub fn condition<C2>(self, condition: C2) -> RetryBuilder<C2> {
        self.with_condition(Some(condition))
    }

    /// Retry errors of type `X`, or errors caused by one.
    pub fn retry_on_error<X: Error + 'static>(self) -> RetryBuilder<ErrorTypeCondition> {
        self.condition(ErrorTypeCondition::of::<X>())
    }

    /// Retry produced values for which `predicate` holds.
    pub fn retry_if_result<R, F>(self, predicate: F) -> RetryBuilder<ResultPredicate<R, F>>
    where
        F: Fn(&R) -> bool + Send + Sync,
    {
        self.condition(ResultPredicate::new(predicate))
    }

    /// Retry textual results by regular expression.
    ///
    /// With `should_match_to_retry` set, matching results are retried;
    /// otherwise results that do not match are. An invalid pattern is
    /// reported by [`build`](Self::build).
    pub fn retry_on_pattern(
        self,
        pattern: &str,
        should_match_to_retry: bool,
    ) -> RetryBuilder<PatternCondition> {
        match PatternCondition::new(pattern) {
            Ok(condition) => {
                self.condition(condition.should_match_to_retry(should_match_to_retry))
            }
            Err(err) => {
                let mut builder = self.with_condition(None);
                builder.fail(err);
                builder
            }
        }
    }

    /// Assemble the executor.
    ///
    /// # Errors
    ///
    /// The first deferred configuration error, then
    /// [`ConfigError::MissingStrategy`] or [`ConfigError::MissingCondition`].
    pub fn build(self) -> Result<RetryExecutor<C>, ConfigError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let strategy = self.strategy.ok_or(ConfigError::MissingStrategy)?;
        let condition = self.condition.ok_or(ConfigError::MissingCondition)?;
        let observer = self.observer.unwrap_or_else(|| Arc::new(NoopObserver));

        tracing::trace!(?strategy, "Built retry executor");
        Ok(RetryExecutor::new(strategy, condition, observer))
    }

    fn with_condition<C2>(self, condition: Option<C2>) -> RetryBuilder<C2> {
        RetryBuilder {
            strategy: self.strategy,
            condition,
            observer: self.observer,
            error: self.error,
        }
    }

    fn fail(&mut self, err: ConfigError) {
        self.error.get_or_insert(err);
    }
}

impl<C: fmt::Debug> fmt::Debug for RetryBuilder<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryBuilder")
            .field("strategy", &self.strategy)
            .field("condition", &self.condition)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}
