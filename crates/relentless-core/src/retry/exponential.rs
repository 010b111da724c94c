//! Exponential backoff with optional cap and jitter.

use super::context::RetryContext;
use super::strategy::RetryStrategy;
use std::time::Duration;

/// Exponential backoff strategy.
///
/// Retries while `attempt <= max_attempts`, like [`FixedCount`](super::FixedCount),
/// but the delay grows with every attempt.
///
/// # Mathematical Formula
///
/// For attempt `n` (1-based, the attempt that just failed):
/// ```text
/// base          = base_delay * (multiplier ^ (n - 1))
/// jittered      = base + random(-jitter * base, +jitter * base)
/// final_delay   = min(jittered, max_delay)      // only when max_delay is set
/// ```
///
/// With the default jitter of `0.0`, attempt 1 waits exactly `base_delay`.
///
/// # Examples
///
/// ```rust
/// use relentless_core::retry::{ExponentialBackoff, RetryContext, RetryStrategy};
/// use std::time::Duration;
///
/// let backoff = ExponentialBackoff::builder()
///     .max_attempts(5)
///     .base_delay(Duration::from_millis(100))
///     .max_delay(Duration::from_secs(1))
///     .build();
///
/// assert_eq!(backoff.delay(&RetryContext::at_attempt(1)), Duration::from_millis(100));
/// assert_eq!(backoff.delay(&RetryContext::at_attempt(3)), Duration::from_millis(400));
/// assert_eq!(backoff.delay(&RetryContext::at_attempt(9)), Duration::from_secs(1));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ExponentialBackoff {
    max_attempts: u32,
    base_delay: Duration,
    multiplier: f64,
    max_delay: Option<Duration>,
    jitter: f64,
}

impl ExponentialBackoff {
    /// Create an uncapped, unjittered backoff doubling from `base_delay`.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self::builder()
            .max_attempts(max_attempts)
            .base_delay(base_delay)
            .build()
    }

    /// Create a new builder for configuring exponential backoff.
    pub fn builder() -> ExponentialBackoffBuilder {
        ExponentialBackoffBuilder::default()
    }

    /// Maximum number of retries after the initial attempt.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// The configured cap, if any.
    pub fn max_delay(&self) -> Option<Duration> {
        self.max_delay
    }

    /// Delay for `attempt` before jitter and cap.
    fn raw_delay(&self, attempt: u32) -> f64 {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        self.base_delay.as_nanos() as f64 * self.multiplier.powi(exponent)
    }
}

impl Default for ExponentialBackoff {
    /// Defaults:
    /// - `max_attempts`: 3
    /// - `base_delay`: 100ms
    /// - `multiplier`: 2.0
    /// - `max_delay`: none
    /// - `jitter`: 0.0
    fn default() -> Self {
        Self::builder().build()
    }
}

impl RetryStrategy for ExponentialBackoff {
    fn should_retry(&self, context: &RetryContext) -> bool {
        debug_assert!(context.attempt() >= 1, "attempt numbers start at 1");
        context.attempt() <= self.max_attempts
    }

    fn delay(&self, context: &RetryContext) -> Duration {
        let base = self.raw_delay(context.attempt());

        let jittered = if self.jitter > 0.0 {
            // base * jitter * random(-1.0, +1.0)
            base + base * self.jitter * (rand::random::<f64>() - 0.5) * 2.0
        } else {
            base
        };

        let delay = nanos_to_duration(jittered);
        match self.max_delay {
            Some(cap) if delay > cap => cap,
            _ => delay,
        }
    }
}

fn nanos_to_duration(nanos: f64) -> Duration {
    // NaN and negative values (negative multiplier) collapse to "no wait"
    if nanos.is_nan() || nanos <= 0.0 {
        Duration::ZERO
    } else if nanos >= u64::MAX as f64 {
        Duration::MAX
    } else {
        Duration::from_nanos(nanos.round() as u64)
    }
}

/// Builder for configuring [`ExponentialBackoff`].
///
/// ```rust
/// use relentless_core::retry::ExponentialBackoff;
/// use std::time::Duration;
///
/// let backoff = ExponentialBackoff::builder()
///     .max_attempts(5)
///     .base_delay(Duration::from_millis(100))
///     .max_delay(Duration::from_secs(30))
///     .multiplier(1.5)
///     .jitter(0.1)
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct ExponentialBackoffBuilder {
    max_attempts: Option<u32>,
    base_delay: Option<Duration>,
    multiplier: Option<f64>,
    max_delay: Option<Duration>,
    jitter: Option<f64>,
}

impl ExponentialBackoffBuilder {
    /// Set the maximum number of retries after the initial attempt.
    ///
    /// Default: 3
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Set the delay before the first retry.
    ///
    /// Default: 100ms
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = Some(delay);
        self
    }

    /// Set the growth factor applied per attempt.
    ///
    /// Default: 2.0 (doubles each time)
    pub fn multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = Some(multiplier);
        self
    }

    /// Cap every delay at `delay`. A zero cap means uncapped.
    ///
    /// Default: uncapped
    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = (!delay.is_zero()).then_some(delay);
        self
    }

    /// Set the jitter factor (0.0 to 1.0).
    ///
    /// A jitter of 0.1 means the delay can vary by ±10%.
    ///
    /// Default: 0.0
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = Some(jitter.clamp(0.0, 1.0));
        self
    }

    /// Build the `ExponentialBackoff` instance.
    ///
    /// Uses default values for any unset parameters.
    pub fn build(self) -> ExponentialBackoff {
        ExponentialBackoff {
            max_attempts: self.max_attempts.unwrap_or(3),
            base_delay: self.base_delay.unwrap_or(Duration::from_millis(100)),
            multiplier: self.multiplier.unwrap_or(2.0),
            max_delay: self.max_delay,
            jitter: self.jitter.unwrap_or(0.0),
        }
    }
}
