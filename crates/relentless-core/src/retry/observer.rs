//! Per-attempt diagnostics.
//!
//! The executor reports every attempt twice: as a `tracing` event (free when
//! no subscriber is installed) and to an optional [`RetryObserver`]. Neither
//! influences control flow.

use super::context::AttemptFailure;
use std::fmt;
use std::time::Duration;

/// How a single attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The operation produced a value and the condition accepted it.
    Accepted,
    /// The operation produced a value and the condition rejected it.
    Rejected,
    /// The operation failed and the condition considered the error retriable.
    RetriableError,
    /// The operation failed and the condition did not consider the error
    /// retriable.
    NonRetriableError,
}

impl AttemptOutcome {
    /// Stable lowercase name, used as the `outcome` field in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::RetriableError => "retriable_error",
            Self::NonRetriableError => "non_retriable_error",
        }
    }
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Diagnostic record for one attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptEvent<'a> {
    /// 1-based attempt number.
    pub attempt: u32,
    /// How the attempt ended.
    pub outcome: AttemptOutcome,
    /// Whether another attempt follows.
    pub retrying: bool,
    /// The wait before the next attempt, when one follows.
    pub delay: Option<Duration>,
    /// Time since the execution started.
    pub elapsed: Duration,
    /// The failure recorded for this attempt, when it did not succeed.
    pub failure: Option<&'a AttemptFailure>,
}

/// A structured sink for [`AttemptEvent`]s.
///
/// Observers are called synchronously from the retry loop, so they should be
/// cheap, and must not panic. Any `Fn(&AttemptEvent)` closure is an observer.
///
/// ```rust
/// use relentless_core::retry::{AttemptEvent, RetryObserver};
/// use std::sync::atomic::{AtomicU32, Ordering};
///
/// let seen = AtomicU32::new(0);
/// let observer = |_: &AttemptEvent<'_>| {
///     seen.fetch_add(1, Ordering::Relaxed);
/// };
/// # let _ = &observer;
/// ```
pub trait RetryObserver: Send + Sync {
    /// Called once per attempt, after the executor decided what happens next.
    fn on_attempt(&self, event: &AttemptEvent<'_>);
}

impl<F> RetryObserver for F
where
    F: Fn(&AttemptEvent<'_>) + Send + Sync,
{
    fn on_attempt(&self, event: &AttemptEvent<'_>) {
        self(event)
    }
}

/// Observer that discards every event. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RetryObserver for NoopObserver {
    fn on_attempt(&self, _event: &AttemptEvent<'_>) {}
}

/// Emit the `tracing` record for an attempt.
pub(crate) fn trace_attempt(event: &AttemptEvent<'_>) {
    let delay_ms = event.delay.map(|d| d.as_millis() as u64);
    let failure = event.failure.map(tracing::field::display);

    match event.outcome {
        AttemptOutcome::Accepted => tracing::debug!(
            attempt = event.attempt,
            outcome = event.outcome.as_str(),
            elapsed_ms = event.elapsed.as_millis() as u64,
            "Attempt accepted"
        ),
        _ if event.retrying => tracing::warn!(
            attempt = event.attempt,
            outcome = event.outcome.as_str(),
            retrying = true,
            delay_ms,
            failure,
            "Attempt failed, retrying"
        ),
        AttemptOutcome::NonRetriableError => tracing::debug!(
            attempt = event.attempt,
            outcome = event.outcome.as_str(),
            retrying = false,
            failure,
            "Attempt failed with non-retriable error"
        ),
        _ => tracing::warn!(
            attempt = event.attempt,
            outcome = event.outcome.as_str(),
            retrying = false,
            elapsed_ms = event.elapsed.as_millis() as u64,
            failure,
            "Retries exhausted"
        ),
    }
}
