//! Per-execution retry state.

use std::fmt;
use std::time::Duration;
use tokio::time::Instant;

/// Description of why an attempt did not end the execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    /// The operation returned an error, rendered with `Display`.
    Error(String),
    /// The operation returned a value the condition rejected.
    ResultRejected,
}

impl fmt::Display for AttemptFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(msg) => f.write_str(msg),
            Self::ResultRejected => f.write_str("result rejected by retry condition"),
        }
    }
}

/// Mutable state for a single execution.
///
/// A fresh context is created for every call into the executor and dropped
/// when that call returns, so one executor can serve concurrent callers.
/// Strategies read it to decide whether to continue and how long to wait.
///
/// `attempt` is 1-based: during the first invocation of the operation it is
/// `1`, and it is only advanced after a strategy permitted another round.
#[derive(Debug, Clone)]
pub struct RetryContext {
    attempt: u32,
    start_time: Instant,
    last_failure: Option<AttemptFailure>,
}

impl RetryContext {
    /// Create a context positioned on the first attempt.
    pub fn new() -> Self {
        Self::at_attempt(1)
    }

    /// Create a context positioned on the given attempt.
    ///
    /// Mainly useful to exercise strategies outside the executor.
    pub fn at_attempt(attempt: u32) -> Self {
        Self {
            attempt,
            start_time: Instant::now(),
            last_failure: None,
        }
    }

    /// Current attempt number (1-based).
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// When the execution started.
    pub fn start_time(&self) -> Instant {
        self.start_time
    }

    /// Time since the execution started, recomputed on every call.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// The failure recorded for the most recent unsuccessful attempt.
    pub fn last_failure(&self) -> Option<&AttemptFailure> {
        self.last_failure.as_ref()
    }

    pub(crate) fn record_failure(&mut self, failure: AttemptFailure) {
        self.last_failure = Some(failure);
    }

    pub(crate) fn advance(&mut self) {
        self.attempt = self.attempt.saturating_add(1);
    }
}

impl Default for RetryContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_context_starts_on_first_attempt() {
        let context = RetryContext::new();

        assert_eq!(context.attempt(), 1);
        assert!(context.last_failure().is_none());
    }

    #[test]
    fn test_advance_and_record() {
        let mut context = RetryContext::new();
        context.record_failure(AttemptFailure::Error("boom".into()));
        context.advance();

        assert_eq!(context.attempt(), 2);
        assert_eq!(
            context.last_failure(),
            Some(&AttemptFailure::Error("boom".into()))
        );

        context.record_failure(AttemptFailure::ResultRejected);
        assert_eq!(
            context.last_failure().map(ToString::to_string),
            Some("result rejected by retry condition".to_string())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_elapsed_tracks_clock() {
        let context = RetryContext::new();
        tokio::time::advance(Duration::from_millis(250)).await;

        assert_eq!(context.elapsed(), Duration::from_millis(250));
    }
}
