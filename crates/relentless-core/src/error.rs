//! Error types for retry execution and executor configuration.
//!
//! Two families:
//!
//! - [`RetryError`] is what an execution returns. It carries the operation's
//!   own error unchanged, or describes a terminal state the executor itself
//!   reached (a rejected result, a cancellation).
//! - [`ConfigError`] is what [`RetryBuilder::build`](crate::retry::RetryBuilder::build)
//!   and [`RetryConfig`](crate::config::RetryConfig) return. It is raised before
//!   any attempt is made and never mid-execution.

use thiserror::Error;

/// Result type for retry executions.
pub type RetryResult<T, E> = Result<T, RetryError<E>>;

/// Terminal failure of a retry execution.
#[derive(Debug, Error)]
pub enum RetryError<E> {
    /// The operation's own error.
    ///
    /// Returned when the condition found the error non-retriable, or when the
    /// strategy refused another attempt after this error.
    #[error(transparent)]
    Operation(E),

    /// The last attempt produced a value, but the condition rejected it and
    /// the strategy refused another attempt.
    #[error("result rejected by retry condition after {attempts} attempt(s)")]
    ResultRejected {
        /// Number of attempts made.
        attempts: u32,
    },

    /// The cancellation token fired while waiting between attempts.
    #[error("retry cancelled after {attempts} attempt(s)")]
    Cancelled {
        /// Number of attempts made before the cancellation.
        attempts: u32,
    },

    /// The blocking adapter could not start its runtime.
    #[error("failed to start blocking retry runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

impl<E> RetryError<E> {
    /// Whether the execution was cancelled.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Whether the execution ended on a rejected result.
    pub fn is_result_rejected(&self) -> bool {
        matches!(self, Self::ResultRejected { .. })
    }

    /// Borrow the operation's error, if that is what ended the execution.
    pub fn operation_error(&self) -> Option<&E> {
        match self {
            Self::Operation(err) => Some(err),
            _ => None,
        }
    }

    /// Take the operation's error, if that is what ended the execution.
    pub fn into_operation_error(self) -> Option<E> {
        match self {
            Self::Operation(err) => Some(err),
            _ => None,
        }
    }
}

/// Invalid executor configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// `build()` was called without a strategy.
    #[error("retry executor requires a strategy")]
    MissingStrategy,

    /// `build()` was called without a condition.
    #[error("retry executor requires a condition")]
    MissingCondition,

    /// The pattern given to a pattern-match condition did not compile.
    #[error("invalid retry pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// A strategy parameter is out of range.
    #[error("invalid value for `{name}`: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn invalid(name: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}
