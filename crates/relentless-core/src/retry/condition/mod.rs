//! Accept/reject conditions.
//!
//! A condition looks at the outcome of a single attempt and answers "should
//! this trigger a retry?". It is asked in exactly one of two shapes per
//! attempt, modelled by [`Outcome`]:
//!
//! - [`Outcome::Success`]: the operation produced a value. `true` means the
//!   value is unacceptable and the operation should be retried anyway.
//! - [`Outcome::Failure`]: the operation returned an error. `true` means the
//!   error is retriable; `false` ends the execution with that error.
//!
//! [`RetryCondition`] is generic over the result and error types, and each
//! condition only implements it for the shapes it can interpret. Pairing a
//! condition with an operation it cannot judge is a compile error rather
//! than a silent "no opinion" at runtime.

mod error_type;
mod pattern;
mod predicate;

pub use error_type::{ErrorPredicate, ErrorTypeCondition};
pub use pattern::{AsText, PatternCondition};
pub use predicate::ResultPredicate;

use std::fmt;
use std::sync::Arc;

/// The outcome of one attempt, as seen by a condition.
pub enum Outcome<'a, T, E> {
    /// The operation returned a value.
    Success(&'a T),
    /// The operation returned an error.
    Failure(&'a E),
}

impl<T, E> Clone for Outcome<'_, T, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, E> Copy for Outcome<'_, T, E> {}

impl<T: fmt::Debug, E: fmt::Debug> fmt::Debug for Outcome<'_, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success(value) => f.debug_tuple("Success").field(value).finish(),
            Self::Failure(error) => f.debug_tuple("Failure").field(error).finish(),
        }
    }
}

/// Decides whether the outcome of an attempt should trigger a retry.
///
/// Implementations must be side-effect free and must return `false` for a
/// shape they have nothing to say about.
///
/// # Examples
///
/// ```rust
/// use relentless_core::retry::{Outcome, RetryCondition};
///
/// /// Retry empty pages and any error.
/// struct RetryEmpty;
///
/// impl<E> RetryCondition<Vec<u8>, E> for RetryEmpty {
///     fn should_retry(&self, outcome: Outcome<'_, Vec<u8>, E>) -> bool {
///         match outcome {
///             Outcome::Success(page) => page.is_empty(),
///             Outcome::Failure(_) => true,
///         }
///     }
/// }
///
/// assert!(RetryEmpty.should_retry(Outcome::<Vec<u8>, ()>::Success(&Vec::new())));
/// ```
pub trait RetryCondition<T, E>: Send + Sync {
    /// Whether the given outcome should trigger another attempt.
    fn should_retry(&self, outcome: Outcome<'_, T, E>) -> bool;
}

impl<T, E, C: RetryCondition<T, E> + ?Sized> RetryCondition<T, E> for Arc<C> {
    fn should_retry(&self, outcome: Outcome<'_, T, E>) -> bool {
        (**self).should_retry(outcome)
    }
}

impl<T, E, C: RetryCondition<T, E> + ?Sized> RetryCondition<T, E> for Box<C> {
    fn should_retry(&self, outcome: Outcome<'_, T, E>) -> bool {
        (**self).should_retry(outcome)
    }
}

/// Retries when either of two conditions asks for it.
///
/// Built with [`RetryConditionExt::or`].
#[derive(Debug, Clone)]
pub struct Or<A, B> {
    left: A,
    right: B,
}

impl<A, B> Or<A, B> {
    /// Combine two conditions.
    pub fn new(left: A, right: B) -> Self {
        Self { left, right }
    }
}

impl<T, E, A, B> RetryCondition<T, E> for Or<A, B>
where
    A: RetryCondition<T, E>,
    B: RetryCondition<T, E>,
{
    fn should_retry(&self, outcome: Outcome<'_, T, E>) -> bool {
        self.left.should_retry(outcome) || self.right.should_retry(outcome)
    }
}

/// Combinators for the built-in conditions.
pub trait RetryConditionExt: Sized {
    /// Retry when either `self` or `other` asks for it.
    ///
    /// ```rust
    /// use relentless_core::retry::{ErrorTypeCondition, ResultPredicate, RetryConditionExt};
    ///
    /// let condition = ErrorTypeCondition::of::<std::io::Error>()
    ///     .or(ResultPredicate::new(|body: &String| body.is_empty()));
    /// ```
    fn or<C>(self, other: C) -> Or<Self, C> {
        Or::new(self, other)
    }
}

impl RetryConditionExt for ErrorTypeCondition {}
impl RetryConditionExt for PatternCondition {}
impl<E, F> RetryConditionExt for ErrorPredicate<E, F> {}
impl<R, F> RetryConditionExt for ResultPredicate<R, F> {}
impl<A, B> RetryConditionExt for Or<A, B> {}
